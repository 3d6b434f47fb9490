use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::types::NormalizedConfig;
use super::StepOutput;

/// Android プロジェクトにフレーバー別の設定を作成する。
///
/// build.gradle(.kts) への productFlavors ブロック挿入、strings.xml の
/// アプリ名リソース、AndroidManifest.xml のラベル参照を設定する。
pub(super) fn create_android_configs(ncfg: &NormalizedConfig) -> Result<StepOutput> {
    let app_dir = ncfg.output_dir.join("android").join("app");
    if !app_dir.is_dir() {
        anyhow::bail!(
            "android/app ディレクトリが見つかりません: {}",
            app_dir.display()
        );
    }

    let mut files = Vec::new();

    // 1. build.gradle / build.gradle.kts に productFlavors を挿入
    let (gradle_path, is_kts) = locate_gradle(&app_dir)?;
    let content = fs::read_to_string(&gradle_path)
        .with_context(|| format!("Gradle ファイルの読み込みに失敗: {}", gradle_path.display()))?;
    let updated = insert_product_flavors(&content, ncfg, is_kts)?;
    if updated != content {
        fs::write(&gradle_path, updated).with_context(|| {
            format!("Gradle ファイルの書き込みに失敗: {}", gradle_path.display())
        })?;
        files.push(gradle_path);
    }

    // 2. メインの strings.xml (ベースのアプリ名)
    let main_strings = app_dir.join("src/main/res/values/strings.xml");
    let existing = fs::read_to_string(&main_strings).ok();
    fs::create_dir_all(main_strings.parent().unwrap())?;
    fs::write(
        &main_strings,
        upsert_app_name(existing.as_deref(), &ncfg.app_name),
    )
    .with_context(|| format!("strings.xml の書き込みに失敗: {}", main_strings.display()))?;
    files.push(main_strings);

    // 3. フレーバー別 strings.xml (ソースセットで main を上書きする)
    for flavor in &ncfg.firebase.flavors {
        let path = app_dir
            .join("src")
            .join(&flavor.name)
            .join("res/values/strings.xml");
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, upsert_app_name(None, &ncfg.flavored_app_name(flavor)))
            .with_context(|| format!("strings.xml の書き込みに失敗: {}", path.display()))?;
        files.push(path);
    }

    // 4. AndroidManifest.xml のラベルをリソース参照に差し替え
    let manifest_path = app_dir.join("src/main/AndroidManifest.xml");
    if let Ok(manifest) = fs::read_to_string(&manifest_path) {
        let (updated, changed) = set_manifest_label(&manifest);
        if changed {
            fs::write(&manifest_path, updated).with_context(|| {
                format!(
                    "AndroidManifest.xml の書き込みに失敗: {}",
                    manifest_path.display()
                )
            })?;
            files.push(manifest_path);
        }
    }

    let notes =
        vec!["リリースビルド用の署名設定 (key.properties) を作成してください。".to_string()];

    Ok(StepOutput { files, notes })
}

/// app モジュールの Gradle ファイルを探す。
fn locate_gradle(app_dir: &std::path::Path) -> Result<(PathBuf, bool)> {
    let kts = app_dir.join("build.gradle.kts");
    if kts.is_file() {
        return Ok((kts, true));
    }
    let groovy = app_dir.join("build.gradle");
    if groovy.is_file() {
        return Ok((groovy, false));
    }
    anyhow::bail!(
        "build.gradle(.kts) が見つかりません: {}",
        app_dir.display()
    );
}

/// `android { ... }` ブロックの末尾に productFlavors を挿入する。
///
/// 波括弧の深さを数えてブロック終端を特定する。既に productFlavors が
/// ある場合は何もしない (冪等)。
fn insert_product_flavors(src: &str, ncfg: &NormalizedConfig, kts: bool) -> Result<String> {
    if src.contains("productFlavors") {
        return Ok(src.to_string());
    }

    let lines: Vec<&str> = src.lines().collect();
    let android_open = lines
        .iter()
        .position(|l| {
            let trimmed = l.trim();
            trimmed == "android {" || trimmed.starts_with("android {")
        })
        .context("android ブロックが見つかりません")?;

    // android ブロックの閉じ波括弧を深さ計算で探す
    let mut depth = 0i32;
    let mut close_idx = None;
    for (idx, line) in lines.iter().enumerate().skip(android_open) {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close_idx = Some(idx);
                    }
                }
                _ => {}
            }
        }
        if close_idx.is_some() {
            break;
        }
    }
    let close_idx = close_idx.context("android ブロックが閉じていません")?;

    let mut out: Vec<String> = lines.iter().map(ToString::to_string).collect();
    out.insert(close_idx, flavors_block(ncfg, kts));
    let mut joined = out.join("\n");
    if src.ends_with('\n') {
        joined.push('\n');
    }
    Ok(joined)
}

/// productFlavors ブロックを生成する。
fn flavors_block(ncfg: &NormalizedConfig, kts: bool) -> String {
    let mut block = String::new();
    if kts {
        block.push_str("\n    flavorDimensions += listOf(\"app\")\n\n");
        block.push_str("    productFlavors {\n");
        for flavor in &ncfg.firebase.flavors {
            block.push_str(&format!("        create(\"{}\") {{\n", flavor.name));
            block.push_str("            dimension = \"app\"\n");
            if let Some(suffix) = &flavor.suffix {
                block.push_str(&format!(
                    "            applicationIdSuffix = \"{suffix}\"\n"
                ));
            }
            block.push_str("        }\n");
        }
        block.push_str("    }\n");
    } else {
        block.push_str("\n    flavorDimensions \"app\"\n\n");
        block.push_str("    productFlavors {\n");
        for flavor in &ncfg.firebase.flavors {
            block.push_str(&format!("        {} {{\n", flavor.name));
            block.push_str("            dimension \"app\"\n");
            if let Some(suffix) = &flavor.suffix {
                block.push_str(&format!(
                    "            applicationIdSuffix \"{suffix}\"\n"
                ));
            }
            block.push_str("        }\n");
        }
        block.push_str("    }\n");
    }
    block
}

/// strings.xml に `app_name` リソースを挿入または置換する。
fn upsert_app_name(existing: Option<&str>, app_name: &str) -> String {
    let escaped = xml_escape(app_name);
    let entry = format!("    <string name=\"app_name\">{escaped}</string>");

    let Some(content) = existing else {
        return format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n{entry}\n</resources>\n"
        );
    };

    if let Some(start) = content.find("<string name=\"app_name\">") {
        // 既存エントリの中身を置換する
        let value_start = start + "<string name=\"app_name\">".len();
        if let Some(end_offset) = content[value_start..].find("</string>") {
            let mut out = String::with_capacity(content.len());
            out.push_str(&content[..value_start]);
            out.push_str(&escaped);
            out.push_str(&content[value_start + end_offset..]);
            return out;
        }
    }

    if let Some(pos) = content.find("</resources>") {
        let mut out = String::with_capacity(content.len() + entry.len());
        out.push_str(&content[..pos]);
        out.push_str(&entry);
        out.push('\n');
        out.push_str(&content[pos..]);
        return out;
    }

    // resources 要素が無い壊れたファイルは作り直す
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n{entry}\n</resources>\n"
    )
}

/// AndroidManifest.xml の `android:label` をリソース参照に差し替える。
///
/// 返り値は (更新後の内容, 変更有無)。
fn set_manifest_label(content: &str) -> (String, bool) {
    const ATTR: &str = "android:label=\"";
    let Some(start) = content.find(ATTR) else {
        return (content.to_string(), false);
    };
    let value_start = start + ATTR.len();
    let Some(end_offset) = content[value_start..].find('"') else {
        return (content.to_string(), false);
    };

    let current = &content[value_start..value_start + end_offset];
    if current == "@string/app_name" {
        return (content.to_string(), false);
    }

    let mut out = String::with_capacity(content.len());
    out.push_str(&content[..value_start]);
    out.push_str("@string/app_name");
    out.push_str(&content[value_start + end_offset..]);
    (out, true)
}

/// XML テキスト用の最小エスケープ。
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::setup::types::{Flavor, FirebaseOptions, SetupConfig};
    use crate::config::CliConfig;
    use tempfile::TempDir;

    const GRADLE_KTS: &str = "\
plugins {
    id(\"com.android.application\")
}

android {
    namespace = \"com.example.my_shop\"
    compileSdk = flutter.compileSdkVersion

    defaultConfig {
        applicationId = \"com.example.my_shop\"
        minSdk = flutter.minSdkVersion
    }

    buildTypes {
        release {
            signingConfig = signingConfigs.getByName(\"debug\")
        }
    }
}

flutter {
    source = \"../..\"
}
";

    const GRADLE_GROOVY: &str = "\
apply plugin: 'com.android.application'

android {
    namespace \"com.example.my_shop\"

    defaultConfig {
        applicationId \"com.example.my_shop\"
    }
}

flutter {
    source '../..'
}
";

    const MANIFEST: &str = "\
<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">
    <application
        android:label=\"my_shop\"
        android:name=\"${applicationName}\"
        android:icon=\"@mipmap/ic_launcher\">
    </application>
</manifest>
";

    fn normalized_with_flavors(output_dir: Option<PathBuf>) -> NormalizedConfig {
        SetupConfig {
            app_name: "My Shop".to_string(),
            output_dir,
            firebase: FirebaseOptions {
                enabled: true,
                default_project: Some("p".to_string()),
                flavors: vec![Flavor::new("staging"), Flavor::new("production")],
                features: vec![],
            },
            ..SetupConfig::default()
        }
        .normalized(&CliConfig::default())
        .unwrap()
    }

    // =========================================================================
    // insert_product_flavors のテスト
    // =========================================================================

    #[test]
    fn test_insert_product_flavors_kts() {
        let ncfg = normalized_with_flavors(None);
        let updated = insert_product_flavors(GRADLE_KTS, &ncfg, true).unwrap();

        assert!(updated.contains("flavorDimensions += listOf(\"app\")"));
        assert!(updated.contains("create(\"staging\") {"));
        assert!(updated.contains("applicationIdSuffix = \".staging\""));
        assert!(updated.contains("create(\"production\") {"));
        // production には接尾辞を付けない
        let production_block = updated.split("create(\"production\")").nth(1).unwrap();
        let production_block = &production_block[..production_block.find('}').unwrap()];
        assert!(!production_block.contains("applicationIdSuffix"));
        // flutter ブロックは android ブロックの外に残る
        assert!(updated.contains("flutter {"));
    }

    #[test]
    fn test_insert_product_flavors_groovy() {
        let ncfg = normalized_with_flavors(None);
        let updated = insert_product_flavors(GRADLE_GROOVY, &ncfg, false).unwrap();

        assert!(updated.contains("flavorDimensions \"app\""));
        assert!(updated.contains("        staging {"));
        assert!(updated.contains("applicationIdSuffix \".staging\""));
    }

    #[test]
    fn test_insert_product_flavors_inside_android_block() {
        let ncfg = normalized_with_flavors(None);
        let updated = insert_product_flavors(GRADLE_KTS, &ncfg, true).unwrap();

        // productFlavors は android ブロックの閉じ括弧より前にある
        let flavors_pos = updated.find("productFlavors").unwrap();
        let flutter_pos = updated.find("flutter {").unwrap();
        assert!(flavors_pos < flutter_pos);
    }

    #[test]
    fn test_insert_product_flavors_idempotent() {
        let ncfg = normalized_with_flavors(None);
        let once = insert_product_flavors(GRADLE_KTS, &ncfg, true).unwrap();
        let twice = insert_product_flavors(&once, &ncfg, true).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_insert_product_flavors_missing_android_block() {
        let ncfg = normalized_with_flavors(None);
        let result = insert_product_flavors("plugins { }\n", &ncfg, true);
        assert!(result.is_err());
    }

    // =========================================================================
    // strings.xml のテスト
    // =========================================================================

    #[test]
    fn test_upsert_app_name_creates_file() {
        let content = upsert_app_name(None, "My Shop");
        assert!(content.contains("<string name=\"app_name\">My Shop</string>"));
        assert!(content.starts_with("<?xml"));
    }

    #[test]
    fn test_upsert_app_name_replaces_existing() {
        let existing = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n    <string name=\"app_name\">Old</string>\n    <string name=\"other\">x</string>\n</resources>\n";
        let content = upsert_app_name(Some(existing), "New Name");
        assert!(content.contains("<string name=\"app_name\">New Name</string>"));
        assert!(!content.contains(">Old<"));
        assert!(content.contains("<string name=\"other\">x</string>"));
    }

    #[test]
    fn test_upsert_app_name_inserts_into_existing_resources() {
        let existing = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>\n    <string name=\"other\">x</string>\n</resources>\n";
        let content = upsert_app_name(Some(existing), "My Shop");
        assert!(content.contains("<string name=\"app_name\">My Shop</string>"));
        assert!(content.contains("<string name=\"other\">x</string>"));
    }

    #[test]
    fn test_upsert_app_name_escapes_xml() {
        let content = upsert_app_name(None, "Shop & Co <1>");
        assert!(content.contains("Shop &amp; Co &lt;1&gt;"));
    }

    // =========================================================================
    // AndroidManifest.xml のテスト
    // =========================================================================

    #[test]
    fn test_set_manifest_label_replaces_literal() {
        let (updated, changed) = set_manifest_label(MANIFEST);
        assert!(changed);
        assert!(updated.contains("android:label=\"@string/app_name\""));
        assert!(!updated.contains("android:label=\"my_shop\""));
        // 他の属性は保持される
        assert!(updated.contains("android:icon=\"@mipmap/ic_launcher\""));
    }

    #[test]
    fn test_set_manifest_label_already_reference() {
        let manifest = MANIFEST.replace("my_shop", "@string/app_name");
        let (updated, changed) = set_manifest_label(&manifest);
        assert!(!changed);
        assert_eq!(updated, manifest);
    }

    #[test]
    fn test_set_manifest_label_missing_attribute() {
        let (updated, changed) = set_manifest_label("<manifest></manifest>");
        assert!(!changed);
        assert_eq!(updated, "<manifest></manifest>");
    }

    // =========================================================================
    // create_android_configs の統合テスト
    // =========================================================================

    #[test]
    fn test_create_android_configs_writes_all_artifacts() {
        let tmp = TempDir::new().unwrap();
        let output_dir = tmp.path().join("my_shop");
        let app_dir = output_dir.join("android/app");
        std::fs::create_dir_all(app_dir.join("src/main/res/values")).unwrap();
        std::fs::write(app_dir.join("build.gradle.kts"), GRADLE_KTS).unwrap();
        std::fs::write(app_dir.join("src/main/AndroidManifest.xml"), MANIFEST).unwrap();

        let ncfg = normalized_with_flavors(Some(output_dir.clone()));
        let output = create_android_configs(&ncfg).unwrap();

        // gradle + main strings + flavor strings x2 + manifest
        assert_eq!(output.files.len(), 5);

        let gradle =
            std::fs::read_to_string(app_dir.join("build.gradle.kts")).unwrap();
        assert!(gradle.contains("productFlavors"));

        let main_strings =
            std::fs::read_to_string(app_dir.join("src/main/res/values/strings.xml"))
                .unwrap();
        assert!(main_strings.contains(">My Shop<"));

        let staging_strings =
            std::fs::read_to_string(app_dir.join("src/staging/res/values/strings.xml"))
                .unwrap();
        assert!(staging_strings.contains(">My Shop (staging)<"));

        let manifest =
            std::fs::read_to_string(app_dir.join("src/main/AndroidManifest.xml")).unwrap();
        assert!(manifest.contains("@string/app_name"));
    }

    #[test]
    fn test_create_android_configs_missing_app_dir() {
        let tmp = TempDir::new().unwrap();
        let ncfg = normalized_with_flavors(Some(tmp.path().join("nope")));
        assert!(create_android_configs(&ncfg).is_err());
    }
}

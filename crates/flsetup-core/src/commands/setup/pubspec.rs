use std::fs;

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};

use super::types::NormalizedConfig;
use super::StepOutput;

/// pubspec.yaml を構造化編集する。
///
/// YAML をパースして説明文と依存関係を差し込み、書き戻す。
/// 正規表現による行置換ではなくマッピング操作で行うため、
/// インデントやキー順の揺れに影響されない。
pub(super) fn update_pubspec(ncfg: &NormalizedConfig) -> Result<StepOutput> {
    let path = ncfg.output_dir.join("pubspec.yaml");
    let content = fs::read_to_string(&path)
        .with_context(|| format!("pubspec.yaml の読み込みに失敗: {}", path.display()))?;

    let updated = apply_updates(&content, ncfg)?;
    fs::write(&path, updated)
        .with_context(|| format!("pubspec.yaml の書き込みに失敗: {}", path.display()))?;

    Ok(StepOutput {
        files: vec![path],
        notes: Vec::new(),
    })
}

/// pubspec.yaml の内容に更新を適用する。
fn apply_updates(content: &str, ncfg: &NormalizedConfig) -> Result<String> {
    let mut doc: Value =
        serde_yaml::from_str(content).context("pubspec.yaml のパースに失敗しました")?;
    let root = doc
        .as_mapping_mut()
        .context("pubspec.yaml のルートがマッピングではありません")?;

    root.insert(
        Value::from("description"),
        Value::from(ncfg.description.as_str()),
    );

    // dependencies
    let deps = mapping_entry(root, "dependencies")?;
    for (name, spec) in dependencies_for(ncfg) {
        deps.insert(Value::from(name), spec);
    }

    // dev_dependencies
    let dev_deps = dev_dependencies_for(ncfg);
    if !dev_deps.is_empty() {
        let dev = mapping_entry(root, "dev_dependencies")?;
        for (name, spec) in dev_deps {
            dev.insert(Value::from(name), spec);
        }
    }

    // l10n フィーチャは flutter.generate を要求する
    if ncfg.features.iter().any(|f| f == "l10n") {
        let flutter = mapping_entry(root, "flutter")?;
        flutter.insert(Value::from("generate"), Value::from(true));
    }

    serde_yaml::to_string(&doc).context("pubspec.yaml のシリアライズに失敗しました")
}

/// ルート直下のマッピングエントリを取得する (無ければ作成)。
fn mapping_entry<'a>(root: &'a mut Mapping, key: &str) -> Result<&'a mut Mapping> {
    let entry = root
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    entry
        .as_mapping_mut()
        .with_context(|| format!("pubspec.yaml の {key} がマッピングではありません"))
}

/// 設定から dependencies に追加するエントリを導出する。
fn dependencies_for(ncfg: &NormalizedConfig) -> Vec<(String, Value)> {
    let mut deps = Vec::new();

    if ncfg.firebase.enabled {
        deps.push(("firebase_core".to_string(), Value::from("^3.6.0")));
        for feature in &ncfg.firebase.features {
            let (name, version) = feature.pubspec_dependency();
            deps.push((name.to_string(), Value::from(version)));
        }
    }

    for feature in &ncfg.features {
        deps.extend(feature_dependencies(feature));
    }

    deps
}

/// フィーチャ ID ごとの追加依存パッケージ。
fn feature_dependencies(feature: &str) -> Vec<(String, Value)> {
    match feature {
        "routing" => vec![("go_router".to_string(), Value::from("^14.3.0"))],
        "theming" => vec![("google_fonts".to_string(), Value::from("^6.2.1"))],
        "settings" => vec![("shared_preferences".to_string(), Value::from("^2.3.2"))],
        "l10n" => {
            // flutter_localizations は SDK 依存として表現する
            let mut sdk = Mapping::new();
            sdk.insert(Value::from("sdk"), Value::from("flutter"));
            vec![
                ("flutter_localizations".to_string(), Value::Mapping(sdk)),
                ("intl".to_string(), Value::from("^0.19.0")),
            ]
        }
        _ => Vec::new(),
    }
}

/// 設定から dev_dependencies に追加するエントリを導出する。
fn dev_dependencies_for(ncfg: &NormalizedConfig) -> Vec<(String, Value)> {
    if ncfg.icons.enabled {
        vec![(
            "flutter_launcher_icons".to_string(),
            Value::from("^0.14.1"),
        )]
    } else {
        Vec::new()
    }
}

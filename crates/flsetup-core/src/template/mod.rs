pub mod context;
pub mod filters;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as AnyhowContext, Result};
use tera::Tera;
use walkdir::WalkDir;

use context::TemplateContext;

/// テンプレートエンジン。
///
/// Tera エンジンをラップし、テンプレートルートから .tera ファイルを読み込み、
/// `TemplateContext` を適用してレンダリングする。
pub struct TemplateEngine {
    tera: Tera,
    template_dir: PathBuf,
}

/// テンプレートファイルが条件に合致するかを判定するための情報。
struct TemplateFileInfo {
    /// フィーチャディレクトリからの相対パス (例: "lib/features/auth/auth_service.dart.tera")
    relative_path: PathBuf,
    /// Tera に登録するテンプレート名
    template_name: String,
}

impl TemplateEngine {
    /// テンプレートエンジンを初期化する。
    ///
    /// # Arguments
    /// * `template_dir` - テンプレートルート (例: "templates")
    pub fn new(template_dir: &Path) -> Result<Self> {
        let mut tera = Tera::default();
        filters::register_filters(&mut tera);

        Ok(Self {
            tera,
            template_dir: template_dir.to_path_buf(),
        })
    }

    /// テンプレートルート配下の利用可能なフィーチャ ID 一覧を走査する。
    pub fn scan_features(template_dir: &Path) -> Vec<String> {
        let features_dir = template_dir.join("features");
        let mut features = Vec::new();
        if let Ok(entries) = fs::read_dir(&features_dir) {
            for entry in entries.flatten() {
                if entry.path().is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        features.push(name.to_string());
                    }
                }
            }
        }
        features.sort();
        features
    }

    /// フィーチャテンプレートをレンダリングし、出力先に書き込む。
    ///
    /// 処理の流れ:
    /// 1. features/{id}/ 配下の .tera ファイルを収集
    /// 2. 条件付きファイル (Firebase 固有・フレーバー固有) をフィルタ
    /// 3. ファイル名のプレースホルダ ({name}) を置換
    /// 4. 各テンプレートをレンダリングして出力先に書き込み
    ///
    /// # Returns
    /// 生成されたファイルのパス一覧
    pub fn render_feature(
        &mut self,
        feature: &str,
        ctx: &TemplateContext,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let feature_dir = self.template_dir.join("features").join(feature);
        if !feature_dir.exists() {
            anyhow::bail!(
                "フィーチャテンプレートが見つかりません: {}",
                feature_dir.display()
            );
        }

        let tera_ctx = ctx.to_tera_context();
        let template_files = Self::collect_template_files(&feature_dir, ctx)?;

        let mut generated_files = Vec::new();

        for file_info in &template_files {
            let full_template_path = feature_dir.join(&file_info.relative_path);

            let template_content = fs::read_to_string(&full_template_path).with_context(|| {
                format!(
                    "テンプレートファイルの読み込みに失敗: {}",
                    full_template_path.display()
                )
            })?;

            // フィーチャ間の名前衝突を避けるためフィーチャ ID を前置して登録
            let registered_name = format!("{}/{}", feature, file_info.template_name);
            self.tera
                .add_raw_template(&registered_name, &template_content)
                .with_context(|| format!("テンプレートの登録に失敗: {registered_name}"))?;

            let rendered = self
                .tera
                .render(&registered_name, &tera_ctx)
                .with_context(|| format!("テンプレートのレンダリングに失敗: {registered_name}"))?;

            let output_relative =
                Self::resolve_output_path(&file_info.relative_path, &ctx.project_name);
            let output_path = output_dir.join(&output_relative);

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("出力ディレクトリの作成に失敗: {}", parent.display())
                })?;
            }

            fs::write(&output_path, rendered)
                .with_context(|| format!("ファイルの書き込みに失敗: {}", output_path.display()))?;

            generated_files.push(output_path);
        }

        Ok(generated_files)
    }

    /// フィーチャディレクトリから条件に合致するファイルを収集する。
    fn collect_template_files(
        feature_dir: &Path,
        ctx: &TemplateContext,
    ) -> Result<Vec<TemplateFileInfo>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(feature_dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            // .tera 拡張子のファイルのみ対象
            let extension = path.extension().and_then(|e| e.to_str());
            if extension != Some("tera") {
                continue;
            }

            let relative = path
                .strip_prefix(feature_dir)
                .with_context(|| "相対パスの計算に失敗")?
                .to_path_buf();

            if !Self::should_include_file(&relative, ctx) {
                continue;
            }

            let template_name = relative.to_string_lossy().replace('\\', "/");

            files.push(TemplateFileInfo {
                relative_path: relative,
                template_name,
            });
        }

        // walkdir の順序は環境依存のため出力順を安定させる
        files.sort_by(|a, b| a.template_name.cmp(&b.template_name));

        Ok(files)
    }

    /// ファイルが条件に合致するかを判定する。
    ///
    /// Firebase 固有ファイルとフレーバー固有ファイルをコンテキストの設定に
    /// 基づいてフィルタリングする。
    fn should_include_file(relative_path: &Path, ctx: &TemplateContext) -> bool {
        let path_str = relative_path.to_string_lossy().replace('\\', "/");

        // Firebase 固有ファイル
        if path_str.contains("firebase") {
            return ctx.has_firebase;
        }

        // フレーバー固有ファイル
        if path_str.contains("flavor") {
            return !ctx.flavors.is_empty();
        }

        true
    }

    /// 出力ファイルパスを計算する。
    ///
    /// - .tera 拡張子を除去
    /// - {name} プレースホルダを `project_name` で置換
    fn resolve_output_path(template_relative: &Path, project_name: &str) -> PathBuf {
        let path_str = template_relative.to_string_lossy().replace('\\', "/");

        let without_tera = path_str
            .strip_suffix(".tera")
            .unwrap_or(path_str.as_str());

        PathBuf::from(without_tera.replace("{name}", project_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::context::TemplateContextBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn write_template(root: &Path, feature: &str, rel: &str, content: &str) {
        let path = root.join("features").join(feature).join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    // =========================================================================
    // resolve_output_path のテスト
    // =========================================================================

    #[test]
    fn test_resolve_output_path_removes_tera_extension() {
        let result = TemplateEngine::resolve_output_path(
            Path::new("lib/theme/app_theme.dart.tera"),
            "my_app",
        );
        assert_eq!(result, PathBuf::from("lib/theme/app_theme.dart"));
    }

    #[test]
    fn test_resolve_output_path_replaces_name_placeholder() {
        let result =
            TemplateEngine::resolve_output_path(Path::new("lib/{name}_app.dart.tera"), "shop");
        assert_eq!(result, PathBuf::from("lib/shop_app.dart"));
    }

    #[test]
    fn test_resolve_output_path_without_tera_suffix() {
        let result = TemplateEngine::resolve_output_path(Path::new("l10n.yaml"), "shop");
        assert_eq!(result, PathBuf::from("l10n.yaml"));
    }

    // =========================================================================
    // should_include_file のテスト
    // =========================================================================

    #[test]
    fn test_should_include_firebase_file_when_enabled() {
        let ctx = TemplateContextBuilder::new("App", "app", "com.example")
            .with_firebase(vec![])
            .build();
        assert!(TemplateEngine::should_include_file(
            Path::new("lib/services/firebase_bootstrap.dart.tera"),
            &ctx,
        ));
    }

    #[test]
    fn test_should_exclude_firebase_file_when_disabled() {
        let ctx = TemplateContextBuilder::new("App", "app", "com.example").build();
        assert!(!TemplateEngine::should_include_file(
            Path::new("lib/services/firebase_bootstrap.dart.tera"),
            &ctx,
        ));
    }

    #[test]
    fn test_should_exclude_flavor_file_without_flavors() {
        let ctx = TemplateContextBuilder::new("App", "app", "com.example").build();
        assert!(!TemplateEngine::should_include_file(
            Path::new("lib/flavor_banner.dart.tera"),
            &ctx,
        ));
    }

    #[test]
    fn test_should_include_flavor_file_with_flavors() {
        let ctx = TemplateContextBuilder::new("App", "app", "com.example")
            .flavors(vec!["staging".to_string()])
            .build();
        assert!(TemplateEngine::should_include_file(
            Path::new("lib/flavor_banner.dart.tera"),
            &ctx,
        ));
    }

    #[test]
    fn test_should_include_common_files_always() {
        let ctx = TemplateContextBuilder::new("App", "app", "com.example").build();
        assert!(TemplateEngine::should_include_file(
            Path::new("lib/theme/app_theme.dart.tera"),
            &ctx,
        ));
    }

    // =========================================================================
    // scan_features のテスト
    // =========================================================================

    #[test]
    fn test_scan_features_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(TemplateEngine::scan_features(tmp.path()).is_empty());
    }

    #[test]
    fn test_scan_features_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("features/theming")).unwrap();
        fs::create_dir_all(tmp.path().join("features/auth")).unwrap();
        fs::create_dir_all(tmp.path().join("features/l10n")).unwrap();
        // ファイルはフィーチャとして数えない
        fs::write(tmp.path().join("features/README.md"), "x").unwrap();

        let features = TemplateEngine::scan_features(tmp.path());
        assert_eq!(features, vec!["auth", "l10n", "theming"]);
    }

    // =========================================================================
    // render_feature の統合テスト
    // =========================================================================

    #[test]
    fn test_render_feature_basic() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");

        write_template(
            &template_root,
            "auth",
            "lib/features/auth/auth_service.dart.tera",
            "// {{ class_prefix }}AuthService for {{ app_name }}\nclass {{ class_prefix }}AuthService {}\n",
        );
        write_template(
            &template_root,
            "auth",
            "lib/features/auth/firebase_auth_gateway.dart.tera",
            "// firebase gateway\n",
        );

        let output_dir = tmp.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();

        let ctx = TemplateContextBuilder::new("My Shop", "my_shop", "com.example").build();

        let mut engine = TemplateEngine::new(&template_root).unwrap();
        let generated = engine.render_feature("auth", &ctx, &output_dir).unwrap();

        // Firebase 無効のため firebase_auth_gateway は除外される
        assert_eq!(generated.len(), 1);
        let content =
            fs::read_to_string(output_dir.join("lib/features/auth/auth_service.dart")).unwrap();
        assert!(content.contains("MyShopAuthService for My Shop"));
        assert!(content.contains("class MyShopAuthService {}"));
    }

    #[test]
    fn test_render_feature_with_firebase() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");

        write_template(
            &template_root,
            "auth",
            "lib/features/auth/auth_service.dart.tera",
            "class AuthService {}\n",
        );
        write_template(
            &template_root,
            "auth",
            "lib/features/auth/firebase_auth_gateway.dart.tera",
            "// gateway for {{ bundle_id }}\n",
        );

        let output_dir = tmp.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();

        let ctx = TemplateContextBuilder::new("My Shop", "my_shop", "com.example")
            .with_firebase(vec!["auth".to_string()])
            .build();

        let mut engine = TemplateEngine::new(&template_root).unwrap();
        let generated = engine.render_feature("auth", &ctx, &output_dir).unwrap();

        assert_eq!(generated.len(), 2);
        let gateway = fs::read_to_string(
            output_dir.join("lib/features/auth/firebase_auth_gateway.dart"),
        )
        .unwrap();
        assert!(gateway.contains("com.example.my-shop"));
    }

    #[test]
    fn test_render_feature_name_placeholder() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");

        write_template(
            &template_root,
            "routing",
            "lib/{name}_router.dart.tera",
            "// router for {{ project_name }}\n",
        );

        let output_dir = tmp.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();

        let ctx = TemplateContextBuilder::new("Shop", "shop", "com.example").build();

        let mut engine = TemplateEngine::new(&template_root).unwrap();
        let generated = engine.render_feature("routing", &ctx, &output_dir).unwrap();

        assert_eq!(generated, vec![output_dir.join("lib/shop_router.dart")]);
    }

    #[test]
    fn test_render_unknown_feature_returns_error() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");
        fs::create_dir_all(template_root.join("features")).unwrap();

        let output_dir = tmp.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();

        let ctx = TemplateContextBuilder::new("App", "app", "com.example").build();

        let mut engine = TemplateEngine::new(&template_root).unwrap();
        let result = engine.render_feature("nonexistent", &ctx, &output_dir);

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(
            err_msg.contains("フィーチャテンプレートが見つかりません"),
            "unexpected error: {err_msg}"
        );
    }

    #[test]
    fn test_render_feature_uses_custom_filters() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");

        write_template(
            &template_root,
            "settings",
            "lib/settings_screen.dart.tera",
            "class {{ project_name | pascal_case }}SettingsScreen {}\n",
        );

        let output_dir = tmp.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();

        let ctx = TemplateContextBuilder::new("App", "order_app", "com.example").build();

        let mut engine = TemplateEngine::new(&template_root).unwrap();
        engine.render_feature("settings", &ctx, &output_dir).unwrap();

        let content = fs::read_to_string(output_dir.join("lib/settings_screen.dart")).unwrap();
        assert!(content.contains("class OrderAppSettingsScreen {}"));
    }
}

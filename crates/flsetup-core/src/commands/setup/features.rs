use anyhow::Result;

use super::types::NormalizedConfig;
use super::StepOutput;
use crate::config::CliConfig;
use crate::template::context::{TemplateContext, TemplateContextBuilder};
use crate::template::TemplateEngine;

/// 選択されたフィーチャテンプレートを出力先にレンダリングする。
pub(super) fn apply_features(ncfg: &NormalizedConfig, cli: &CliConfig) -> Result<StepOutput> {
    let template_root = cli.template_root();
    let ctx = build_template_context(ncfg);
    let mut engine = TemplateEngine::new(&template_root)?;

    let mut files = Vec::new();
    for feature in &ncfg.features {
        files.extend(engine.render_feature(feature, &ctx, &ncfg.output_dir)?);
    }

    Ok(StepOutput {
        files,
        notes: Vec::new(),
    })
}

/// 正規化済み設定からテンプレートコンテキストを構築する。
pub(super) fn build_template_context(ncfg: &NormalizedConfig) -> TemplateContext {
    let mut builder = TemplateContextBuilder::new(&ncfg.app_name, &ncfg.project_name, &ncfg.org)
        .description(&ncfg.description)
        .bundle_id(&ncfg.bundle_id)
        .android_package(&ncfg.android_package)
        .flavors(
            ncfg.firebase
                .flavors
                .iter()
                .map(|f| f.name.clone())
                .collect(),
        )
        .platforms(
            ncfg.platforms
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        );

    if ncfg.firebase.enabled {
        builder = builder.with_firebase(
            ncfg.firebase
                .features
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
        );
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::setup::types::{
        Flavor, FirebaseFeature, FirebaseOptions, SetupConfig,
    };
    use std::fs;
    use tempfile::TempDir;

    fn normalized(config: SetupConfig) -> NormalizedConfig {
        config.normalized(&CliConfig::default()).unwrap()
    }

    #[test]
    fn test_build_template_context_maps_config() {
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            firebase: FirebaseOptions {
                enabled: true,
                default_project: Some("my-shop-prod".to_string()),
                flavors: vec![Flavor::new("staging"), Flavor::new("production")],
                features: vec![FirebaseFeature::Auth],
            },
            ..SetupConfig::default()
        });

        let ctx = build_template_context(&ncfg);
        assert_eq!(ctx.app_name, "My Shop");
        assert_eq!(ctx.project_name, "my_shop");
        assert_eq!(ctx.bundle_id, "com.example.my-shop");
        assert!(ctx.has_firebase);
        assert_eq!(ctx.firebase_features, vec!["auth"]);
        assert_eq!(ctx.flavors, vec!["staging", "production"]);
        assert_eq!(ctx.platforms, vec!["android", "ios"]);
    }

    #[test]
    fn test_build_template_context_without_firebase() {
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            ..SetupConfig::default()
        });
        let ctx = build_template_context(&ncfg);
        assert!(!ctx.has_firebase);
        assert!(ctx.flavors.is_empty());
    }

    #[test]
    fn test_apply_features_renders_into_output_dir() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");
        let feature_dir = template_root.join("features/theming/lib/theme");
        fs::create_dir_all(&feature_dir).unwrap();
        fs::write(
            feature_dir.join("app_theme.dart.tera"),
            "// theme for {{ app_name }}\n",
        )
        .unwrap();

        let output_dir = tmp.path().join("my_shop");
        fs::create_dir_all(&output_dir).unwrap();

        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            output_dir: Some(output_dir.clone()),
            features: vec!["theming".to_string()],
            ..SetupConfig::default()
        });
        let cli = CliConfig {
            template_dir: Some(template_root),
            ..CliConfig::default()
        };

        let output = apply_features(&ncfg, &cli).unwrap();
        assert_eq!(output.files.len(), 1);
        let content =
            fs::read_to_string(output_dir.join("lib/theme/app_theme.dart")).unwrap();
        assert!(content.contains("My Shop"));
    }

    #[test]
    fn test_apply_features_unknown_feature_fails() {
        let tmp = TempDir::new().unwrap();
        let template_root = tmp.path().join("templates");
        fs::create_dir_all(template_root.join("features")).unwrap();

        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            output_dir: Some(tmp.path().join("out")),
            features: vec!["nonexistent".to_string()],
            ..SetupConfig::default()
        });
        let cli = CliConfig {
            template_dir: Some(template_root),
            ..CliConfig::default()
        };

        assert!(apply_features(&ncfg, &cli).is_err());
    }
}

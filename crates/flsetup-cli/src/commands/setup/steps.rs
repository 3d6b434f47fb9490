use anyhow::Result;
use std::path::PathBuf;

use flsetup_core::commands::firebase::list_projects;
use flsetup_core::commands::setup::types::{
    derive_project_name, Flavor, FirebaseOptions, IconOptions, SetupConfig,
    ALL_FIREBASE_FEATURES,
};
use flsetup_core::{validate_app_name, validate_org, validate_project_name, CliConfig};
use flsetup_core::TemplateEngine;

use crate::prompt;

// ============================================================================
// 各ステップ
// ============================================================================

pub(super) enum StepResult<T> {
    Value(T),
    Skip,
    Back,
}

/// ステップ1: アプリ表示名
pub(super) fn step_app_name() -> Result<Option<String>> {
    match prompt::input_prompt("アプリ名を入力してください", validate_app_name) {
        Ok(name) => Ok(Some(name)),
        Err(_) => Ok(None),
    }
}

/// ステップ2: プロジェクト名 (アプリ名から導出した値がデフォルト)
pub(super) fn step_project_name(app_name: &str) -> Result<Option<String>> {
    let default = derive_project_name(app_name);
    match prompt::input_prompt_with_default(
        "プロジェクト名を入力してください",
        &default,
        validate_project_name,
    ) {
        Ok(name) => Ok(Some(name)),
        Err(_) => Ok(None),
    }
}

/// ステップ3: 組織識別子
pub(super) fn step_org(config: &CliConfig) -> Result<Option<String>> {
    match prompt::input_prompt_with_default(
        "組織識別子を入力してください (逆ドメイン形式)",
        &config.default_org,
        validate_org,
    ) {
        Ok(org) => Ok(Some(org)),
        Err(_) => Ok(None),
    }
}

/// ステップ4: 出力先ディレクトリ
pub(super) fn step_output_dir(project_name: &str) -> Result<Option<PathBuf>> {
    match prompt::input_prompt_with_default(
        "出力先ディレクトリを入力してください",
        project_name,
        validate_not_empty,
    ) {
        Ok(dir) => Ok(Some(PathBuf::from(dir))),
        Err(_) => Ok(None),
    }
}

/// ステップ5: フィーチャテンプレート選択
///
/// テンプレートルートにフィーチャが無い場合はスキップ (`StepResult::Skip`)。
/// Esc が押された場合は `StepResult::Back` を返す。
pub(super) fn step_features(config: &CliConfig) -> Result<StepResult<Vec<String>>> {
    let available = TemplateEngine::scan_features(&config.template_root());
    if available.is_empty() {
        return Ok(StepResult::Skip);
    }

    let items: Vec<&str> = available.iter().map(String::as_str).collect();
    let indices = prompt::multi_select_prompt(
        "適用するフィーチャを選択してください（複数選択可）",
        &items,
    )?;
    match indices {
        Some(indices) => Ok(StepResult::Value(
            indices.iter().map(|&i| available[i].clone()).collect(),
        )),
        None => Ok(StepResult::Back),
    }
}

/// ステップ6: Firebase 設定
pub(super) fn step_firebase(config: &CliConfig) -> Result<Option<FirebaseOptions>> {
    let enabled = match prompt::yes_no_prompt("Firebase 連携を有効にしますか？")? {
        Some(v) => v,
        None => return Ok(None),
    };
    if !enabled {
        return Ok(Some(FirebaseOptions::default()));
    }

    // ログイン済みならプロジェクトを選択式にする。失敗したら手入力。
    let available: Vec<String> = list_projects(config)
        .map(|projects| projects.into_iter().map(|p| p.project_id).collect())
        .unwrap_or_default();

    let split = match prompt::yes_no_prompt(
        "staging / production のフレーバーを分けますか？ (フレーバーごとに別の Firebase プロジェクトを割り当てます)",
    )? {
        Some(v) => v,
        None => return Ok(None),
    };

    let flavors = if split {
        let mut flavors = Vec::new();
        for name in ["staging", "production"] {
            let Some(project) = prompt_project(
                &format!("{name} 用の Firebase プロジェクトを指定してください"),
                &available,
            )?
            else {
                return Ok(None);
            };
            flavors.push(Flavor {
                name: name.to_string(),
                firebase_project: Some(project),
                suffix: None,
            });
        }
        flavors
    } else {
        let Some(project) =
            prompt_project("Firebase プロジェクトを指定してください", &available)?
        else {
            return Ok(None);
        };
        vec![Flavor {
            name: "production".to_string(),
            firebase_project: Some(project),
            suffix: None,
        }]
    };

    let labels: Vec<&str> = ALL_FIREBASE_FEATURES.iter().map(|f| f.label()).collect();
    let features = match prompt::multi_select_prompt(
        "有効にする Firebase 機能を選択してください（複数選択可）",
        &labels,
    )? {
        Some(indices) => indices.iter().map(|&i| ALL_FIREBASE_FEATURES[i]).collect(),
        None => return Ok(None),
    };

    let default_project = flavors.first().and_then(|f| f.firebase_project.clone());
    Ok(Some(FirebaseOptions {
        enabled: true,
        default_project,
        flavors,
        features,
    }))
}

/// ステップ7: ランチャーアイコン生成
pub(super) fn step_icons() -> Result<Option<IconOptions>> {
    match prompt::yes_no_prompt("ランチャーアイコンを生成しますか？ (flutter_launcher_icons)")? {
        Some(enabled) => Ok(Some(IconOptions {
            enabled,
            image_path: None,
        })),
        None => Ok(None),
    }
}

/// プロジェクト ID を一覧から選択、または手入力させる。
fn prompt_project(prompt_text: &str, available: &[String]) -> Result<Option<String>> {
    if available.is_empty() {
        match prompt::input_prompt(prompt_text, validate_not_empty) {
            Ok(project) => Ok(Some(project)),
            Err(_) => Ok(None),
        }
    } else {
        let items: Vec<&str> = available.iter().map(String::as_str).collect();
        Ok(prompt::select_prompt(prompt_text, &items)?.map(|i| available[i].clone()))
    }
}

fn validate_not_empty(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("入力してください。".into())
    } else {
        Ok(())
    }
}

// ============================================================================
// 確認表示
// ============================================================================

pub(super) fn print_confirmation(config: &SetupConfig) {
    print!("{}", format_confirmation(config));
}

/// 確認画面の内容を文字列として構築する（テスト可能）。
pub(super) fn format_confirmation(config: &SetupConfig) -> String {
    let mut out = String::new();
    out.push_str("\n[確認] 以下の内容でセットアップします。よろしいですか？\n");
    out.push_str(&format!("    アプリ名:       {}\n", config.app_name));
    if let Some(ref name) = config.project_name {
        out.push_str(&format!("    プロジェクト名: {name}\n"));
    }
    if let Some(ref org) = config.org {
        out.push_str(&format!("    組織識別子:     {org}\n"));
    }
    if let Some(ref dir) = config.output_dir {
        out.push_str(&format!("    出力先:         {}\n", dir.display()));
    }

    if config.features.is_empty() {
        out.push_str("    フィーチャ:     なし\n");
    } else {
        out.push_str(&format!(
            "    フィーチャ:     {}\n",
            config.features.join(", ")
        ));
    }

    if config.firebase.enabled {
        out.push_str("    Firebase:       有効\n");
        for flavor in &config.firebase.flavors {
            let project = flavor.firebase_project.as_deref().unwrap_or("-");
            out.push_str(&format!("      {}: {}\n", flavor.name, project));
        }
        if !config.firebase.features.is_empty() {
            let feature_strs: Vec<&str> = config
                .firebase
                .features
                .iter()
                .map(|f| f.label())
                .collect();
            out.push_str(&format!(
                "      機能: {}\n",
                feature_strs.join(", ")
            ));
        }
    } else {
        out.push_str("    Firebase:       無効\n");
    }

    out.push_str(&format!(
        "    アイコン生成:   {}\n",
        if config.icons.enabled { "有効" } else { "無効" }
    ));

    out
}

// ============================================================================
// テスト
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use flsetup_core::commands::setup::types::FirebaseFeature;

    fn sample_config() -> SetupConfig {
        SetupConfig {
            app_name: "My Shop".to_string(),
            project_name: Some("my_shop".to_string()),
            org: Some("com.example".to_string()),
            output_dir: Some(PathBuf::from("my_shop")),
            features: vec!["auth".to_string(), "theming".to_string()],
            firebase: FirebaseOptions {
                enabled: true,
                default_project: Some("my-shop-staging".to_string()),
                flavors: vec![
                    Flavor {
                        name: "staging".to_string(),
                        firebase_project: Some("my-shop-staging".to_string()),
                        suffix: None,
                    },
                    Flavor {
                        name: "production".to_string(),
                        firebase_project: Some("my-shop-prod".to_string()),
                        suffix: None,
                    },
                ],
                features: vec![FirebaseFeature::Auth, FirebaseFeature::Firestore],
            },
            ..SetupConfig::default()
        }
    }

    #[test]
    fn test_format_confirmation_full() {
        let output = format_confirmation(&sample_config());

        assert!(output.contains("アプリ名:       My Shop"));
        assert!(output.contains("プロジェクト名: my_shop"));
        assert!(output.contains("組織識別子:     com.example"));
        assert!(output.contains("フィーチャ:     auth, theming"));
        assert!(output.contains("Firebase:       有効"));
        assert!(output.contains("staging: my-shop-staging"));
        assert!(output.contains("production: my-shop-prod"));
        assert!(output.contains("機能: Authentication, Cloud Firestore"));
        assert!(output.contains("アイコン生成:   無効"));
    }

    #[test]
    fn test_format_confirmation_without_firebase() {
        let config = SetupConfig {
            app_name: "My Shop".to_string(),
            ..SetupConfig::default()
        };
        let output = format_confirmation(&config);

        assert!(output.contains("Firebase:       無効"));
        assert!(output.contains("フィーチャ:     なし"));
        assert!(!output.contains("機能:"));
    }

    #[test]
    fn test_format_confirmation_omits_unset_fields() {
        let config = SetupConfig {
            app_name: "My Shop".to_string(),
            ..SetupConfig::default()
        };
        let output = format_confirmation(&config);

        assert!(!output.contains("プロジェクト名:"));
        assert!(!output.contains("組織識別子:"));
        assert!(!output.contains("出力先:"));
    }
}

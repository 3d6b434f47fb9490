use std::fs;

use anyhow::{Context, Result};
use chrono::Local;

use super::types::NormalizedConfig;
use super::StepOutput;

/// 残作業をまとめた TODO.md を生成する。
///
/// 失敗してもパイプラインは継続する (呼び出し側で警告に降格される)。
pub(super) fn generate_todo(
    ncfg: &NormalizedConfig,
    collected_notes: &[String],
) -> Result<StepOutput> {
    let date = Local::now().format("%Y-%m-%d").to_string();
    let content = todo_source(ncfg, collected_notes, &date);

    let path = ncfg.output_dir.join("TODO.md");
    fs::write(&path, content)
        .with_context(|| format!("TODO.md の書き込みに失敗: {}", path.display()))?;

    Ok(StepOutput {
        files: vec![path],
        notes: Vec::new(),
    })
}

/// TODO.md の内容を構築する。
fn todo_source(ncfg: &NormalizedConfig, collected_notes: &[String], date: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# TODO — {}\n\n", ncfg.app_name));
    out.push_str(&format!("生成日: {date}\n\n"));
    out.push_str("flsetup が自動化できなかった残作業の一覧です。\n\n");

    out.push_str("## セットアップ中に記録された項目\n\n");
    if collected_notes.is_empty() {
        out.push_str("- (なし)\n");
    } else {
        for note in collected_notes {
            out.push_str(&format!("- [ ] {note}\n"));
        }
    }
    out.push('\n');

    out.push_str("## リリース前チェックリスト\n\n");
    if !ncfg.icons.enabled {
        out.push_str("- [ ] ランチャーアイコンを差し替える\n");
    }
    if ncfg.has_platform(super::types::Platform::Android) {
        out.push_str("- [ ] Android の署名鍵と key.properties を用意する\n");
    }
    if ncfg.has_platform(super::types::Platform::Ios) {
        out.push_str("- [ ] App Store Connect にアプリを登録する\n");
    }
    if ncfg.firebase.enabled {
        for flavor in &ncfg.firebase.flavors {
            if let Some(project) = &flavor.firebase_project {
                out.push_str(&format!(
                    "- [ ] Firebase プロジェクト '{project}' ({}) の本番設定を確認する\n",
                    flavor.name
                ));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::setup::types::{
        Flavor, FirebaseOptions, Platform, SetupConfig,
    };
    use crate::config::CliConfig;
    use tempfile::TempDir;

    fn normalized(config: SetupConfig) -> NormalizedConfig {
        config.normalized(&CliConfig::default()).unwrap()
    }

    #[test]
    fn test_todo_source_includes_collected_notes() {
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            ..SetupConfig::default()
        });
        let notes = vec!["署名設定を行う".to_string()];
        let content = todo_source(&ncfg, &notes, "2025-01-15");

        assert!(content.contains("# TODO — My Shop"));
        assert!(content.contains("生成日: 2025-01-15"));
        assert!(content.contains("- [ ] 署名設定を行う"));
    }

    #[test]
    fn test_todo_source_without_notes() {
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            ..SetupConfig::default()
        });
        let content = todo_source(&ncfg, &[], "2025-01-15");
        assert!(content.contains("- (なし)"));
    }

    #[test]
    fn test_todo_source_platform_and_firebase_items() {
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            platforms: vec![Platform::Android],
            firebase: FirebaseOptions {
                enabled: true,
                default_project: Some("my-shop-prod".to_string()),
                flavors: vec![Flavor::new("production")],
                features: vec![],
            },
            ..SetupConfig::default()
        });
        let content = todo_source(&ncfg, &[], "2025-01-15");

        assert!(content.contains("Android の署名鍵"));
        assert!(!content.contains("App Store Connect"));
        assert!(content.contains("'my-shop-prod' (production)"));
        // アイコン未生成時の項目
        assert!(content.contains("ランチャーアイコン"));
    }

    #[test]
    fn test_generate_todo_writes_file() {
        let tmp = TempDir::new().unwrap();
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            output_dir: Some(tmp.path().to_path_buf()),
            ..SetupConfig::default()
        });
        let output = generate_todo(&ncfg, &[]).unwrap();
        assert_eq!(output.files.len(), 1);
        assert!(tmp.path().join("TODO.md").exists());
    }

    #[test]
    fn test_generate_todo_missing_dir_fails() {
        let ncfg = normalized(SetupConfig {
            app_name: "My Shop".to_string(),
            output_dir: Some(std::path::PathBuf::from("/nonexistent/dir/project")),
            ..SetupConfig::default()
        });
        assert!(generate_todo(&ncfg, &[]).is_err());
    }
}

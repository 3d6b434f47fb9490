use anyhow::{Context, Result};
use std::fs;

use super::types::NormalizedConfig;
use super::{run_tool, StepOutput};
use crate::config::CliConfig;

/// `flutter create` で出力先にプロジェクトの骨格を生成する。
pub(super) fn create_project(ncfg: &NormalizedConfig, cli: &CliConfig) -> Result<StepOutput> {
    if ncfg.output_dir.join("pubspec.yaml").exists() {
        anyhow::bail!(
            "出力先には既に Flutter プロジェクトが存在します: {}",
            ncfg.output_dir.display()
        );
    }
    if let Some(parent) = ncfg.output_dir.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("出力先の親ディレクトリの作成に失敗: {}", parent.display())
            })?;
        }
    }

    let platforms_csv = ncfg
        .platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let output_dir = ncfg.output_dir.display().to_string();

    let args = [
        "create",
        "--project-name",
        &ncfg.project_name,
        "--org",
        &ncfg.org,
        "--description",
        &ncfg.description,
        "--platforms",
        &platforms_csv,
        // pub get はパイプライン最終ステップでリトライ付きで実行する
        "--no-pub",
        &output_dir,
    ];
    run_tool(&cli.flutter_bin, &args, std::path::Path::new("."))?;

    Ok(StepOutput {
        files: vec![ncfg.output_dir.clone()],
        notes: Vec::new(),
    })
}

use std::process::Command;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CliConfig;

/// Firebase プロジェクト情報。
///
/// `firebase projects:list --json` の result 要素に対応する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseProject {
    pub project_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub project_number: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// `firebase projects:list --json` の応答全体。
#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    status: String,
    #[serde(default)]
    result: Vec<FirebaseProject>,
}

/// ログイン済みアカウントの Firebase プロジェクト一覧を取得する。
///
/// # Errors
/// firebase CLI の実行に失敗した場合、または応答のパースに失敗した場合。
pub fn list_projects(config: &CliConfig) -> Result<Vec<FirebaseProject>> {
    let output = Command::new(&config.firebase_bin)
        .args(["projects:list", "--json"])
        .output()
        .with_context(|| {
            format!(
                "firebase CLI の実行に失敗しました: {}",
                config.firebase_bin
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "firebase projects:list が失敗しました (exit code: {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_projects_json(&stdout)
}

/// `firebase projects:list --json` の出力をパースする。
fn parse_projects_json(json: &str) -> Result<Vec<FirebaseProject>> {
    let response: ProjectsResponse =
        serde_json::from_str(json).context("firebase CLI の応答のパースに失敗しました")?;
    if response.status != "success" {
        anyhow::bail!(
            "firebase CLI がエラー応答を返しました (status: {})",
            response.status
        );
    }
    Ok(response.result)
}

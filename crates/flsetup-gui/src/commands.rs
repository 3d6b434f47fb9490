use flsetup_core::commands::doctor::{platform_info, EnvironmentStatus, PlatformInfo};
use flsetup_core::commands::firebase::{self, FirebaseProject};
use flsetup_core::commands::setup::{execute_setup_with_progress, SetupConfig, SetupResponse};
use flsetup_core::progress::{ProgressSnapshot, ALL_STEPS, PROGRESS};
use flsetup_core::{CliConfig, TemplateEngine};

/// GUI が使う設定を解決する。
///
/// カレントディレクトリの flsetup.yaml (無ければユーザー設定 / デフォルト)。
fn load_cli_config() -> CliConfig {
    flsetup_core::load_config("flsetup.yaml").unwrap_or_default()
}

#[tauri::command]
pub fn get_config() -> Result<CliConfig, String> {
    flsetup_core::load_config("flsetup.yaml").map_err(|e| e.to_string())
}

#[tauri::command]
#[allow(clippy::needless_pass_by_value)]
pub fn validate_app_name(name: String) -> Result<(), String> {
    flsetup_core::validate_app_name(&name)
}

#[tauri::command]
#[allow(clippy::needless_pass_by_value)]
pub fn validate_project_name(name: String) -> Result<(), String> {
    flsetup_core::validate_project_name(&name)
}

#[tauri::command]
#[allow(clippy::needless_pass_by_value)]
pub fn validate_org(org: String) -> Result<(), String> {
    flsetup_core::validate_org(&org)
}

/// 3 ツールのバージョンチェック (並列実行)。
#[tauri::command]
pub fn check_environment() -> EnvironmentStatus {
    flsetup_core::commands::doctor::check_environment(&load_cli_config())
}

#[tauri::command]
pub fn get_platform_info() -> PlatformInfo {
    platform_info(&load_cli_config())
}

#[tauri::command]
pub fn list_firebase_projects() -> Result<Vec<FirebaseProject>, String> {
    firebase::list_projects(&load_cli_config()).map_err(|e| format!("{e:#}"))
}

/// フォームに表示する選択可能フィーチャの一覧。
#[tauri::command]
pub fn scan_features() -> Vec<String> {
    TemplateEngine::scan_features(&load_cli_config().template_root())
}

/// セットアップ本体。
///
/// 実行前にグローバル進捗ストアをリセットし、各ステップの進捗を
/// ストアへ書き込む。フロントエンドは実行中 `get_setup_progress` を
/// ポーリングして進捗を描画する。
#[tauri::command]
#[allow(clippy::needless_pass_by_value)]
pub fn execute_setup(config: SetupConfig) -> SetupResponse {
    let cli = load_cli_config();
    PROGRESS.reset(ALL_STEPS);
    execute_setup_with_progress(&config, &cli, |event| PROGRESS.record(&event))
}

/// ポーリング用の進捗スナップショット。
#[tauri::command]
pub fn get_setup_progress() -> ProgressSnapshot {
    PROGRESS.snapshot()
}

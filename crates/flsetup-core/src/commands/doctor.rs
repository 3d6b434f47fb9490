use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::config::CliConfig;

/// チェック対象の外部ツール。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Flutter,
    Firebase,
    Flutterfire,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Flutter => "flutter",
            ToolKind::Firebase => "firebase",
            ToolKind::Flutterfire => "flutterfire",
        }
    }
}

/// 1 ツール分のチェック結果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolStatus {
    pub tool: ToolKind,
    pub installed: bool,
    pub version: Option<String>,
    pub error: Option<String>,
}

/// 環境チェックの結果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentStatus {
    pub flutter: ToolStatus,
    pub firebase: ToolStatus,
    pub flutterfire: ToolStatus,
}

impl EnvironmentStatus {
    /// セットアップ実行に必要な最低条件 (flutter) を満たしているか。
    pub fn flutter_ready(&self) -> bool {
        self.flutter.installed
    }

    /// Firebase 連携に必要なツールが揃っているか。
    pub fn firebase_ready(&self) -> bool {
        self.firebase.installed && self.flutterfire.installed
    }
}

/// 3 ツールのバージョンチェックを並列に実行する。
///
/// 各チェックは独立した外部コマンド呼び出しで数秒かかることがあるため、
/// スコープ付きスレッドで同時に走らせる。
pub fn check_environment(config: &CliConfig) -> EnvironmentStatus {
    thread::scope(|scope| {
        let flutter = scope.spawn(|| probe_tool(ToolKind::Flutter, &config.flutter_bin));
        let firebase = scope.spawn(|| probe_tool(ToolKind::Firebase, &config.firebase_bin));
        let flutterfire =
            scope.spawn(|| probe_tool(ToolKind::Flutterfire, &config.flutterfire_bin));

        EnvironmentStatus {
            flutter: flutter.join().expect("flutter チェックスレッドが panic"),
            firebase: firebase.join().expect("firebase チェックスレッドが panic"),
            flutterfire: flutterfire
                .join()
                .expect("flutterfire チェックスレッドが panic"),
        }
    })
}

/// `<bin> --version` を実行して結果を `ToolStatus` にまとめる。
fn probe_tool(tool: ToolKind, bin: &str) -> ToolStatus {
    match Command::new(bin).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            ToolStatus {
                tool,
                installed: true,
                version: parse_version_line(&stdout),
                error: None,
            }
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            ToolStatus {
                tool,
                installed: false,
                version: None,
                error: Some(format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                )),
            }
        }
        Err(e) => ToolStatus {
            tool,
            installed: false,
            version: None,
            error: Some(e.to_string()),
        },
    }
}

/// `--version` 出力の最初の非空行からバージョン番号らしきトークンを取り出す。
///
/// - `Flutter 3.24.3 • channel stable • ...` -> `3.24.3`
/// - `13.20.2` (firebase CLI) -> `13.20.2`
fn parse_version_line(output: &str) -> Option<String> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    line.split_whitespace()
        .find(|token| token.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(ToString::to_string)
}

// ============================================================================
// プラットフォーム情報
// ============================================================================

/// 解決済みツールパス。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolPath {
    pub name: String,
    pub path: Option<PathBuf>,
}

/// ホスト環境の情報。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformInfo {
    /// OS 識別子 (linux / macos / windows)
    pub os: String,
    /// CPU アーキテクチャ (`x86_64` / aarch64)
    pub arch: String,
    /// PATH から解決した各ツールの場所
    pub tools: Vec<ToolPath>,
}

/// ホスト環境の情報を収集する。
pub fn platform_info(config: &CliConfig) -> PlatformInfo {
    let bins = [
        &config.flutter_bin,
        &config.dart_bin,
        &config.flutterfire_bin,
        &config.firebase_bin,
    ];
    let tools = bins
        .iter()
        .map(|bin| ToolPath {
            name: bin.to_string(),
            path: resolve_in_path(bin),
        })
        .collect();

    PlatformInfo {
        os: env::consts::OS.to_string(),
        arch: env::consts::ARCH.to_string(),
        tools,
    }
}

/// PATH 環境変数からコマンドの実体を探す。
///
/// 既に絶対パス・相対パスで指定されている場合はそのまま存在確認する。
fn resolve_in_path(bin: &str) -> Option<PathBuf> {
    let candidate = Path::new(bin);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let full = dir.join(bin);
        if full.is_file() {
            return Some(full);
        }
        // Windows では .exe / .bat / .cmd を補って探す
        if cfg!(windows) {
            for ext in ["exe", "bat", "cmd"] {
                let with_ext = dir.join(format!("{bin}.{ext}"));
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
    }
    None
}

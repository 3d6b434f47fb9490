use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// ツール全体の設定を保持する構造体。
///
/// カレントディレクトリの flsetup.yaml、なければユーザー設定ディレクトリの
/// flsetup/flsetup.yaml から読み込む。どちらも無い場合はデフォルト値。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// flutter コマンドのパス
    pub flutter_bin: String,
    /// dart コマンドのパス
    pub dart_bin: String,
    /// flutterfire コマンドのパス
    pub flutterfire_bin: String,
    /// firebase コマンドのパス
    pub firebase_bin: String,
    /// 組織識別子のデフォルト (逆ドメイン形式)
    pub default_org: String,
    /// テンプレートルートの上書き (未指定時は ./templates)
    pub template_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            flutter_bin: "flutter".to_string(),
            dart_bin: "dart".to_string(),
            flutterfire_bin: "flutterfire".to_string(),
            firebase_bin: "firebase".to_string(),
            default_org: "com.example".to_string(),
            template_dir: None,
        }
    }
}

impl CliConfig {
    /// テンプレートルートを解決する。
    pub fn template_root(&self) -> PathBuf {
        self.template_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("templates"))
    }
}

/// 設定ファイルを読み込む。
///
/// 指定されたパスから YAML 形式の設定ファイルを読み込む。
/// ファイルが存在しない場合はユーザー設定ディレクトリを探し、
/// それも無ければデフォルト値を返す。
///
/// # Errors
/// ファイルの読み込みまたはパースに失敗した場合。
pub fn load_config(path: &str) -> anyhow::Result<CliConfig> {
    let config_path = Path::new(path);
    if config_path.exists() {
        return read_config_file(config_path);
    }
    if let Some(user_path) = user_config_path() {
        if user_path.exists() {
            return read_config_file(&user_path);
        }
    }
    Ok(CliConfig::default())
}

/// ユーザー設定ディレクトリ配下の設定ファイルパスを返す。
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flsetup").join("flsetup.yaml"))
}

fn read_config_file(path: &Path) -> anyhow::Result<CliConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("設定ファイルの読み込みに失敗: {}", e))?;
    let config: CliConfig = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("設定ファイルのパースに失敗: {}", e))?;
    Ok(config)
}

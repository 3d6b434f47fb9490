use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::CliConfig;
use crate::progress::{SetupStepId, StepStatus};
use crate::validation::{
    validate_android_package, validate_app_name, validate_bundle_id, validate_feature_id,
    validate_org, validate_project_name,
};

// ============================================================================
// 入力型
// ============================================================================

/// 対象プラットフォーム。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    Web,
    Macos,
}

/// 選択可能なプラットフォーム一覧。
pub const ALL_PLATFORMS: &[Platform] = &[
    Platform::Android,
    Platform::Ios,
    Platform::Web,
    Platform::Macos,
];

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Web => "web",
            Platform::Macos => "macos",
        }
    }
}

/// 有効化できる Firebase 機能。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirebaseFeature {
    Analytics,
    Auth,
    Firestore,
    Storage,
    Messaging,
    Crashlytics,
}

/// 選択可能な Firebase 機能一覧。
pub const ALL_FIREBASE_FEATURES: &[FirebaseFeature] = &[
    FirebaseFeature::Analytics,
    FirebaseFeature::Auth,
    FirebaseFeature::Firestore,
    FirebaseFeature::Storage,
    FirebaseFeature::Messaging,
    FirebaseFeature::Crashlytics,
];

impl FirebaseFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            FirebaseFeature::Analytics => "analytics",
            FirebaseFeature::Auth => "auth",
            FirebaseFeature::Firestore => "firestore",
            FirebaseFeature::Storage => "storage",
            FirebaseFeature::Messaging => "messaging",
            FirebaseFeature::Crashlytics => "crashlytics",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FirebaseFeature::Analytics => "Analytics",
            FirebaseFeature::Auth => "Authentication",
            FirebaseFeature::Firestore => "Cloud Firestore",
            FirebaseFeature::Storage => "Cloud Storage",
            FirebaseFeature::Messaging => "Cloud Messaging",
            FirebaseFeature::Crashlytics => "Crashlytics",
        }
    }

    /// pubspec.yaml に追加する依存パッケージ (パッケージ名, バージョン指定)。
    pub fn pubspec_dependency(self) -> (&'static str, &'static str) {
        match self {
            FirebaseFeature::Analytics => ("firebase_analytics", "^11.3.3"),
            FirebaseFeature::Auth => ("firebase_auth", "^5.3.1"),
            FirebaseFeature::Firestore => ("cloud_firestore", "^5.4.4"),
            FirebaseFeature::Storage => ("firebase_storage", "^12.3.2"),
            FirebaseFeature::Messaging => ("firebase_messaging", "^15.1.3"),
            FirebaseFeature::Crashlytics => ("firebase_crashlytics", "^4.1.3"),
        }
    }
}

/// ビルドフレーバー。
///
/// フレーバーごとに別の Firebase プロジェクトを割り当てられる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Flavor {
    /// フレーバー名 (staging / production など)
    pub name: String,
    /// 割り当てる Firebase プロジェクト ID (未指定時は `default_project`)
    pub firebase_project: Option<String>,
    /// Bundle ID / アプリケーション ID の接尾辞 (未指定時は自動導出)
    pub suffix: Option<String>,
}

impl Flavor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            firebase_project: None,
            suffix: None,
        }
    }
}

/// Firebase 連携の設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FirebaseOptions {
    pub enabled: bool,
    /// フレーバーが個別指定を持たない場合のデフォルトプロジェクト
    pub default_project: Option<String>,
    pub flavors: Vec<Flavor>,
    pub features: Vec<FirebaseFeature>,
}

/// ランチャーアイコン生成の設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IconOptions {
    pub enabled: bool,
    /// アイコン画像のパス (プロジェクトルートからの相対)
    pub image_path: Option<String>,
}

/// セットアップリクエスト。
///
/// GUI フォームまたは CLI 対話フローの入力をそのまま保持する。
/// 1 回の実行中は `normalized()` の結果のみを参照し、本体は変更しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SetupConfig {
    /// アプリ表示名 (必須)
    pub app_name: String,
    /// プロジェクト名 (未指定時はアプリ名から導出)
    pub project_name: Option<String>,
    /// 組織識別子 (未指定時は設定ファイルのデフォルト)
    pub org: Option<String>,
    /// iOS Bundle ID (未指定時は自動導出)
    pub bundle_id: Option<String>,
    /// Android アプリケーション ID (未指定時は自動導出)
    pub android_package: Option<String>,
    /// アプリ説明文
    pub description: Option<String>,
    /// 出力先ディレクトリ (未指定時は ./{`project_name`})
    pub output_dir: Option<PathBuf>,
    /// 対象プラットフォーム (未指定時は android + ios)
    pub platforms: Vec<Platform>,
    /// 適用するフィーチャテンプレート ID
    pub features: Vec<String>,
    pub firebase: FirebaseOptions,
    pub icons: IconOptions,
}

// ============================================================================
// 正規化
// ============================================================================

/// 正規化済みのセットアップ設定。
///
/// すべてのデフォルト値適用と導出が済んでおり、パイプラインの各ステップは
/// この型のみを参照する。
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig {
    pub app_name: String,
    pub project_name: String,
    pub org: String,
    pub bundle_id: String,
    pub android_package: String,
    pub description: String,
    pub output_dir: PathBuf,
    pub platforms: Vec<Platform>,
    pub features: Vec<String>,
    pub firebase: FirebaseOptions,
    pub icons: IconOptions,
}

/// アプリ説明文のデフォルト値。
const DEFAULT_DESCRIPTION: &str = "A new Flutter project.";

/// アプリ表示名から Dart パッケージ名を導出する。
///
/// 英数字以外をアンダースコアに置換し、連続・先頭末尾のアンダースコアを
/// 整理する。結果が空になる場合は `flutter_app`、数字始まりの場合は
/// `app_` を前置する。
pub fn derive_project_name(app_name: &str) -> String {
    let mut name = String::new();
    let mut prev_underscore = false;
    for c in app_name.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
            prev_underscore = false;
        } else if !prev_underscore && !name.is_empty() {
            name.push('_');
            prev_underscore = true;
        }
    }
    let name = name.trim_end_matches('_');

    if name.is_empty() {
        return "flutter_app".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("app_{name}");
    }
    name.to_string()
}

impl SetupConfig {
    /// デフォルト値を適用し、全入力を検証して正規化する。
    ///
    /// # Errors
    /// いずれかの入力がバリデーションに失敗した場合。
    pub fn normalized(&self, cli: &CliConfig) -> Result<NormalizedConfig, String> {
        validate_app_name(&self.app_name)?;

        let project_name = match &self.project_name {
            Some(name) => {
                validate_project_name(name)?;
                name.clone()
            }
            None => derive_project_name(&self.app_name),
        };

        let org = match &self.org {
            Some(org) => org.clone(),
            None => cli.default_org.clone(),
        };
        validate_org(&org)?;

        let bundle_id = match &self.bundle_id {
            Some(id) => id.clone(),
            None => format!("{}.{}", org, project_name.replace('_', "-")),
        };
        validate_bundle_id(&bundle_id)?;

        let android_package = match &self.android_package {
            Some(pkg) => pkg.clone(),
            None => format!("{org}.{project_name}"),
        };
        validate_android_package(&android_package)?;

        let description = self
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&project_name));

        let platforms = if self.platforms.is_empty() {
            vec![Platform::Android, Platform::Ios]
        } else {
            let mut seen = Vec::new();
            for &p in &self.platforms {
                if !seen.contains(&p) {
                    seen.push(p);
                }
            }
            seen
        };

        let mut features = Vec::new();
        for id in &self.features {
            validate_feature_id(id)?;
            if !features.contains(id) {
                features.push(id.clone());
            }
        }

        let firebase = Self::normalize_firebase(&self.firebase)?;

        let icons = IconOptions {
            enabled: self.icons.enabled,
            image_path: if self.icons.enabled {
                Some(
                    self.icons
                        .image_path
                        .clone()
                        .filter(|p| !p.trim().is_empty())
                        .unwrap_or_else(|| "assets/icon/icon.png".to_string()),
                )
            } else {
                None
            },
        };

        Ok(NormalizedConfig {
            app_name: self.app_name.clone(),
            project_name,
            org,
            bundle_id,
            android_package,
            description,
            output_dir,
            platforms,
            features,
            firebase,
            icons,
        })
    }

    /// Firebase 設定のデフォルト値適用。
    ///
    /// - 無効時はフレーバー・機能を空にする
    /// - 有効でフレーバー未指定時は production 1 件に畳み込む
    /// - 各フレーバーのプロジェクト ID は `default_project` にフォールバック
    /// - 接尾辞未指定時: production は無し、それ以外は `.{name}`
    fn normalize_firebase(firebase: &FirebaseOptions) -> Result<FirebaseOptions, String> {
        if !firebase.enabled {
            return Ok(FirebaseOptions::default());
        }

        let raw_flavors = if firebase.flavors.is_empty() {
            vec![Flavor::new("production")]
        } else {
            firebase.flavors.clone()
        };

        let mut flavors = Vec::new();
        for flavor in &raw_flavors {
            validate_feature_id(&flavor.name)
                .map_err(|e| format!("フレーバー名 '{}' が無効です: {}", flavor.name, e))?;
            if flavors.iter().any(|f: &Flavor| f.name == flavor.name) {
                return Err(format!("フレーバー名 '{}' が重複しています。", flavor.name));
            }

            let firebase_project = flavor
                .firebase_project
                .clone()
                .or_else(|| firebase.default_project.clone());
            if firebase_project.is_none() {
                return Err(format!(
                    "フレーバー '{}' の Firebase プロジェクトが未指定です。",
                    flavor.name
                ));
            }

            let suffix = flavor.suffix.clone().or_else(|| {
                (flavor.name != "production").then(|| format!(".{}", flavor.name))
            });

            flavors.push(Flavor {
                name: flavor.name.clone(),
                firebase_project,
                suffix,
            });
        }

        let mut features = Vec::new();
        for &f in &firebase.features {
            if !features.contains(&f) {
                features.push(f);
            }
        }

        Ok(FirebaseOptions {
            enabled: true,
            default_project: firebase.default_project.clone(),
            flavors,
            features,
        })
    }
}

impl NormalizedConfig {
    /// プラットフォームを含むか。
    pub fn has_platform(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// フレーバーに適用する Bundle ID (接尾辞付き)。
    pub fn flavored_bundle_id(&self, flavor: &Flavor) -> String {
        match &flavor.suffix {
            // iOS ではアンダースコアが使えないためハイフンに置換する
            Some(suffix) => format!("{}{}", self.bundle_id, suffix.replace('_', "-")),
            None => self.bundle_id.clone(),
        }
    }

    /// フレーバーに適用する Android アプリケーション ID (接尾辞付き)。
    pub fn flavored_android_package(&self, flavor: &Flavor) -> String {
        match &flavor.suffix {
            Some(suffix) => format!("{}{}", self.android_package, suffix),
            None => self.android_package.clone(),
        }
    }

    /// フレーバーに適用するアプリ表示名。
    pub fn flavored_app_name(&self, flavor: &Flavor) -> String {
        if flavor.name == "production" {
            self.app_name.clone()
        } else {
            format!("{} ({})", self.app_name, flavor.name)
        }
    }
}

// ============================================================================
// 実行結果
// ============================================================================

/// 1 ステップ分の実行結果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    pub id: SetupStepId,
    pub status: StepStatus,
    pub detail: Option<String>,
}

/// セットアップ全体の実行結果。
///
/// 各ステップが実行中に書き足していくアキュムレータ。HTTP 応答相当の
/// `SetupResponse` に包んで返却したあとは破棄される。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SetupResult {
    /// 作成・変更したファイル
    pub created_files: Vec<String>,
    /// ステップごとの結果
    pub steps: Vec<StepOutcome>,
    /// 手動で行う残作業
    pub next_steps: Vec<String>,
    /// 発生したエラー
    pub errors: Vec<String>,
}

impl SetupResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルパス一覧を記録する。
    pub fn record_files(&mut self, files: &[PathBuf]) {
        for file in files {
            self.created_files.push(file.display().to_string());
        }
    }
}

/// セットアップ実行の応答。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupResponse {
    pub success: bool,
    pub message: String,
    pub result: SetupResult,
}

// ============================================================================
// テスト
// ============================================================================

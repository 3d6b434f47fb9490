use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// セットアップパイプラインのステップ ID。
///
/// クライアントにはスネークケースの文字列として公開される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStepId {
    CreateProject,
    ApplyFeatures,
    UpdatePubspec,
    ConfigureFirebase,
    CreateIosConfigs,
    CreateAndroidConfigs,
    GenerateIcons,
    GenerateTodo,
    FetchDependencies,
}

/// パイプラインの実行順。
pub const ALL_STEPS: &[SetupStepId] = &[
    SetupStepId::CreateProject,
    SetupStepId::ApplyFeatures,
    SetupStepId::UpdatePubspec,
    SetupStepId::ConfigureFirebase,
    SetupStepId::CreateIosConfigs,
    SetupStepId::CreateAndroidConfigs,
    SetupStepId::GenerateIcons,
    SetupStepId::GenerateTodo,
    SetupStepId::FetchDependencies,
];

impl SetupStepId {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupStepId::CreateProject => "create_project",
            SetupStepId::ApplyFeatures => "apply_features",
            SetupStepId::UpdatePubspec => "update_pubspec",
            SetupStepId::ConfigureFirebase => "configure_firebase",
            SetupStepId::CreateIosConfigs => "create_ios_configs",
            SetupStepId::CreateAndroidConfigs => "create_android_configs",
            SetupStepId::GenerateIcons => "generate_icons",
            SetupStepId::GenerateTodo => "generate_todo",
            SetupStepId::FetchDependencies => "fetch_dependencies",
        }
    }

    /// 画面表示用ラベル。
    pub fn label(self) -> &'static str {
        match self {
            SetupStepId::CreateProject => "Flutter プロジェクト作成",
            SetupStepId::ApplyFeatures => "フィーチャテンプレート適用",
            SetupStepId::UpdatePubspec => "pubspec.yaml 更新",
            SetupStepId::ConfigureFirebase => "Firebase 設定",
            SetupStepId::CreateIosConfigs => "iOS フレーバー設定",
            SetupStepId::CreateAndroidConfigs => "Android フレーバー設定",
            SetupStepId::GenerateIcons => "アイコン生成",
            SetupStepId::GenerateTodo => "TODO.md 生成",
            SetupStepId::FetchDependencies => "依存関係の取得",
        }
    }

    /// ALL_STEPS 中の位置 (1 始まり)。進捗表示用。
    pub fn position(self) -> usize {
        ALL_STEPS.iter().position(|&s| s == self).unwrap_or(0) + 1
    }
}

/// ステップの実行状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// 進捗イベント。
///
/// セットアップ実行中の各ステップからコールバック経由で通知される。
/// GUI では ProgressStore に書き込まれ、ポーリングで取得される。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum ProgressEvent {
    /// ステップ開始
    StepStarted { step: SetupStepId, message: String },
    /// ステップ完了
    StepCompleted { step: SetupStepId, message: String },
    /// ステップスキップ
    StepSkipped { step: SetupStepId, message: String },
    /// ステップ失敗
    StepFailed { step: SetupStepId, message: String },
    /// ログメッセージ
    Log { message: String },
    /// 警告 (パイプラインは継続)
    Warning { message: String },
    /// 全体完了
    Finished { success: bool, message: String },
}

/// プログレスコールバックの型。
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + 'static>;

/// プログレスイベントを stdout に出力するデフォルトコールバック。
pub fn print_progress(event: &ProgressEvent) {
    let total = ALL_STEPS.len();
    match event {
        ProgressEvent::StepStarted { step, message } => {
            println!("[{}/{}] {} ...", step.position(), total, message);
        }
        ProgressEvent::StepCompleted { step, message } => {
            println!("[{}/{}] \u{2713} {}", step.position(), total, message);
        }
        ProgressEvent::StepSkipped { step, message } => {
            println!("[{}/{}] - {}", step.position(), total, message);
        }
        ProgressEvent::StepFailed { step, message } => {
            eprintln!("[{}/{}] \u{2717} {}", step.position(), total, message);
        }
        ProgressEvent::Log { message } => {
            println!("  {message}");
        }
        ProgressEvent::Warning { message } => {
            println!("  警告: {message}");
        }
        ProgressEvent::Finished { success, message } => {
            if *success {
                println!("\u{2713} {message}");
            } else {
                eprintln!("\u{2717} {message}");
            }
        }
    }
}

/// 1 ステップ分の進捗レコード。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepProgress {
    pub id: SetupStepId,
    pub label: String,
    pub status: StepStatus,
    /// 直近のメッセージ (開始時・完了時・失敗時に更新)
    pub detail: Option<String>,
}

/// ポーリング応答のスナップショット。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressSnapshot {
    pub steps: Vec<StepProgress>,
    pub is_complete: bool,
}

/// プロセス全体で共有する進捗ストア。
///
/// 単一オペレータのローカルツールであるため、同時に走るセットアップは
/// 1 件と仮定してよい。各実行の開始時に reset される。
pub struct ProgressStore {
    inner: Mutex<ProgressSnapshot>,
}

/// グローバル進捗ストア。GUI のポーリングコマンドから参照される。
pub static PROGRESS: Lazy<ProgressStore> = Lazy::new(ProgressStore::new);

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ProgressSnapshot {
                steps: Vec::new(),
                is_complete: false,
            }),
        }
    }

    /// 実行開始時にステップ一覧を初期化する。
    pub fn reset(&self, steps: &[SetupStepId]) {
        let mut inner = self.inner.lock().unwrap();
        inner.steps = steps
            .iter()
            .map(|&id| StepProgress {
                id,
                label: id.label().to_string(),
                status: StepStatus::Pending,
                detail: None,
            })
            .collect();
        inner.is_complete = false;
    }

    /// イベントを反映する。
    pub fn record(&self, event: &ProgressEvent) {
        let mut inner = self.inner.lock().unwrap();
        match event {
            ProgressEvent::StepStarted { step, message } => {
                Self::update_step(&mut inner.steps, *step, StepStatus::Running, message);
            }
            ProgressEvent::StepCompleted { step, message } => {
                Self::update_step(&mut inner.steps, *step, StepStatus::Succeeded, message);
            }
            ProgressEvent::StepSkipped { step, message } => {
                Self::update_step(&mut inner.steps, *step, StepStatus::Skipped, message);
            }
            ProgressEvent::StepFailed { step, message } => {
                Self::update_step(&mut inner.steps, *step, StepStatus::Failed, message);
            }
            ProgressEvent::Finished { .. } => {
                inner.is_complete = true;
            }
            ProgressEvent::Log { .. } | ProgressEvent::Warning { .. } => {}
        }
    }

    fn update_step(
        steps: &mut [StepProgress],
        id: SetupStepId,
        status: StepStatus,
        message: &str,
    ) {
        if let Some(step) = steps.iter_mut().find(|s| s.id == id) {
            step.status = status;
            step.detail = Some(message.to_string());
        }
    }

    /// 現在のスナップショットを返す。
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.lock().unwrap().clone()
    }
}

mod steps;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::style;
use indicatif::ProgressBar;

use flsetup_core::commands::setup::{execute_setup_with_progress, types::*};
use flsetup_core::progress::{ProgressEvent, ALL_STEPS};
use flsetup_core::CliConfig;

use crate::prompt::{self, ConfirmResult};
use steps::{
    print_confirmation, step_app_name, step_features, step_firebase, step_icons, step_org,
    step_output_dir, step_project_name, StepResult,
};

/// `flsetup setup` の引数。
#[derive(Debug, Args)]
pub struct SetupArgs {
    /// アプリ表示名 (未指定時は対話フローに入る)
    #[arg(long)]
    pub app_name: Option<String>,

    /// プロジェクト名 (`snake_case`)
    #[arg(long)]
    pub project_name: Option<String>,

    /// 組織識別子 (逆ドメイン形式)
    #[arg(long)]
    pub org: Option<String>,

    /// 出力先ディレクトリ
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// 適用するフィーチャ (カンマ区切り)
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Firebase 連携を有効にする
    #[arg(long)]
    pub firebase: bool,

    /// Firebase プロジェクト ID (--firebase 指定時)
    #[arg(long)]
    pub firebase_project: Option<String>,

    /// staging / production のフレーバーを作成する (--firebase 指定時)
    #[arg(long)]
    pub flavors: bool,

    /// ランチャーアイコンを生成する
    #[arg(long)]
    pub icons: bool,
}

/// サブコマンド形式での実行。
///
/// `--app-name` があれば非対話で実行し、無ければ対話フローに入る。
///
/// # Errors
///
/// セットアップに失敗した場合。
pub fn run_with_args(args: &SetupArgs, config: &CliConfig) -> Result<()> {
    match &args.app_name {
        Some(_) => {
            let setup = config_from_args(args);
            execute(&setup, config)
        }
        None => run_interactive(config),
    }
}

/// 引数から `SetupConfig` を組み立てる。
fn config_from_args(args: &SetupArgs) -> SetupConfig {
    let flavors = if args.firebase && args.flavors {
        vec![Flavor::new("staging"), Flavor::new("production")]
    } else {
        Vec::new()
    };

    SetupConfig {
        app_name: args.app_name.clone().unwrap_or_default(),
        project_name: args.project_name.clone(),
        org: args.org.clone(),
        output_dir: args.output_dir.clone(),
        features: args.features.clone(),
        firebase: FirebaseOptions {
            enabled: args.firebase,
            default_project: args.firebase_project.clone(),
            flavors,
            features: Vec::new(),
        },
        icons: IconOptions {
            enabled: args.icons,
            image_path: None,
        },
        ..SetupConfig::default()
    }
}

// ============================================================================
// ステートマシン
// ============================================================================

/// ステートマシンのステップ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    AppName,
    ProjectName,
    Org,
    OutputDir,
    Features,
    Firebase,
    Icons,
    Confirm,
}

/// 対話フローでセットアップ内容を組み立てて実行する。
///
/// 各ステップで Esc を押すと前のステップに戻る。
/// 最初のステップで Esc → メニューに戻る。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合、またはセットアップに失敗した場合。
pub fn run_interactive(config: &CliConfig) -> Result<()> {
    println!("\n--- 新規アプリのセットアップ ---\n");

    let mut step = Step::AppName;

    // 各ステップの入力結果を保持する変数
    let mut app_name = String::new();
    let mut project_name = String::new();
    let mut org = String::new();
    let mut output_dir = PathBuf::new();
    let mut features: Vec<String> = Vec::new();
    let mut features_skipped = false;
    let mut firebase = FirebaseOptions::default();
    let mut icons = IconOptions::default();

    loop {
        match step {
            Step::AppName => match step_app_name()? {
                Some(name) => {
                    app_name = name;
                    step = Step::ProjectName;
                }
                None => return Ok(()),
            },

            Step::ProjectName => match step_project_name(&app_name)? {
                Some(name) => {
                    project_name = name;
                    step = Step::Org;
                }
                None => {
                    step = Step::AppName;
                }
            },

            Step::Org => match step_org(config)? {
                Some(value) => {
                    org = value;
                    step = Step::OutputDir;
                }
                None => {
                    step = Step::ProjectName;
                }
            },

            Step::OutputDir => match step_output_dir(&project_name)? {
                Some(dir) => {
                    output_dir = dir;
                    step = Step::Features;
                }
                None => {
                    step = Step::Org;
                }
            },

            Step::Features => match step_features(config)? {
                StepResult::Value(selected) => {
                    features = selected;
                    features_skipped = false;
                    step = Step::Firebase;
                }
                StepResult::Skip => {
                    features = Vec::new();
                    features_skipped = true;
                    step = Step::Firebase;
                }
                StepResult::Back => {
                    step = Step::OutputDir;
                }
            },

            Step::Firebase => match step_firebase(config)? {
                Some(options) => {
                    firebase = options;
                    step = Step::Icons;
                }
                None => {
                    // Features がスキップされた場合は OutputDir に戻る
                    step = if features_skipped {
                        Step::OutputDir
                    } else {
                        Step::Features
                    };
                }
            },

            Step::Icons => match step_icons()? {
                Some(options) => {
                    icons = options;
                    step = Step::Confirm;
                }
                None => {
                    step = Step::Firebase;
                }
            },

            Step::Confirm => {
                let setup = SetupConfig {
                    app_name: app_name.clone(),
                    project_name: Some(project_name.clone()),
                    org: Some(org.clone()),
                    output_dir: Some(output_dir.clone()),
                    features: features.clone(),
                    firebase: firebase.clone(),
                    icons: icons.clone(),
                    ..SetupConfig::default()
                };

                print_confirmation(&setup);
                match prompt::confirm_prompt()? {
                    ConfirmResult::Yes => {
                        return execute(&setup, config);
                    }
                    ConfirmResult::GoBack => {
                        step = Step::Icons;
                    }
                    ConfirmResult::Cancel => {
                        println!("キャンセルしました。");
                        return Ok(());
                    }
                }
            }
        }
    }
}

// ============================================================================
// 実行と結果表示
// ============================================================================

/// セットアップを実行し、進捗と結果を表示する。
fn execute(setup: &SetupConfig, config: &CliConfig) -> Result<()> {
    println!();
    let total = ALL_STEPS.len();

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));

    let response = execute_setup_with_progress(setup, config, |event| match event {
        ProgressEvent::StepStarted { step, message } => {
            spinner.set_message(format!("[{}/{}] {} ...", step.position(), total, message));
        }
        ProgressEvent::StepCompleted { step, message } => {
            spinner.println(format!(
                "{} [{}/{}] {}",
                style("\u{2713}").green(),
                step.position(),
                total,
                message
            ));
        }
        ProgressEvent::StepSkipped { step, message } => {
            spinner.println(format!(
                "- [{}/{}] {}",
                step.position(),
                total,
                message
            ));
        }
        ProgressEvent::StepFailed { step, message } => {
            spinner.println(format!(
                "{} [{}/{}] {}",
                style("\u{2717}").red(),
                step.position(),
                total,
                message
            ));
        }
        ProgressEvent::Log { message } => {
            spinner.println(format!("  {message}"));
        }
        ProgressEvent::Warning { message } => {
            spinner.println(format!("  {} {message}", style("警告:").yellow()));
        }
        ProgressEvent::Finished { .. } => {}
    });

    spinner.finish_and_clear();
    print_summary(&response);

    if response.success {
        Ok(())
    } else {
        anyhow::bail!(response.message)
    }
}

/// 実行結果のサマリを表示する。
fn print_summary(response: &SetupResponse) {
    println!();
    if response.success {
        println!("{} {}", style("\u{2713}").green().bold(), response.message);
    } else {
        println!("{} {}", style("\u{2717}").red().bold(), response.message);
    }

    if !response.result.created_files.is_empty() {
        println!(
            "\n作成・変更したファイル: {} 件",
            response.result.created_files.len()
        );
        for file in &response.result.created_files {
            println!("  {}", style(file).dim());
        }
    }

    if !response.result.next_steps.is_empty() {
        println!("\n残作業 (TODO.md にも出力済み):");
        for note in &response.result.next_steps {
            println!("  - {note}");
        }
    }

    if !response.result.errors.is_empty() {
        println!("\nエラー:");
        for error in &response.result.errors {
            println!("  {}", style(error).red());
        }
    }
}

mod android;
mod create;
mod deps;
mod features;
mod firebase;
mod icons;
mod ios;
mod pubspec;
mod todo;
pub mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::config::CliConfig;
use crate::progress::{ProgressEvent, SetupStepId, StepStatus};

/// 1 ステップの出力。
#[derive(Debug, Default)]
struct StepOutput {
    /// 作成・変更したファイル
    files: Vec<PathBuf>,
    /// TODO.md に集約する残作業メモ
    notes: Vec<String>,
}

/// 外部コマンドを 1 回実行する (リトライなし)。
///
/// # Errors
/// コマンドの起動に失敗した場合、または非ゼロ終了した場合。
fn run_tool(bin: &str, args: &[&str], cwd: &Path) -> Result<()> {
    let output = Command::new(bin)
        .args(args)
        .current_dir(cwd)
        .output()
        .with_context(|| format!("コマンド '{bin}' の起動に失敗しました"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "コマンド '{} {}' が失敗しました (exit code: {}): {}",
            bin,
            args.join(" "),
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }
    Ok(())
}

/// セットアップを実行する (進捗通知なし)。
pub fn execute_setup(config: &SetupConfig, cli: &CliConfig) -> SetupResponse {
    execute_setup_with_progress(config, cli, |_| {})
}

/// プログレスコールバック付きでセットアップを実行する。
///
/// エラーは応答オブジェクトに畳み込まれるため、この関数自体は失敗しない。
/// HTTP 応答相当の `{ success, message, result }` を返す。
pub fn execute_setup_with_progress(
    config: &SetupConfig,
    cli: &CliConfig,
    on_progress: impl Fn(ProgressEvent),
) -> SetupResponse {
    let mut result = SetupResult::new();

    let ncfg = match config.normalized(cli) {
        Ok(ncfg) => ncfg,
        Err(message) => {
            result.errors.push(message.clone());
            on_progress(ProgressEvent::Finished {
                success: false,
                message: message.clone(),
            });
            return SetupResponse {
                success: false,
                message,
                result,
            };
        }
    };

    match run_pipeline(&ncfg, cli, &mut result, &on_progress) {
        Ok(()) => {
            let message = format!("{} のセットアップが完了しました。", ncfg.app_name);
            on_progress(ProgressEvent::Finished {
                success: true,
                message: message.clone(),
            });
            SetupResponse {
                success: true,
                message,
                result,
            }
        }
        Err(e) => {
            let message = format!("セットアップに失敗しました: {e:#}");
            on_progress(ProgressEvent::Finished {
                success: false,
                message: message.clone(),
            });
            SetupResponse {
                success: false,
                message,
                result,
            }
        }
    }
}

/// 固定順のパイプラインを実行する。
///
/// 各ステップは前のステップの完了を待って順に走る。エラーは記録して
/// 中断するが、アイコン生成と TODO 生成だけは警告に降格して続行する。
fn run_pipeline(
    ncfg: &NormalizedConfig,
    cli: &CliConfig,
    result: &mut SetupResult,
    on_progress: &impl Fn(ProgressEvent),
) -> Result<()> {
    let has_flavors = !ncfg.firebase.flavors.is_empty();

    run_fatal_step(SetupStepId::CreateProject, result, on_progress, || {
        create::create_project(ncfg, cli)
    })?;

    if ncfg.features.is_empty() {
        skip_step(
            SetupStepId::ApplyFeatures,
            result,
            on_progress,
            "フィーチャが選択されていません",
        );
    } else {
        run_fatal_step(SetupStepId::ApplyFeatures, result, on_progress, || {
            features::apply_features(ncfg, cli)
        })?;
    }

    run_fatal_step(SetupStepId::UpdatePubspec, result, on_progress, || {
        pubspec::update_pubspec(ncfg)
    })?;

    if ncfg.firebase.enabled {
        run_fatal_step(SetupStepId::ConfigureFirebase, result, on_progress, || {
            firebase::configure_firebase(ncfg, cli)
        })?;
    } else {
        skip_step(
            SetupStepId::ConfigureFirebase,
            result,
            on_progress,
            "Firebase 連携が無効です",
        );
    }

    if ncfg.has_platform(Platform::Ios) && has_flavors {
        run_fatal_step(SetupStepId::CreateIosConfigs, result, on_progress, || {
            ios::create_ios_configs(ncfg)
        })?;
    } else {
        skip_step(
            SetupStepId::CreateIosConfigs,
            result,
            on_progress,
            "iOS フレーバー設定は不要です",
        );
    }

    if ncfg.has_platform(Platform::Android) && has_flavors {
        run_fatal_step(SetupStepId::CreateAndroidConfigs, result, on_progress, || {
            android::create_android_configs(ncfg)
        })?;
    } else {
        skip_step(
            SetupStepId::CreateAndroidConfigs,
            result,
            on_progress,
            "Android フレーバー設定は不要です",
        );
    }

    if ncfg.icons.enabled {
        run_graceful_step(SetupStepId::GenerateIcons, result, on_progress, || {
            icons::generate_icons(ncfg, cli)
        });
    } else {
        skip_step(
            SetupStepId::GenerateIcons,
            result,
            on_progress,
            "アイコン生成が無効です",
        );
    }

    let notes = result.next_steps.clone();
    run_graceful_step(SetupStepId::GenerateTodo, result, on_progress, || {
        todo::generate_todo(ncfg, &notes)
    });

    run_fatal_step(SetupStepId::FetchDependencies, result, on_progress, || {
        deps::fetch_dependencies(ncfg, cli)
    })?;

    Ok(())
}

/// 失敗したらパイプラインを中断するステップを実行する。
fn run_fatal_step(
    id: SetupStepId,
    result: &mut SetupResult,
    on_progress: &impl Fn(ProgressEvent),
    step: impl FnOnce() -> Result<StepOutput>,
) -> Result<()> {
    on_progress(ProgressEvent::StepStarted {
        step: id,
        message: id.label().to_string(),
    });
    match step() {
        Ok(output) => {
            record_success(id, result, output);
            on_progress(ProgressEvent::StepCompleted {
                step: id,
                message: format!("{} が完了しました", id.label()),
            });
            Ok(())
        }
        Err(e) => {
            let message = format!("{}: {e:#}", id.label());
            result.errors.push(message.clone());
            result.steps.push(StepOutcome {
                id,
                status: StepStatus::Failed,
                detail: Some(message.clone()),
            });
            on_progress(ProgressEvent::StepFailed { step: id, message });
            Err(e)
        }
    }
}

/// 失敗しても警告として続行するステップを実行する。
fn run_graceful_step(
    id: SetupStepId,
    result: &mut SetupResult,
    on_progress: &impl Fn(ProgressEvent),
    step: impl FnOnce() -> Result<StepOutput>,
) {
    on_progress(ProgressEvent::StepStarted {
        step: id,
        message: id.label().to_string(),
    });
    match step() {
        Ok(output) => {
            record_success(id, result, output);
            on_progress(ProgressEvent::StepCompleted {
                step: id,
                message: format!("{} が完了しました", id.label()),
            });
        }
        Err(e) => {
            let message = format!("{}: {e:#}", id.label());
            result.errors.push(message.clone());
            result.steps.push(StepOutcome {
                id,
                status: StepStatus::Failed,
                detail: Some(message.clone()),
            });
            on_progress(ProgressEvent::StepFailed {
                step: id,
                message: message.clone(),
            });
            on_progress(ProgressEvent::Warning {
                message: format!("{message} (このステップは省略して続行します)"),
            });
        }
    }
}

/// ステップをスキップとして記録する。
fn skip_step(
    id: SetupStepId,
    result: &mut SetupResult,
    on_progress: &impl Fn(ProgressEvent),
    reason: &str,
) {
    result.steps.push(StepOutcome {
        id,
        status: StepStatus::Skipped,
        detail: Some(reason.to_string()),
    });
    on_progress(ProgressEvent::StepSkipped {
        step: id,
        message: reason.to_string(),
    });
}

fn record_success(id: SetupStepId, result: &mut SetupResult, output: StepOutput) {
    result.record_files(&output.files);
    result.next_steps.extend(output.notes);
    result.steps.push(StepOutcome {
        id,
        status: StepStatus::Succeeded,
        detail: None,
    });
}

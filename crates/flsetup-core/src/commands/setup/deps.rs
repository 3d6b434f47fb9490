use anyhow::Result;

use super::types::NormalizedConfig;
use super::StepOutput;
use crate::config::CliConfig;
use crate::retry::{run_with_retry, RetryConfig};

/// `flutter pub get` で依存関係を取得する。
///
/// ネットワーク依存のためリトライ付きで実行する。
pub(super) fn fetch_dependencies(
    ncfg: &NormalizedConfig,
    cli: &CliConfig,
) -> Result<StepOutput> {
    run_with_retry(
        &cli.flutter_bin,
        &["pub", "get"],
        &ncfg.output_dir,
        &RetryConfig::default(),
    )
    .map_err(anyhow::Error::msg)?;

    Ok(StepOutput::default())
}

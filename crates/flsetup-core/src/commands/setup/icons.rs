use std::fs;

use anyhow::{Context, Result};

use super::types::NormalizedConfig;
use super::{run_tool, StepOutput};
use crate::config::CliConfig;

/// flutter_launcher_icons でランチャーアイコンを生成する。
///
/// 失敗してもパイプラインは継続する (呼び出し側で警告に降格される)。
pub(super) fn generate_icons(ncfg: &NormalizedConfig, cli: &CliConfig) -> Result<StepOutput> {
    let image_path = ncfg
        .icons
        .image_path
        .as_deref()
        .context("アイコン画像パスが未設定です")?;

    let config_path = ncfg.output_dir.join("flutter_launcher_icons.yaml");
    fs::write(&config_path, icons_config_source(ncfg, image_path))
        .with_context(|| format!("アイコン設定の書き込みに失敗: {}", config_path.display()))?;

    let files = vec![config_path];
    let mut notes = Vec::new();

    if ncfg.output_dir.join(image_path).exists() {
        run_tool(
            &cli.dart_bin,
            &["run", "flutter_launcher_icons"],
            &ncfg.output_dir,
        )?;
    } else {
        // 画像が未配置ならコマンドは実行せず残作業に回す
        notes.push(format!(
            "アイコン画像を {image_path} に配置して `dart run flutter_launcher_icons` を実行してください。"
        ));
    }

    Ok(StepOutput { files, notes })
}

/// flutter_launcher_icons の設定ファイル内容。
fn icons_config_source(ncfg: &NormalizedConfig, image_path: &str) -> String {
    let android = ncfg.has_platform(super::types::Platform::Android);
    let ios = ncfg.has_platform(super::types::Platform::Ios);
    format!(
        "flutter_launcher_icons:\n\
         \x20 android: {android}\n\
         \x20 ios: {ios}\n\
         \x20 image_path: \"{image_path}\"\n\
         \x20 remove_alpha_ios: true\n"
    )
}

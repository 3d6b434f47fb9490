use anyhow::Result;
use console::style;

use flsetup_core::commands::doctor::{check_environment, platform_info, ToolStatus};
use flsetup_core::CliConfig;

/// 環境チェックを実行して結果を表示する。
///
/// # Errors
///
/// 表示処理自体は失敗しない。ツールが見つからなくてもエラーにはしない。
pub fn run(config: &CliConfig) -> Result<()> {
    println!("\n--- 環境チェック ---\n");

    let info = platform_info(config);
    println!(
        "ホスト: {} ({})",
        style(&info.os).bold(),
        style(&info.arch).dim()
    );
    for tool in &info.tools {
        match &tool.path {
            Some(path) => println!("  {}: {}", tool.name, style(path.display()).dim()),
            None => println!("  {}: {}", tool.name, style("PATH に見つかりません").yellow()),
        }
    }
    println!();

    let status = check_environment(config);
    print_tool_status(&status.flutter);
    print_tool_status(&status.firebase);
    print_tool_status(&status.flutterfire);
    println!();

    if !status.flutter_ready() {
        println!(
            "{}",
            style("flutter が見つかりません。セットアップは実行できません。").red()
        );
    } else if !status.firebase_ready() {
        println!(
            "{}",
            style("Firebase 連携には firebase CLI と flutterfire CLI が必要です。").yellow()
        );
    } else {
        println!("{}", style("すべてのツールが利用可能です。").green());
    }

    Ok(())
}

fn print_tool_status(status: &ToolStatus) {
    if status.installed {
        let version = status.version.as_deref().unwrap_or("不明");
        println!(
            "{} {} ({})",
            style("\u{2713}").green(),
            status.tool.as_str(),
            version
        );
    } else {
        let detail = status.error.as_deref().unwrap_or("未インストール");
        println!(
            "{} {} - {}",
            style("\u{2717}").red(),
            status.tool.as_str(),
            style(detail).dim()
        );
    }
}

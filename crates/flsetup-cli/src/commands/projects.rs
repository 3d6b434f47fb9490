use anyhow::Result;
use console::style;

use flsetup_core::commands::firebase::list_projects;
use flsetup_core::CliConfig;

/// Firebase プロジェクト一覧を表示する。
///
/// # Errors
///
/// firebase CLI の実行または応答のパースに失敗した場合。
pub fn run(config: &CliConfig) -> Result<()> {
    println!("\n--- Firebase プロジェクト一覧 ---\n");

    let projects = list_projects(config)?;
    if projects.is_empty() {
        println!("プロジェクトが見つかりません。firebase login を確認してください。");
        return Ok(());
    }

    for project in &projects {
        let display_name = project.display_name.as_deref().unwrap_or("-");
        println!(
            "  {}  {}",
            style(&project.project_id).bold(),
            style(display_name).dim()
        );
    }
    println!("\n{} 件", projects.len());

    Ok(())
}

mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};

use flsetup_core::CliConfig;

#[derive(Parser)]
#[command(
    name = "flsetup",
    version,
    about = "Flutter アプリのセットアップツール (Firebase 連携対応)"
)]
struct Cli {
    /// 設定ファイルのパス
    #[arg(long, global = true, default_value = "flsetup.yaml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 新規 Flutter アプリをセットアップする
    Setup(commands::setup::SetupArgs),
    /// 外部ツール (flutter / firebase / flutterfire) の状態を確認する
    Doctor,
    /// ログイン済みアカウントの Firebase プロジェクト一覧を表示する
    Projects,
}

fn main() {
    // Ctrl+C でパニックせずに終了するためのハンドラ
    ctrlc_handler();

    let cli = Cli::parse();

    let config = match flsetup_core::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定ファイルの読み込みに失敗しました: {e}");
            eprintln!("デフォルト設定を使用します。");
            CliConfig::default()
        }
    };

    let result = match cli.command {
        Some(Commands::Setup(args)) => commands::setup::run_with_args(&args, &config),
        Some(Commands::Doctor) => commands::doctor::run(&config),
        Some(Commands::Projects) => commands::projects::run(&config),
        None => run_menu(&config),
    };

    if let Err(e) = result {
        eprintln!("エラー: {e:#}");
        std::process::exit(1);
    }
}

/// Ctrl+C のグローバルハンドラを設定する。
/// dialoguer が Ctrl+C を処理するため、ここでは最低限のフォールバックのみ。
fn ctrlc_handler() {
    let _ = ctrlc::set_handler(|| {
        // dialoguer の interact_opt が None を返すので、
        // ここでは何もしない（二重終了を防ぐ）。
    });
}

/// メインメニューの選択肢
const MENU_ITEMS: &[&str] = &[
    "新規アプリのセットアップ",
    "環境チェック",
    "Firebase プロジェクト一覧",
    "終了",
];

/// サブコマンド未指定時の対話メニュー。
fn run_menu(config: &CliConfig) -> Result<()> {
    loop {
        let selection = prompt::select_prompt("操作を選択してください", MENU_ITEMS)?;
        match selection {
            // Ctrl+C / Esc → 終了
            None | Some(3) => {
                println!("終了します。");
                return Ok(());
            }
            Some(0) => {
                if let Err(e) = commands::setup::run_interactive(config) {
                    eprintln!("セットアップエラー: {e:#}");
                }
            }
            Some(1) => {
                if let Err(e) = commands::doctor::run(config) {
                    eprintln!("環境チェックエラー: {e:#}");
                }
            }
            Some(2) => {
                if let Err(e) = commands::projects::run(config) {
                    eprintln!("プロジェクト一覧エラー: {e:#}");
                }
            }
            Some(_) => unreachable!(),
        }
    }
}

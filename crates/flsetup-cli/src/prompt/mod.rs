use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};

/// 対話式プロンプトのテーマを取得する。
pub fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// 選択プロンプト。Ctrl+C / Esc で None を返す。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合にエラーを返す。
pub fn select_prompt(prompt: &str, items: &[&str]) -> anyhow::Result<Option<usize>> {
    let selection = Select::with_theme(&theme())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()?;
    Ok(selection)
}

/// 複数選択プロンプト。Ctrl+C / Esc で None を返す。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合にエラーを返す。
pub fn multi_select_prompt(prompt: &str, items: &[&str]) -> anyhow::Result<Option<Vec<usize>>> {
    let selection = MultiSelect::with_theme(&theme())
        .with_prompt(prompt)
        .items(items)
        .interact_opt()?;
    Ok(selection)
}

/// テキスト入力プロンプト（バリデーション付き）。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合にエラーを返す。
pub fn input_prompt(
    prompt: &str,
    validator: fn(&str) -> Result<(), String>,
) -> anyhow::Result<String> {
    let value: String = Input::with_theme(&theme())
        .with_prompt(prompt)
        .validate_with(|input: &String| validator(input))
        .interact_text()?;
    Ok(value)
}

/// デフォルト値付きテキスト入力プロンプト（バリデーション付き）。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合にエラーを返す。
pub fn input_prompt_with_default(
    prompt: &str,
    default: &str,
    validator: fn(&str) -> Result<(), String>,
) -> anyhow::Result<String> {
    let value: String = Input::with_theme(&theme())
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(|input: &String| validator(input))
        .interact_text()?;
    Ok(value)
}

/// Yes/No プロンプト。Ctrl+C / Esc で None を返す。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合にエラーを返す。
pub fn yes_no_prompt(prompt: &str) -> anyhow::Result<Option<bool>> {
    let answer = Confirm::with_theme(&theme())
        .with_prompt(prompt)
        .default(false)
        .interact_opt()?;
    Ok(answer)
}

/// 確認プロンプトの結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    Yes,
    GoBack,
    Cancel,
}

/// 最終確認プロンプト。
///
/// # Errors
///
/// プロンプトの入出力に失敗した場合にエラーを返す。
pub fn confirm_prompt() -> anyhow::Result<ConfirmResult> {
    let items = &["実行する", "修正する", "キャンセル"];
    let selection = Select::with_theme(&theme())
        .with_prompt("この内容でセットアップしますか？")
        .items(items)
        .default(0)
        .interact_opt()?;
    Ok(match selection {
        Some(0) => ConfirmResult::Yes,
        Some(1) => ConfirmResult::GoBack,
        _ => ConfirmResult::Cancel,
    })
}

use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

// ============================================================================
// リトライ設定
// ============================================================================

/// リトライ設定。
pub struct RetryConfig {
    /// 最大リトライ回数
    pub max_retries: u32,
    /// 初回遅延（ミリ秒）
    pub initial_delay_ms: u64,
    /// バックオフ倍率
    pub backoff_multiplier: u64,
    /// 最大遅延（ミリ秒）
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2,
            max_delay_ms: 10000,
        }
    }
}

// ============================================================================
// リトライ判定
// ============================================================================

/// コマンド名 + 引数の組み合わせでリトライ対象かどうかを判定する。
///
/// ネットワーク依存のコマンドのみリトライ対象とする:
/// - flutter pub get -> リトライ対象
/// - flutter create -> 非対象
/// - dart pub get -> リトライ対象
/// - dart run flutter_launcher_icons -> 非対象
/// - flutterfire configure -> リトライ対象
/// - firebase projects:list -> 非対象 (認証エラーをリトライしても無駄)
pub fn is_retryable_command(cmd: &str, args: &[&str]) -> bool {
    let bin = Path::new(cmd)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(cmd);
    match bin {
        "flutter" | "dart" => args.first().is_some_and(|&a| a == "pub"),
        "flutterfire" => args.first().is_some_and(|&a| a == "configure"),
        _ => false,
    }
}

// ============================================================================
// 遅延計算
// ============================================================================

/// 指数バックオフの遅延時間を計算する（ミリ秒）。
///
/// delay = `initial_delay_ms` * (`backoff_multiplier` ^ attempt)
/// ただし `max_delay_ms` を超えない。
pub fn calculate_delay(config: &RetryConfig, attempt: u32) -> u64 {
    let multiplier = config.backoff_multiplier.saturating_pow(attempt);
    let delay = config.initial_delay_ms.saturating_mul(multiplier);
    delay.min(config.max_delay_ms)
}

// ============================================================================
// リトライ付きコマンド実行
// ============================================================================

/// コマンドをリトライ付きで実行する。
///
/// リトライ対象のコマンドが失敗した場合、指数バックオフで最大
/// `max_retries` 回リトライする。リトライ非対象のコマンドは 1 回だけ実行する。
///
/// # Errors
///
/// 全リトライ回数を超えても失敗した場合、またはコマンドが見つからない
/// 場合にエラー文字列を返す。
pub fn run_with_retry(
    cmd: &str,
    args: &[&str],
    working_dir: &Path,
    config: &RetryConfig,
) -> Result<(), String> {
    let retryable = is_retryable_command(cmd, args);
    let max_attempts = if retryable { config.max_retries } else { 1 };

    for attempt in 0..max_attempts {
        match Command::new(cmd)
            .args(args)
            .current_dir(working_dir)
            .output()
        {
            Ok(output) => {
                if output.status.success() {
                    return Ok(());
                }
                let stderr = String::from_utf8_lossy(&output.stderr);
                if attempt + 1 < max_attempts {
                    let delay = calculate_delay(config, attempt);
                    eprintln!(
                        "コマンド '{} {}' が失敗しました（{}/{} 回目）: {}",
                        cmd,
                        args.join(" "),
                        attempt + 1,
                        max_attempts,
                        stderr.trim()
                    );
                    eprintln!("{delay}ms 後にリトライします...");
                    thread::sleep(Duration::from_millis(delay));
                } else {
                    return Err(format!(
                        "コマンド '{} {}' が失敗しました (exit code: {}): {}",
                        cmd,
                        args.join(" "),
                        output.status.code().unwrap_or(-1),
                        stderr.trim()
                    ));
                }
            }
            Err(e) => {
                // コマンド不在はリトライしても回復しない
                return Err(format!(
                    "コマンド '{}' の実行に失敗しました: {}",
                    cmd, e
                ));
            }
        }
    }

    Err(format!(
        "コマンド '{} {}' の実行に失敗しました",
        cmd,
        args.join(" ")
    ))
}

// ============================================================================
// テスト
// ============================================================================

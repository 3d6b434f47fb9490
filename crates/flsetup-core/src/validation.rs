use once_cell::sync::Lazy;
use regex::Regex;

/// Dart パッケージ名の形式: `[a-z][a-z0-9_]*`
static PROJECT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// 逆ドメイン形式の組織識別子: `com.example` など 2 セグメント以上
static ORG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)+$").unwrap());

/// iOS Bundle ID: 英数字・ハイフン・ピリオドのみ
static BUNDLE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").unwrap());

/// フィーチャ ID: `[a-z][a-z0-9_]*`
static FEATURE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// アプリ表示名バリデーション: 空文字と制御文字を禁止。
///
/// # Errors
/// 名前が無効な場合。
pub fn validate_app_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("アプリ名を入力してください。".into());
    }
    if name.chars().any(char::is_control) {
        return Err("アプリ名に制御文字は使用できません。".into());
    }
    Ok(())
}

/// プロジェクト名バリデーション: Dart パッケージ名規則に準拠。
///
/// # Errors
/// 名前が無効な場合。
pub fn validate_project_name(name: &str) -> Result<(), String> {
    if !PROJECT_NAME_RE.is_match(name) {
        return Err(
            "英小文字・数字・アンダースコアのみ許可。先頭は英小文字。".into(),
        );
    }
    Ok(())
}

/// 組織識別子バリデーション: 逆ドメイン形式 (com.example)。
///
/// # Errors
/// 識別子が無効な場合。
pub fn validate_org(org: &str) -> Result<(), String> {
    if !ORG_RE.is_match(org) {
        return Err("逆ドメイン形式で入力してください (例: com.example)。".into());
    }
    Ok(())
}

/// iOS Bundle ID バリデーション。
///
/// アンダースコアは Xcode で警告になるため許可しない。
///
/// # Errors
/// Bundle ID が無効な場合。
pub fn validate_bundle_id(bundle_id: &str) -> Result<(), String> {
    if !BUNDLE_ID_RE.is_match(bundle_id) {
        return Err(
            "英数字・ハイフン・ピリオドのみ許可 (例: com.example.my-app)。".into(),
        );
    }
    Ok(())
}

/// Android アプリケーション ID バリデーション: Java パッケージ名規則。
///
/// ハイフンは Java 識別子として無効のため許可しない。
///
/// # Errors
/// アプリケーション ID が無効な場合。
pub fn validate_android_package(package: &str) -> Result<(), String> {
    if !ORG_RE.is_match(package) {
        return Err(
            "Java パッケージ名形式で入力してください (例: com.example.my_app)。".into(),
        );
    }
    Ok(())
}

/// フィーチャ ID バリデーション。
///
/// # Errors
/// ID が無効な場合。
pub fn validate_feature_id(id: &str) -> Result<(), String> {
    if !FEATURE_ID_RE.is_match(id) {
        return Err("フィーチャ ID は英小文字・数字・アンダースコアのみ。".into());
    }
    Ok(())
}

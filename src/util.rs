use chrono::{Local, TimeZone};

/// APIキーやcontinuationトークンをマスキングしてログ出力用の文字列を生成
///
/// 最初の4文字と最後の4文字のみを表示し、中間を***でマスキング
///
/// # Examples
/// ```
/// use chat_recorder_lib::util::mask_secret;
/// let masked = mask_secret("AIzaSyABC123def456GHI789");
/// assert_eq!(masked, "AIza***I789");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        // 短い値は全体をマスク
        return "***".to_string();
    }

    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", prefix, suffix)
}

/// エポックミリ秒をプロセスのローカルタイムゾーンで "YYYY-MM-DD HH:MM:SS" に整形
///
/// 表現できない値の場合は空文字列
pub fn format_local_timestamp(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// ローカルタイムゾーンのUTCオフセット（分）
pub fn utc_offset_minutes() -> i32 {
    Local::now().offset().local_minus_utc() / 60
}

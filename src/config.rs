// =============================================================================
// 共通設定・定数モジュール
// =============================================================================
// レコーダー全体で使用する共通の設定値・定数を定義
// =============================================================================

use std::time::Duration;

/// HTTPリクエストのデフォルトタイムアウト（秒）
///
/// watchページ取得・get_live_chat など外部へのリクエストで使用。
/// ネットワークが詰まってもポーリングループが無期限に止まらないようにする。
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// YouTubeのベースURL（テストではモックサーバーに差し替える）
pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// ポーリング間隔の下限（ミリ秒）
pub const MIN_POLL_INTERVAL_MS: u64 = 500;

/// timeoutMsが返されなかった場合のポーリング間隔（ミリ秒）
pub const DEFAULT_CONTINUATION_TIMEOUT_MS: u64 = 2000;

/// 取得エラー後の再試行までの待機時間（秒）
pub const ERROR_RETRY_DELAY_SECS: u64 = 5;

/// コメントDBのファイル名
pub const STORE_FILE_NAME: &str = "comments.db";

/// recent() のデフォルト件数
pub const DEFAULT_RECENT_LIMIT: i64 = 50;

/// recent() の最大件数
pub const MAX_RECENT_LIMIT: i64 = 500;

/// viewコマンドのデフォルト表示件数
pub const DEFAULT_VIEW_LIMIT: i64 = 20;

/// 保存先ディレクトリを指定する環境変数
pub const STORE_DIR_ENV: &str = "CHAT_RECORDER_STORE_DIR";

/// HTTPリクエストのデフォルトタイムアウト（Duration）
///
/// HTTPクライアント構築時に直接使用可能
pub fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// ポーリングループの設定
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// YouTubeのベースURL
    pub base_url: String,
    /// サーバー推奨間隔に対する下限
    pub min_interval: Duration,
    /// 取得失敗時の待機時間
    pub error_retry_delay: Duration,
    /// Top chatからAll chatへ切り替えるか
    pub switch_to_all_chat: bool,
    /// 保存したコメントをコンソールにも出力するか
    pub echo_console: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: YOUTUBE_BASE_URL.to_string(),
            min_interval: Duration::from_millis(MIN_POLL_INTERVAL_MS),
            error_retry_delay: Duration::from_secs(ERROR_RETRY_DELAY_SECS),
            switch_to_all_chat: true,
            echo_console: false,
        }
    }
}

impl PollerConfig {
    /// サーバー推奨値に下限を適用した待機時間
    pub fn poll_interval(&self, recommended_ms: u64) -> Duration {
        Duration::from_millis(recommended_ms).max(self.min_interval)
    }
}

use serde::{Deserialize, Serialize};

use crate::util::mask_secret;

/// ポーリング状態を管理する構造体
///
/// ブートストラップで作られ、ポーリングの度にcontinuationが差し替わる
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    /// INNERTUBE_API_KEY
    pub api_key: String,
    /// InnerTubeクライアントバージョン
    pub client_version: String,
    /// 現在のcontinuationトークン（次回リクエスト用）
    pub continuation: String,
    /// 配信の動画ID
    pub video_id: String,
    /// 成功したポーリング回数
    pub poll_count: u64,
}

impl PollState {
    /// 新しいポーリング状態を作成
    pub fn new(
        api_key: String,
        client_version: String,
        continuation: String,
        video_id: String,
    ) -> Self {
        Self {
            api_key,
            client_version,
            continuation,
            video_id,
            poll_count: 0,
        }
    }

    /// 状態を更新（1回のポーリングが保存まで成功した後に呼び出す）
    pub fn advance(&mut self, next_continuation: String) {
        self.continuation = next_continuation;
        self.poll_count += 1;
    }
}

// トークン類はログに生で出さない
impl std::fmt::Debug for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollState")
            .field("api_key", &mask_secret(&self.api_key))
            .field("client_version", &self.client_version)
            .field("continuation", &mask_secret(&self.continuation))
            .field("video_id", &self.video_id)
            .field("poll_count", &self.poll_count)
            .finish()
    }
}

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{
    bootstrap::bootstrap,
    errors::YouTubeError,
    innertube::{fetch_live_chat, parse_chat_response, ChatTransport, InnerTubeChatResponse},
    state::PollState,
    types::ChatEvent,
};
use crate::config::PollerConfig;

/// 正規化済みコメントの保存先
///
/// 保存失敗は実装側でログに残して握りつぶす（ポーリングは止めない）
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn save(&self, event: &ChatEvent);
}

/// 1回の実行の結果
#[derive(Debug, Clone)]
pub struct PollSession {
    /// 停止時点のポーリング状態（最後に成功したcontinuationを保持）
    pub state: PollState,
    /// 保存したコメント数（重複を含む）
    pub events_saved: u64,
    /// 失敗したポーリング回数
    pub failures: u64,
}

impl PollSession {
    fn new(state: PollState) -> Self {
        Self {
            state,
            events_saved: 0,
            failures: 0,
        }
    }

    /// 成功したポーリング回数
    pub fn polls(&self) -> u64 {
        self.state.poll_count
    }
}

/// 実行中フラグを解放するガード
///
/// run() がどの経路で終わってもフラグを戻す
struct RunningGuard {
    is_running: Arc<AtomicBool>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
    }
}

/// ライブチャットポーリングマネージャー
pub struct ChatPoller {
    is_running: Arc<AtomicBool>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl ChatPoller {
    /// 新しいポーラーを作成
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// ポーリング中かどうかを確認
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// ポーリングを停止
    ///
    /// 取得中・待機中のどちらでも即座にループを抜ける
    pub fn stop(&self) {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cancel.cancel();
    }

    /// 実行権を取得し、この実行用の停止トークンを用意する
    ///
    /// 返り値の [`PollRun`] を実行するまでの間に呼ばれた stop() もその実行に効く
    pub fn start(&self) -> Result<PollRun, YouTubeError> {
        let mut cancel = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // 既に実行中の場合はエラー
        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(YouTubeError::PollerAlreadyRunning);
        }

        *cancel = CancellationToken::new();
        Ok(PollRun {
            _guard: RunningGuard {
                is_running: Arc::clone(&self.is_running),
            },
            cancel: cancel.clone(),
        })
    }

    /// 実行権を取得してからブートストラップ・ポーリングを実行
    ///
    /// # Errors
    /// 同時実行・ブートストラップ失敗の場合にエラーを返す
    pub async fn run<T, S>(
        &self,
        transport: &T,
        sink: &S,
        input: &str,
        config: &PollerConfig,
    ) -> Result<PollSession, YouTubeError>
    where
        T: ChatTransport + ?Sized,
        S: ChatSink + ?Sized,
    {
        self.start()?.run(transport, sink, input, config).await
    }
}

/// 実行権を取得済みの1回の実行
///
/// drop時に実行中フラグを解放する
pub struct PollRun {
    _guard: RunningGuard,
    cancel: CancellationToken,
}

impl PollRun {
    /// ブートストラップからポーリング終了までを実行
    ///
    /// # 引数
    /// - `input`: 動画ID / @ハンドル / チャンネルID / URL
    ///
    /// # Errors
    /// ブートストラップ失敗の場合にエラーを返す。
    /// ポーリング中の失敗は待機後に同じcontinuationで再試行する。
    pub async fn run<T, S>(
        self,
        transport: &T,
        sink: &S,
        input: &str,
        config: &PollerConfig,
    ) -> Result<PollSession, YouTubeError>
    where
        T: ChatTransport + ?Sized,
        S: ChatSink + ?Sized,
    {
        log::info!("Bootstrapping live chat for {}", input);
        let state = bootstrap(transport, &config.base_url, input, config.switch_to_all_chat).await?;
        log::info!("Polling started: {:?}", state);

        let session = Self::polling_loop(transport, sink, state, config, &self.cancel).await;

        log::info!(
            "Polling loop ended: polls={}, saved={}, failures={}",
            session.polls(),
            session.events_saved,
            session.failures
        );
        Ok(session)
    }

    /// ポーリングループ（内部実装）
    async fn polling_loop<T, S>(
        transport: &T,
        sink: &S,
        state: PollState,
        config: &PollerConfig,
        cancel: &CancellationToken,
    ) -> PollSession
    where
        T: ChatTransport + ?Sized,
        S: ChatSink + ?Sized,
    {
        let mut session = PollSession::new(state);

        while !cancel.is_cancelled() {
            // コメントを取得（停止要求で中断）
            let response = tokio::select! {
                _ = cancel.cancelled() => break,
                result = fetch_live_chat(transport, &config.base_url, &session.state) => result,
            };

            let delay = match response {
                Ok(response) => Self::handle_response(&response, sink, &mut session, config).await,
                Err(e) => Err(e),
            };

            let delay = match delay {
                Ok(delay) => delay,
                Err(e) => {
                    // 失敗時は保持しているcontinuationのまま再試行
                    session.failures += 1;
                    log::warn!(
                        "Polling error, retrying in {:?}: {}",
                        config.error_retry_delay,
                        e
                    );
                    config.error_retry_delay
                }
            };

            if !sleep_or_cancel(delay, cancel).await {
                break;
            }
        }

        session
    }

    /// 1回分のレスポンスを処理し、次回までの待機時間を返す
    ///
    /// 保存まで終わってからcontinuationを進める
    async fn handle_response<S: ChatSink + ?Sized>(
        response: &InnerTubeChatResponse,
        sink: &S,
        session: &mut PollSession,
        config: &PollerConfig,
    ) -> Result<Duration, YouTubeError> {
        let next = response.next_continuation()?;
        let events = parse_chat_response(response.live_chat()?, &session.state.video_id);

        for event in &events {
            sink.save(event).await;
            if config.echo_console {
                println!("{}", event.preview_line());
            }
        }

        if !events.is_empty() {
            log::debug!("Saved {} chat events", events.len());
        }
        session.events_saved += events.len() as u64;
        session.state.advance(next.token);

        Ok(config.poll_interval(next.timeout_ms))
    }
}

impl Default for ChatPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ChatPoller {
    fn clone(&self) -> Self {
        Self {
            is_running: Arc::clone(&self.is_running),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

/// 停止可能な待機
///
/// 待機を完了した場合はtrue、停止要求で中断した場合はfalse
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

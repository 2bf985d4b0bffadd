use std::path::PathBuf;

use crate::config::{PollerConfig, YOUTUBE_BASE_URL};
use crate::youtube::{
    db::ChatStore,
    errors::YouTubeError,
    innertube::InnerTubeClient,
    poller::{ChatPoller, PollSession},
};

/// recordコマンドの引数
#[derive(Debug, Clone)]
pub struct RecordOptions {
    /// 動画ID / @ハンドル / チャンネルID / URL
    pub input: String,
    /// comments.db を置くディレクトリ（Noneならカレントディレクトリ）
    pub store_dir: Option<PathBuf>,
    /// 保存したコメントをコンソールにも出力する
    pub print: bool,
    /// Top chatのまま取得する（All chatに切り替えない）
    pub top_chat: bool,
    pub base_url: String,
}

impl RecordOptions {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            store_dir: None,
            print: false,
            top_chat: false,
            base_url: YOUTUBE_BASE_URL.to_string(),
        }
    }

    fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            base_url: self.base_url.clone(),
            switch_to_all_chat: !self.top_chat,
            echo_console: self.print,
            ..PollerConfig::default()
        }
    }
}

/// ライブチャットを記録する（Ctrl+Cで停止）
pub async fn record(options: RecordOptions) -> Result<PollSession, YouTubeError> {
    let store = ChatStore::open(options.store_dir.as_deref()).await?;
    let client = InnerTubeClient::new()?;
    let poller = ChatPoller::new();
    // ハンドラ登録前に実行用の停止トークンを用意しておく
    let run = poller.start()?;

    // Ctrl+Cで停止要求を出す
    let ctrl_c = {
        let poller = poller.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Interrupted by user, stopping live chat fetcher");
                poller.stop();
            }
        })
    };

    log::info!("Start fetching live chat (Ctrl+C to stop)");
    let result = run
        .run(&client, &store, &options.input, &options.poller_config())
        .await;

    ctrl_c.abort();
    store.close().await;
    result
}

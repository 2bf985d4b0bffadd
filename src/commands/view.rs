use std::path::PathBuf;

use crate::config::DEFAULT_VIEW_LIMIT;
use crate::youtube::{db::ChatStore, errors::YouTubeError, types::ChatEvent};

/// viewコマンドの引数
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub store_dir: Option<PathBuf>,
    /// 表示件数（1〜500、範囲外は50）
    pub limit: i64,
    /// 1行表示ではなくJSONで出力する
    pub json: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            store_dir: None,
            limit: DEFAULT_VIEW_LIMIT,
            json: false,
        }
    }
}

/// 保存済みの最近のコメントを表示用の文字列にする
pub async fn view(options: ViewOptions) -> Result<String, YouTubeError> {
    let store = ChatStore::open(options.store_dir.as_deref()).await?;
    let events = store.recent(options.limit).await;
    store.close().await;
    let events = events?;

    if options.json {
        render_json(&events)
    } else {
        Ok(render_lines(&events))
    }
}

/// 1件1行（古い順）
pub fn render_lines(events: &[ChatEvent]) -> String {
    events
        .iter()
        .map(ChatEvent::preview_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 整形済みJSON（日本語はエスケープしない）
pub fn render_json(events: &[ChatEvent]) -> Result<String, YouTubeError> {
    Ok(serde_json::to_string_pretty(events)?)
}

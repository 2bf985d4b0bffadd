use sqlx::FromRow;

use crate::youtube::types::{ChatEvent, ColorSet, EventKind, MessagePart};

/// コメントログモデル（comments テーブルの1行）
///
/// 古いツールが書いた行も読めるよう、id以外はNULL許容
#[derive(Debug, Clone, FromRow)]
pub struct ChatEventRow {
    pub id: String,
    pub video_id: Option<String>,
    pub timestamp_ms: Option<i64>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub text: Option<String>,
    pub kind: Option<String>,
    pub amount: Option<i64>,
    pub amount_text: Option<String>,
    pub icon: Option<String>,
    pub parts_json: Option<String>, // JSON array
    pub colors_json: Option<String>, // JSON object or "null"
}

impl ChatEventRow {
    /// 保存用の行を作成
    pub fn from_event(event: &ChatEvent) -> Self {
        Self {
            id: event.id.clone(),
            video_id: Some(event.stream_id.clone()),
            timestamp_ms: Some(event.timestamp_ms),
            timestamp: Some(event.timestamp_display.clone()),
            author: Some(event.author.clone()),
            text: Some(event.text.clone()),
            kind: Some(event.kind.as_str().to_string()),
            amount: event.amount,
            amount_text: Some(event.amount_text.clone()),
            icon: event.icon_url.clone(),
            parts_json: serde_json::to_string(&event.parts).ok(),
            colors_json: serde_json::to_string(&event.colors).ok(),
        }
    }

    /// ChatEventに戻す
    ///
    /// 壊れたJSON列は空として扱い、未知の種別はtextとして読む
    pub fn into_event(self) -> ChatEvent {
        let kind = match self.kind.as_deref().map(str::parse::<EventKind>) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                log::warn!("Row {} has {}, reading as text", self.id, e);
                EventKind::Text
            }
            None => EventKind::Text,
        };

        let parts: Vec<MessagePart> = self
            .parts_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        let colors: Option<ColorSet> = self
            .colors_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<Option<ColorSet>>(json).ok())
            .flatten();

        ChatEvent {
            id: self.id,
            stream_id: self.video_id.unwrap_or_default(),
            timestamp_ms: self.timestamp_ms.unwrap_or_default(),
            timestamp_display: self.timestamp.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            kind,
            amount: self.amount,
            amount_text: self.amount_text.unwrap_or_default(),
            icon_url: self.icon,
            parts,
            colors,
        }
    }
}

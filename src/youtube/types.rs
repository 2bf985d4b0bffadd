use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 正規化済みのチャットイベント
///
/// コメントDBの1レコードに対応する。シリアライズ時のキー名は
/// 既存の comments.db / JSON出力と互換にしている。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub id: String,
    #[serde(rename = "video_id")]
    pub stream_id: String,
    pub timestamp_ms: i64,
    #[serde(rename = "timestamp")]
    pub timestamp_display: String,
    pub author: String,
    pub text: String,
    pub kind: EventKind,
    pub amount: Option<i64>,
    pub amount_text: String,
    #[serde(rename = "icon")]
    pub icon_url: Option<String>,
    pub parts: Vec<MessagePart>,
    pub colors: Option<ColorSet>,
}

impl ChatEvent {
    /// コンソール表示用の1行
    ///
    /// 例: `2024-01-01 12:00:00 太郎: こんにちは (paid) ¥1,000`
    pub fn preview_line(&self) -> String {
        format!(
            "{} {}: {} ({}) {}",
            self.timestamp_display, self.author, self.text, self.kind, self.amount_text
        )
        .trim()
        .to_string()
    }
}

/// イベント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Text,
    Paid,
    Sticker,
    Membership,
    GiftPurchase,
    GiftRedeem,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Text => "text",
            EventKind::Paid => "paid",
            EventKind::Sticker => "sticker",
            EventKind::Membership => "membership",
            EventKind::GiftPurchase => "gift_purchase",
            EventKind::GiftRedeem => "gift_redeem",
        }
    }

    /// カラー情報を持つ種別か（スーパーチャット・スーパーステッカーのみ）
    pub fn has_colors(&self) -> bool {
        matches!(self, EventKind::Paid | EventKind::Sticker)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(EventKind::Text),
            "paid" => Ok(EventKind::Paid),
            "sticker" => Ok(EventKind::Sticker),
            "membership" => Ok(EventKind::Membership),
            "gift_purchase" => Ok(EventKind::GiftPurchase),
            "gift_redeem" => Ok(EventKind::GiftRedeem),
            other => Err(format!("unknown event kind: {}", other)),
        }
    }
}

/// メッセージ構成要素（テキスト・絵文字・ステッカー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    Emoji { url: String, alt: String },
    Sticker { url: String, alt: String },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }
}

/// スーパーチャット・スーパーステッカーの配色（#RRGGBB）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

/// 連結したテキスト部分（区切り文字なし）
pub fn flatten_text(parts: &[MessagePart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            MessagePart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

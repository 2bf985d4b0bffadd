//! InnerTube API 固有の型定義

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::DEFAULT_CONTINUATION_TIMEOUT_MS;
use crate::youtube::errors::YouTubeError;

/// InnerTube APIレスポンス（ライブチャット取得）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerTubeChatResponse {
    pub continuation_contents: Option<ContinuationContents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationContents {
    pub live_chat_continuation: Option<LiveChatContinuation>,
}

#[derive(Debug, Deserialize)]
pub struct LiveChatContinuation {
    pub actions: Option<Vec<ChatAction>>,
    pub continuations: Option<Vec<Continuation>>,
    pub header: Option<LiveChatHeader>,
}

/// チャットアクション（メッセージ追加など）
///
/// itemは未知のレンダラーや壊れたデータでもレスポンス全体を失敗させないよう、
/// 生のJSONのまま受け取り、1件ずつパースする
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAction {
    pub add_chat_item_action: Option<AddChatItemAction>,
}

#[derive(Debug, Deserialize)]
pub struct AddChatItemAction {
    pub item: Option<Value>,
}

/// チャットアイテム（6種類のレンダラーのいずれか1つ）
#[derive(Debug, Deserialize)]
pub enum ChatItem {
    #[serde(rename = "liveChatTextMessageRenderer")]
    Text(TextMessageRenderer),
    #[serde(rename = "liveChatPaidMessageRenderer")]
    Paid(PaidMessageRenderer),
    #[serde(rename = "liveChatPaidStickerRenderer")]
    Sticker(PaidStickerRenderer),
    #[serde(rename = "liveChatMembershipItemRenderer")]
    Membership(MembershipItemRenderer),
    #[serde(rename = "liveChatSponsorshipsGiftPurchaseAnnouncementRenderer")]
    GiftPurchase(GiftPurchaseRenderer),
    #[serde(rename = "liveChatGiftRedemptionAnnouncementRenderer")]
    GiftRedeem(GiftRedemptionRenderer),
}

impl ChatItem {
    /// 対応しているレンダラーのキー
    pub const RENDERER_KEYS: [&'static str; 6] = [
        "liveChatTextMessageRenderer",
        "liveChatPaidMessageRenderer",
        "liveChatPaidStickerRenderer",
        "liveChatMembershipItemRenderer",
        "liveChatSponsorshipsGiftPurchaseAnnouncementRenderer",
        "liveChatGiftRedemptionAnnouncementRenderer",
    ];

    /// 対応レンダラーのキーとその値を取り出す（他のキーは無視）
    pub fn renderer_entry(item: &Value) -> Option<(&'static str, &Value)> {
        let obj = item.as_object()?;
        Self::RENDERER_KEYS
            .iter()
            .find_map(|key| obj.get(*key).map(|value| (*key, value)))
    }
}

/// 全レンダラー共通のフィールド
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererMeta {
    pub id: Option<String>,
    pub message_id: Option<String>,
    pub tracking_params: Option<String>,
    pub author_name: Option<SimpleText>,
    pub author_photo: Option<ThumbnailContainer>,
    pub timestamp_usec: Option<TimestampUsec>,
}

/// timestampUsec（通常は文字列だが数値で届くこともある）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TimestampUsec {
    Number(i64),
    Text(String),
}

impl RendererMeta {
    /// プラットフォームが付与したID（id → messageId → trackingParams の順）
    pub fn native_id(&self) -> Option<&str> {
        [&self.id, &self.message_id, &self.tracking_params]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }

    pub fn author_text(&self) -> String {
        self.author_name
            .as_ref()
            .map(SimpleText::get_text)
            .unwrap_or_default()
    }
}

/// テキストメッセージレンダラー
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageRenderer {
    #[serde(flatten)]
    pub meta: RendererMeta,
    pub message: Option<MessageContent>,
}

/// スーパーチャットレンダラー
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidMessageRenderer {
    #[serde(flatten)]
    pub meta: RendererMeta,
    pub message: Option<MessageContent>,
    pub purchase_amount_text: Option<SimpleText>,
    pub header_background_color: Option<i64>,
    pub header_text_color: Option<i64>,
    pub body_background_color: Option<i64>,
    pub body_text_color: Option<i64>,
}

/// スーパーステッカーレンダラー
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidStickerRenderer {
    #[serde(flatten)]
    pub meta: RendererMeta,
    pub sticker: Option<StickerImage>,
    pub purchase_amount_text: Option<SimpleText>,
    pub background_color: Option<i64>,
    pub money_chip_text_color: Option<i64>,
    pub author_name_text_color: Option<i64>,
}

/// メンバーシップレンダラー
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipItemRenderer {
    #[serde(flatten)]
    pub meta: RendererMeta,
    pub message: Option<MessageContent>,
    pub header_primary_text: Option<SimpleText>,
    pub header_subtext: Option<SimpleText>,
}

/// メンバーシップギフト購入レンダラー
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPurchaseRenderer {
    #[serde(flatten)]
    pub meta: RendererMeta,
    pub header: Option<GiftPurchaseHeader>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPurchaseHeader {
    pub live_chat_sponsorships_header_renderer: Option<SponsorshipsHeaderRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipsHeaderRenderer {
    pub author_name: Option<SimpleText>,
    pub author_photo: Option<ThumbnailContainer>,
}

/// メンバーシップギフト受け取りレンダラー
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftRedemptionRenderer {
    #[serde(flatten)]
    pub meta: RendererMeta,
    pub message: Option<MessageContent>,
    pub header: Option<SimpleText>,
    pub subtext: Option<SimpleText>,
}

/// メッセージ内容（runs配列を含む）
#[derive(Debug, Deserialize)]
pub struct MessageContent {
    pub runs: Option<Vec<RunItem>>,
}

/// runs配列の要素（テキストまたは絵文字）
#[derive(Debug, Deserialize)]
pub struct RunItem {
    pub text: Option<String>,
    pub emoji: Option<InnerTubeEmoji>,
}

/// InnerTube絵文字情報
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerTubeEmoji {
    pub emoji_id: Option<String>,
    #[serde(default)]
    pub shortcuts: Vec<String>,
    pub image: Option<ThumbnailContainer>,
}

/// ステッカー画像
#[derive(Debug, Deserialize)]
pub struct StickerImage {
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    pub accessibility: Option<Accessibility>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessibility {
    pub accessibility_data: Option<AccessibilityData>,
}

#[derive(Debug, Deserialize)]
pub struct AccessibilityData {
    pub label: Option<String>,
}

/// サムネイルコンテナ
#[derive(Debug, Deserialize)]
pub struct ThumbnailContainer {
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

impl ThumbnailContainer {
    /// 最後（最大解像度）のサムネイルURL
    pub fn largest_url(&self) -> Option<&str> {
        self.thumbnails.last().and_then(|t| t.url.as_deref())
    }
}

/// サムネイル（urlが欠けていても他のサムネイル・アイテム全体は読める）
#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: Option<String>,
}

/// シンプルテキスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleText {
    pub simple_text: Option<String>,
    pub runs: Option<Vec<RunItem>>,
}

impl SimpleText {
    /// テキスト内容を取得（simpleTextが空ならrunsを連結）
    pub fn get_text(&self) -> String {
        if let Some(text) = self.simple_text.as_ref().filter(|t| !t.is_empty()) {
            return text.clone();
        }
        self.runs
            .as_ref()
            .map(|runs| runs.iter().filter_map(|r| r.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

/// チャットヘッダー（Top chat / All chat の切り替えメニューを含む）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveChatHeader {
    pub live_chat_header_renderer: Option<LiveChatHeaderRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveChatHeaderRenderer {
    pub view_selector: Option<ViewSelector>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSelector {
    pub sort_filter_sub_menu_renderer: Option<SortFilterSubMenuRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortFilterSubMenuRenderer {
    #[serde(default)]
    pub sub_menu_items: Vec<SubMenuItem>,
}

#[derive(Debug, Deserialize)]
pub struct SubMenuItem {
    #[serde(default)]
    pub selected: bool,
    pub continuation: Option<SubMenuContinuation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubMenuContinuation {
    pub reload_continuation_data: Option<ContinuationData>,
}

/// Continuation（次回取得用トークン）
///
/// 既知の2種類以外のキーはotherに集め、エラーメッセージに使う
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    pub timed_continuation_data: Option<ContinuationData>,
    pub invalidation_continuation_data: Option<ContinuationData>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationData {
    pub continuation: String,
    pub timeout_ms: Option<u64>,
}

/// 次回ポーリング情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextContinuation {
    pub token: String,
    pub timeout_ms: u64,
}

impl Continuation {
    /// timed → invalidation の順で次回トークンを取り出す
    pub fn next(&self) -> Result<NextContinuation, YouTubeError> {
        let data = self
            .timed_continuation_data
            .as_ref()
            .or(self.invalidation_continuation_data.as_ref())
            .ok_or_else(|| YouTubeError::UnknownContinuation(self.other.keys().cloned().collect()))?;

        Ok(NextContinuation {
            token: data.continuation.clone(),
            timeout_ms: data.timeout_ms.unwrap_or(DEFAULT_CONTINUATION_TIMEOUT_MS),
        })
    }
}

impl InnerTubeChatResponse {
    /// liveChatContinuationを取り出す（無ければレスポンス形式エラー）
    pub fn live_chat(&self) -> Result<&LiveChatContinuation, YouTubeError> {
        self.continuation_contents
            .as_ref()
            .and_then(|c| c.live_chat_continuation.as_ref())
            .ok_or_else(|| {
                YouTubeError::ParseError("continuationContents.liveChatContinuation missing".to_string())
            })
    }

    /// 次回取得用のcontinuationトークンと推奨待機時間を抽出
    pub fn next_continuation(&self) -> Result<NextContinuation, YouTubeError> {
        self.live_chat()?
            .continuations
            .as_ref()
            .and_then(|c| c.first())
            .ok_or_else(|| YouTubeError::ParseError("continuations[0] missing".to_string()))?
            .next()
    }

    /// Top chat表示中の場合、未選択のAll chat用continuationを返す
    pub fn unselected_view_continuation(&self) -> Option<String> {
        self.live_chat()
            .ok()?
            .header
            .as_ref()?
            .live_chat_header_renderer
            .as_ref()?
            .view_selector
            .as_ref()?
            .sort_filter_sub_menu_renderer
            .as_ref()?
            .sub_menu_items
            .iter()
            .filter(|item| !item.selected)
            .find_map(|item| {
                item.continuation
                    .as_ref()?
                    .reload_continuation_data
                    .as_ref()
                    .map(|d| d.continuation.clone())
            })
    }
}

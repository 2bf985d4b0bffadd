//! InnerTube レスポンスパーサー
//!
//! 6種類のレンダラーを正規化済みの [`ChatEvent`] に変換する。
//! I/Oを行わない純粋関数のみで構成する。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::types::*;
use crate::util::format_local_timestamp;
use crate::youtube::types::{flatten_text, ChatEvent, ColorSet, EventKind, MessagePart};

/// 投稿者名が取れない場合の表示名
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// 金額テキスト中の数字列（桁区切りカンマを含む）
static AMOUNT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d,]+").expect("Failed to compile amount regex"));

/// liveChatContinuationをChatEventリストに変換
///
/// 1件のパース失敗でバッチ全体を止めない。位置（position）はactions配列の
/// インデックスで、IDが無いアイテムの合成IDに使う。
pub fn parse_chat_response(contents: &LiveChatContinuation, video_id: &str) -> Vec<ChatEvent> {
    let Some(actions) = contents.actions.as_ref() else {
        return vec![];
    };

    actions
        .iter()
        .enumerate()
        .filter_map(|(position, action)| {
            let item = action.add_chat_item_action.as_ref()?.item.as_ref()?;
            normalize_item(item, position, video_id)
        })
        .collect()
}

/// 単一のチャットアイテムを正規化
///
/// 未知のレンダラーは黙ってスキップし、既知のレンダラーで形式が壊れている場合は
/// 警告を出してスキップする
pub fn normalize_item(item: &Value, position: usize, video_id: &str) -> Option<ChatEvent> {
    let Some((key, renderer)) = ChatItem::renderer_entry(item) else {
        log::debug!("Skipping unsupported chat item at position {}", position);
        return None;
    };

    // 外部タグ形式はキー1つのマップのみ受け付けるため、レンダラー以外のキーは除く
    let mut tagged = serde_json::Map::with_capacity(1);
    tagged.insert(key.to_string(), renderer.clone());

    let chat_item: ChatItem = match serde_json::from_value(Value::Object(tagged)) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Skipping malformed chat item at position {}: {}", position, e);
            return None;
        }
    };

    match build_event(chat_item, position, video_id) {
        Ok(event) => Some(event),
        Err(reason) => {
            log::warn!("Skipping malformed chat item at position {}: {}", position, reason);
            None
        }
    }
}

/// レンダラー種別ごとの抽出結果
struct Extracted {
    kind: EventKind,
    author: String,
    text: String,
    parts: Vec<MessagePart>,
    amount_text: String,
    colors: Option<ColorSet>,
    fallback_icon: Option<String>,
}

impl Extracted {
    fn new(kind: EventKind, author: String, parts: Vec<MessagePart>) -> Self {
        let text = flatten_text(&parts);
        Self {
            kind,
            author,
            text,
            parts,
            amount_text: String::new(),
            colors: None,
            fallback_icon: None,
        }
    }
}

fn build_event(item: ChatItem, position: usize, video_id: &str) -> Result<ChatEvent, String> {
    let (meta, extracted) = match item {
        ChatItem::Text(r) => {
            let parts = parse_message_parts(r.message.as_ref());
            let author = r.meta.author_text();
            (r.meta, Extracted::new(EventKind::Text, author, parts))
        }
        ChatItem::Paid(r) => {
            let parts = parse_message_parts(r.message.as_ref());
            let mut extracted = Extracted::new(EventKind::Paid, r.meta.author_text(), parts);
            extracted.amount_text = simple_text(r.purchase_amount_text.as_ref());
            extracted.colors = Some(ColorSet {
                header_bg: r.header_background_color.map(to_hex_color),
                header_text: r.header_text_color.map(to_hex_color),
                body_bg: r.body_background_color.map(to_hex_color),
                body_text: r.body_text_color.map(to_hex_color),
            });
            (r.meta, extracted)
        }
        ChatItem::Sticker(r) => {
            let parts = vec![parse_sticker_part(r.sticker.as_ref())];
            let mut extracted = Extracted::new(EventKind::Sticker, r.meta.author_text(), parts);
            extracted.text = "[STICKER]".to_string();
            extracted.amount_text = simple_text(r.purchase_amount_text.as_ref());
            extracted.colors = Some(ColorSet {
                body_bg: r.background_color.map(to_hex_color),
                body_text: r
                    .money_chip_text_color
                    .or(r.author_name_text_color)
                    .map(to_hex_color),
                ..Default::default()
            });
            (r.meta, extracted)
        }
        ChatItem::Membership(r) => {
            let parts = parse_message_parts(r.message.as_ref());
            let mut extracted = Extracted::new(EventKind::Membership, r.meta.author_text(), parts);
            let header_primary = simple_text(r.header_primary_text.as_ref());
            let header_sub = simple_text(r.header_subtext.as_ref());
            extracted.text = join_non_empty(&[
                header_primary.as_str(),
                header_sub.as_str(),
                extracted.text.as_str(),
            ])
            .unwrap_or_else(|| "[MEMBERSHIP]".to_string());
            (r.meta, extracted)
        }
        ChatItem::GiftPurchase(r) => {
            let header = r
                .header
                .as_ref()
                .and_then(|h| h.live_chat_sponsorships_header_renderer.as_ref());
            let gifter = header
                .map(|h| simple_text(h.author_name.as_ref()))
                .unwrap_or_default()
                .trim_start_matches('@')
                .to_string();

            let (author, message) = if gifter.is_empty() {
                (r.meta.author_text(), "A viewer sent gift memberships".to_string())
            } else {
                let message = format!("{} sent gift memberships", gifter);
                (gifter, message)
            };

            let mut extracted = Extracted::new(
                EventKind::GiftPurchase,
                author,
                vec![MessagePart::text(message)],
            );
            extracted.fallback_icon = header
                .and_then(|h| h.author_photo.as_ref())
                .and_then(ThumbnailContainer::largest_url)
                .map(str::to_string);
            (r.meta, extracted)
        }
        ChatItem::GiftRedeem(r) => {
            let header_text = simple_text(r.header.as_ref());
            let subtext = simple_text(r.subtext.as_ref());
            let text = join_non_empty(&[header_text.as_str(), subtext.as_str()])
                .unwrap_or_else(|| "[GIFT REDEEM]".to_string());

            let mut parts = parse_message_parts(r.message.as_ref());
            if parts.is_empty() {
                parts = vec![MessagePart::text(text.clone())];
            }

            let mut extracted = Extracted::new(EventKind::GiftRedeem, r.meta.author_text(), parts);
            extracted.text = text;
            (r.meta, extracted)
        }
    };

    let timestamp_ms = parse_timestamp_ms(meta.timestamp_usec.as_ref())?;
    let author = if extracted.author.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        extracted.author
    };

    let id = match meta.native_id() {
        Some(native) => native.to_string(),
        None => synthetic_id(timestamp_ms, &author, &extracted.text, position),
    };

    // 配色はスーパーチャット・スーパーステッカーのみ
    let colors = if extracted.kind.has_colors() {
        extracted.colors
    } else {
        None
    };

    let icon_url = meta
        .author_photo
        .as_ref()
        .and_then(ThumbnailContainer::largest_url)
        .map(str::to_string)
        .or(extracted.fallback_icon);

    Ok(ChatEvent {
        id,
        stream_id: video_id.to_string(),
        timestamp_ms,
        timestamp_display: format_local_timestamp(timestamp_ms),
        author,
        text: extracted.text,
        kind: extracted.kind,
        amount: parse_amount(&extracted.amount_text),
        amount_text: extracted.amount_text,
        icon_url,
        parts: extracted.parts,
        colors,
    })
}

/// IDが付与されていないアイテムの合成ID
///
/// 同じバッチを再処理しても同じIDになるよう、入力のみから決定する
pub fn synthetic_id(timestamp_ms: i64, author: &str, text: &str, position: usize) -> String {
    format!("{}_{}_{}_{}", timestamp_ms, author, text, position)
}

/// runs配列をMessagePartリストに変換（テキストと絵文字のみ）
fn parse_message_parts(message: Option<&MessageContent>) -> Vec<MessagePart> {
    let Some(runs) = message.and_then(|m| m.runs.as_ref()) else {
        return vec![];
    };

    runs.iter()
        .filter_map(|run| {
            if let Some(text) = &run.text {
                return Some(MessagePart::text(text.clone()));
            }
            let emoji = run.emoji.as_ref()?;
            let url = emoji
                .image
                .as_ref()
                .and_then(ThumbnailContainer::largest_url)
                .unwrap_or_default()
                .to_string();
            let alt = emoji
                .shortcuts
                .first()
                .cloned()
                .or_else(|| emoji.emoji_id.clone())
                .unwrap_or_default();
            Some(MessagePart::Emoji { url, alt })
        })
        .collect()
}

/// ステッカー画像を1つのMessagePartに変換
fn parse_sticker_part(sticker: Option<&StickerImage>) -> MessagePart {
    let url = sticker
        .and_then(|s| s.thumbnails.last())
        .and_then(|t| t.url.clone())
        .unwrap_or_default();
    let alt = sticker
        .and_then(|s| s.accessibility.as_ref())
        .and_then(|a| a.accessibility_data.as_ref())
        .and_then(|d| d.label.clone())
        .unwrap_or_default();
    MessagePart::Sticker { url, alt }
}

fn simple_text(text: Option<&SimpleText>) -> String {
    text.map(SimpleText::get_text).unwrap_or_default()
}

/// 空でない要素を半角スペースで連結（すべて空ならNone）
fn join_non_empty(items: &[&str]) -> Option<String> {
    let joined = items
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// マイクロ秒文字列をミリ秒に変換（切り捨て）
///
/// 欠落時は0、数値でない場合はアイテム不正としてエラー
fn parse_timestamp_ms(timestamp_usec: Option<&TimestampUsec>) -> Result<i64, String> {
    match timestamp_usec {
        None => Ok(0),
        Some(TimestampUsec::Number(usec)) => Ok(usec.div_euclid(1000)),
        Some(TimestampUsec::Text(ts)) => ts
            .trim()
            .parse::<i64>()
            .map(|usec| usec.div_euclid(1000))
            .map_err(|e| format!("invalid timestampUsec '{}': {}", ts, e)),
    }
}

/// 金額テキストをパース（例: "¥1,234" -> Some(1234)）
///
/// 最初の数字列からカンマを除いて整数化する。数字が無ければNone
pub fn parse_amount(text: &str) -> Option<i64> {
    let digits: String = AMOUNT_REGEX
        .find(text)?
        .as_str()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    digits.parse().ok()
}

/// 符号付き32bitカラー整数を "#RRGGBB" に変換（下位24bitをマスク）
pub fn to_hex_color(value: i64) -> String {
    format!("#{:06X}", value & 0xFF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VIDEO_ID: &str = "abcdefghijk";

    fn author_photo() -> Value {
        json!({"thumbnails": [
            {"url": "https://yt3.example.com/photo32.jpg", "width": 32, "height": 32},
            {"url": "https://yt3.example.com/photo64.jpg", "width": 64, "height": 64}
        ]})
    }

    fn normalize(item: Value) -> ChatEvent {
        normalize_item(&item, 0, VIDEO_ID).expect("item should normalize")
    }

    // ========================================
    // 金額・カラー変換テスト
    // ========================================

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("¥1,234"), Some(1234));
        assert_eq!(parse_amount("$5.00"), Some(5));
        assert_eq!(parse_amount("₩10,000"), Some(10000));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("無料"), None);
        // カンマのみは数字ではない
        assert_eq!(parse_amount("a, b"), None);
    }

    #[test]
    fn test_to_hex_color_masks_sign_bit() {
        // 0xFFAABBCC を符号付き32bitで解釈した値
        let signed = 0xFFAABBCCu32 as i32 as i64;
        assert!(signed < 0);
        assert_eq!(to_hex_color(signed), "#AABBCC");
        assert_eq!(to_hex_color(0xFFAABBCC), "#AABBCC");
        assert_eq!(to_hex_color(0x1DE9B6), "#1DE9B6");
        assert_eq!(to_hex_color(0), "#000000");
    }

    #[test]
    fn test_parse_timestamp_ms_truncates() {
        let text = |s: &str| TimestampUsec::Text(s.to_string());
        assert_eq!(parse_timestamp_ms(Some(&text("1703145600123999"))), Ok(1_703_145_600_123));
        assert_eq!(
            parse_timestamp_ms(Some(&TimestampUsec::Number(1_703_145_600_123_999))),
            Ok(1_703_145_600_123)
        );
        assert_eq!(parse_timestamp_ms(None), Ok(0));
        assert!(parse_timestamp_ms(Some(&text("invalid"))).is_err());
    }

    // ========================================
    // 6種類のレンダラー
    // ========================================

    #[test]
    fn test_normalize_text_message() {
        let event = normalize(json!({"liveChatTextMessageRenderer": {
            "id": "text-id",
            "message": {"runs": [
                {"text": "Hello "},
                {"emoji": {
                    "emojiId": "UC123/wave",
                    "shortcuts": [":wave:"],
                    "image": {"thumbnails": [
                        {"url": "https://example.com/wave24.png"},
                        {"url": "https://example.com/wave48.png"}
                    ]}
                }},
                {"text": " World"}
            ]},
            "authorName": {"simpleText": "Test User"},
            "authorPhoto": author_photo(),
            "timestampUsec": "1703145600000000"
        }}));

        assert_eq!(event.id, "text-id");
        assert_eq!(event.stream_id, VIDEO_ID);
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.text, "Hello  World");
        assert_eq!(event.author, "Test User");
        assert_eq!(event.timestamp_ms, 1_703_145_600_000);
        assert_eq!(event.timestamp_display, format_local_timestamp(1_703_145_600_000));
        assert_eq!(
            event.icon_url.as_deref(),
            Some("https://yt3.example.com/photo64.jpg")
        );
        assert_eq!(
            event.parts,
            vec![
                MessagePart::text("Hello "),
                MessagePart::Emoji {
                    url: "https://example.com/wave48.png".to_string(),
                    alt: ":wave:".to_string(),
                },
                MessagePart::text(" World"),
            ]
        );
        assert_eq!(event.amount, None);
        assert_eq!(event.amount_text, "");
        assert!(event.colors.is_none());
    }

    #[test]
    fn test_normalize_paid_message() {
        let event = normalize(json!({"liveChatPaidMessageRenderer": {
            "id": "paid-id",
            "message": {"runs": [{"text": "ナイス配信！"}]},
            "authorName": {"simpleText": "スパチャ太郎"},
            "authorPhoto": author_photo(),
            "timestampUsec": "1703145600000000",
            "purchaseAmountText": {"simpleText": "¥1,000"},
            "headerBackgroundColor": 4278239141i64,
            "headerTextColor": 3741319168i64,
            "bodyBackgroundColor": 4280150454i64,
            "bodyTextColor": -16777216
        }}));

        assert_eq!(event.kind, EventKind::Paid);
        assert_eq!(event.text, "ナイス配信！");
        assert_eq!(event.amount, Some(1000));
        assert_eq!(event.amount_text, "¥1,000");
        assert_eq!(
            event.colors,
            Some(ColorSet {
                header_bg: Some("#00BFA5".to_string()),
                header_text: Some("#000000".to_string()),
                body_bg: Some("#1DE9B6".to_string()),
                body_text: Some("#000000".to_string()),
            })
        );
        assert!(event
            .parts
            .iter()
            .all(|p| matches!(p, MessagePart::Text { .. } | MessagePart::Emoji { .. })));
    }

    #[test]
    fn test_normalize_paid_sticker() {
        let event = normalize(json!({"liveChatPaidStickerRenderer": {
            "id": "sticker-id",
            "authorName": {"simpleText": "Sticker Fan"},
            "authorPhoto": author_photo(),
            "timestampUsec": "1703145600000000",
            "sticker": {
                "thumbnails": [
                    {"url": "//lh3.example.com/sticker-s40"},
                    {"url": "//lh3.example.com/sticker-s80"}
                ],
                "accessibility": {"accessibilityData": {"label": "Thumbs up"}}
            },
            "purchaseAmountText": {"simpleText": "¥200"},
            "backgroundColor": 4280191205i64,
            "authorNameTextColor": 3019898879i64
        }}));

        assert_eq!(event.kind, EventKind::Sticker);
        assert_eq!(event.text, "[STICKER]");
        assert_eq!(event.amount, Some(200));
        assert_eq!(
            event.parts,
            vec![MessagePart::Sticker {
                url: "//lh3.example.com/sticker-s80".to_string(),
                alt: "Thumbs up".to_string(),
            }]
        );
        let colors = event.colors.expect("sticker should carry colors");
        assert_eq!(colors.body_bg.as_deref(), Some("#1E88E5"));
        // moneyChipTextColorが無ければauthorNameTextColor
        assert_eq!(colors.body_text.as_deref(), Some("#FFFFFF"));
        assert!(colors.header_bg.is_none());
        assert!(colors.header_text.is_none());
    }

    #[test]
    fn test_normalize_membership() {
        let event = normalize(json!({"liveChatMembershipItemRenderer": {
            "id": "member-id",
            "authorName": {"simpleText": "New Member"},
            "authorPhoto": author_photo(),
            "timestampUsec": "1703145600000000",
            "headerPrimaryText": {"runs": [{"text": "Member for "}, {"text": "3 months"}]},
            "headerSubtext": {"simpleText": "Welcome!"},
            "message": {"runs": [{"text": "Thanks!"}]}
        }}));

        assert_eq!(event.kind, EventKind::Membership);
        assert_eq!(event.text, "Member for 3 months Welcome! Thanks!");
        assert_eq!(event.parts, vec![MessagePart::text("Thanks!")]);
        assert!(event.colors.is_none());
    }

    #[test]
    fn test_normalize_membership_placeholder() {
        let event = normalize(json!({"liveChatMembershipItemRenderer": {
            "id": "member-empty",
            "authorName": {"simpleText": "Quiet Member"},
            "timestampUsec": "1703145600000000"
        }}));
        assert_eq!(event.text, "[MEMBERSHIP]");
        assert!(event.parts.is_empty());
    }

    #[test]
    fn test_normalize_gift_purchase() {
        let event = normalize(json!({"liveChatSponsorshipsGiftPurchaseAnnouncementRenderer": {
            "id": "gift-id",
            "timestampUsec": "1703145600000000",
            "header": {"liveChatSponsorshipsHeaderRenderer": {
                "authorName": {"simpleText": "@generous"},
                "authorPhoto": author_photo(),
                "primaryText": {"runs": [{"text": "Sent 5 memberships"}]}
            }}
        }}));

        assert_eq!(event.kind, EventKind::GiftPurchase);
        assert_eq!(event.author, "generous");
        assert_eq!(event.text, "generous sent gift memberships");
        assert_eq!(
            event.parts,
            vec![MessagePart::text("generous sent gift memberships")]
        );
        // authorPhotoが無い場合はヘッダーの画像
        assert_eq!(
            event.icon_url.as_deref(),
            Some("https://yt3.example.com/photo64.jpg")
        );
        assert!(event.colors.is_none());
    }

    #[test]
    fn test_normalize_gift_purchase_without_header_author() {
        let event = normalize(json!({"liveChatSponsorshipsGiftPurchaseAnnouncementRenderer": {
            "id": "gift-anon",
            "timestampUsec": "1703145600000000",
            "header": {"liveChatSponsorshipsHeaderRenderer": {}}
        }}));
        assert_eq!(event.author, UNKNOWN_AUTHOR);
        assert_eq!(event.text, "A viewer sent gift memberships");
        assert_eq!(event.parts.len(), 1);
        assert!(event.icon_url.is_none());
    }

    #[test]
    fn test_normalize_gift_redeem_synthesized_part() {
        let event = normalize(json!({"liveChatGiftRedemptionAnnouncementRenderer": {
            "id": "redeem-id",
            "authorName": {"simpleText": "Lucky Viewer"},
            "timestampUsec": "1703145600000000",
            "header": {"runs": [{"text": "received a gift membership"}]},
            "subtext": {"runs": [{"text": "by generous"}]}
        }}));

        assert_eq!(event.kind, EventKind::GiftRedeem);
        assert_eq!(event.text, "received a gift membership by generous");
        assert_eq!(
            event.parts,
            vec![MessagePart::text("received a gift membership by generous")]
        );
        assert!(event.colors.is_none());
    }

    #[test]
    fn test_normalize_gift_redeem_parsed_parts() {
        let event = normalize(json!({"liveChatGiftRedemptionAnnouncementRenderer": {
            "id": "redeem-runs",
            "authorName": {"simpleText": "Lucky Viewer"},
            "timestampUsec": "1703145600000000",
            "message": {"runs": [
                {"text": "was gifted a membership by ", "italics": true},
                {"text": "generous", "bold": true}
            ]}
        }}));

        assert_eq!(event.text, "[GIFT REDEEM]");
        assert_eq!(
            event.parts,
            vec![
                MessagePart::text("was gifted a membership by "),
                MessagePart::text("generous"),
            ]
        );
    }

    // ========================================
    // フォールバック・異常系
    // ========================================

    #[test]
    fn test_missing_author_falls_back_to_unknown() {
        let event = normalize(json!({"liveChatTextMessageRenderer": {
            "id": "anon",
            "message": {"runs": [{"text": "hi"}]},
            "timestampUsec": "1703145600000000"
        }}));
        assert_eq!(event.author, "Unknown");
    }

    #[test]
    fn test_synthetic_id_is_stable() {
        let item = json!({"liveChatTextMessageRenderer": {
            "message": {"runs": [{"text": "no id here"}]},
            "authorName": {"simpleText": "Someone"},
            "timestampUsec": "1703145600000000"
        }});

        let first = normalize_item(&item, 3, VIDEO_ID).unwrap();
        let second = normalize_item(&item, 3, VIDEO_ID).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.id, "1703145600000_Someone_no id here_3");

        // 位置が違えば別ID
        let other = normalize_item(&item, 4, VIDEO_ID).unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_unknown_renderer_is_skipped() {
        let item = json!({"liveChatViewerEngagementMessageRenderer": {"id": "x"}});
        assert!(normalize_item(&item, 0, VIDEO_ID).is_none());
    }

    #[test]
    fn test_malformed_item_is_skipped() {
        // 数値でないtimestampUsec
        let bad_timestamp = json!({"liveChatTextMessageRenderer": {
            "id": "bad-ts",
            "timestampUsec": "not-a-number"
        }});
        assert!(normalize_item(&bad_timestamp, 0, VIDEO_ID).is_none());

        // レンダラーの値がオブジェクトでない
        let bad_shape = json!({"liveChatTextMessageRenderer": "oops"});
        assert!(normalize_item(&bad_shape, 0, VIDEO_ID).is_none());
    }

    #[test]
    fn test_thumbnail_without_url_keeps_item() {
        // urlの無いサムネイルが最後ならアイコンなし
        let no_url = json!({"liveChatTextMessageRenderer": {
            "id": "no-url-photo",
            "authorPhoto": {"thumbnails": [{"width": 32}]},
            "message": {"runs": [{"text": "hi"}]}
        }});
        let event = normalize_item(&no_url, 0, VIDEO_ID).unwrap();
        assert_eq!(event.id, "no-url-photo");
        assert_eq!(event.icon_url, None);

        // 途中のサムネイルにurlが無くても最後のurlを使う
        let partial = json!({"liveChatTextMessageRenderer": {
            "id": "partial-photo",
            "authorPhoto": {"thumbnails": [{"width": 32}, {"url": "https://x/64.jpg"}]}
        }});
        let event = normalize_item(&partial, 0, VIDEO_ID).unwrap();
        assert_eq!(event.icon_url.as_deref(), Some("https://x/64.jpg"));

        // 絵文字画像にurlが無い場合はurl空の絵文字パーツ
        let emoji = json!({"liveChatTextMessageRenderer": {
            "id": "emoji-no-url",
            "message": {"runs": [
                {"text": "hi "},
                {"emoji": {"emojiId": "UCxx/abc", "shortcuts": [":wave:"],
                           "image": {"thumbnails": [{"width": 24}]}}}
            ]}
        }});
        let event = normalize_item(&emoji, 0, VIDEO_ID).unwrap();
        assert_eq!(
            event.parts[1],
            MessagePart::Emoji { url: String::new(), alt: ":wave:".to_string() }
        );
    }

    #[test]
    fn test_sibling_keys_next_to_renderer_are_ignored() {
        let item = json!({
            "liveChatTextMessageRenderer": {
                "id": "with-sibling",
                "authorName": {"simpleText": "A"},
                "timestampUsec": "1703145600000000",
                "message": {"runs": [{"text": "hello"}]}
            },
            "clientId": "abc"
        });
        let event = normalize_item(&item, 0, VIDEO_ID).unwrap();
        assert_eq!(event.id, "with-sibling");
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.text, "hello");
    }

    #[test]
    fn test_numeric_timestamp_usec() {
        let item = json!({"liveChatTextMessageRenderer": {
            "id": "numeric-ts",
            "timestampUsec": 1703145600123999_i64,
            "message": {"runs": [{"text": "x"}]}
        }});
        let event = normalize_item(&item, 0, VIDEO_ID).unwrap();
        assert_eq!(event.timestamp_ms, 1_703_145_600_123);
    }

    #[test]
    fn test_parse_chat_response_skips_bad_items_and_keeps_order() {
        let contents: LiveChatContinuation = serde_json::from_value(json!({
            "actions": [
                {"addChatItemAction": {"item": {"liveChatTextMessageRenderer": {
                    "id": "first", "message": {"runs": [{"text": "1"}]},
                    "timestampUsec": "1703145600000000"
                }}}},
                {"markChatItemAsDeletedAction": {"targetItemId": "zzz"}},
                {"addChatItemAction": {"item": {"liveChatTextMessageRenderer": {
                    "id": "broken", "timestampUsec": "??"
                }}}},
                {"addChatItemAction": {"item": {"liveChatPlaceholderItemRenderer": {"id": "p"}}}},
                {"addChatItemAction": {"item": {"liveChatTextMessageRenderer": {
                    "message": {"runs": [{"text": "2"}]},
                    "authorName": {"simpleText": "B"},
                    "timestampUsec": "1703145601000000"
                }}}}
            ],
            "continuations": [{"timedContinuationData": {"continuation": "next", "timeoutMs": 1000}}]
        }))
        .unwrap();

        let events = parse_chat_response(&contents, VIDEO_ID);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "first");
        // 合成IDにはactions配列上の位置を使う
        assert_eq!(events[1].id, "1703145601000_B_2_4");
    }

    #[test]
    fn test_parse_chat_response_no_actions() {
        let contents: LiveChatContinuation =
            serde_json::from_value(json!({"continuations": []})).unwrap();
        assert!(parse_chat_response(&contents, VIDEO_ID).is_empty());
    }
}

//! 配信の特定とポーリング初期値の取得
//!
//! 入力（動画ID / @ハンドル / チャンネルID / URL）から動画IDを解決し、
//! watchページからAPIキー・クライアントバージョン・初期continuationを抽出する。

use regex::Regex;
use std::sync::OnceLock;

use super::errors::YouTubeError;
use super::innertube::{fetch_live_chat, ChatTransport};
use super::state::PollState;
use crate::util::mask_secret;

/// 動画IDの長さ
const VIDEO_ID_LENGTH: usize = 11;

// 正規表現のシングルトン（OnceLockで初回のみコンパイル）
static CANONICAL_RE: OnceLock<Regex> = OnceLock::new();
static API_KEY_RE: OnceLock<Regex> = OnceLock::new();
static CLIENT_VERSION_RE: OnceLock<Regex> = OnceLock::new();
static CONTINUATION_RE: OnceLock<Regex> = OnceLock::new();
static URL_VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();
static URL_HANDLE_RE: OnceLock<Regex> = OnceLock::new();
static URL_CHANNEL_RE: OnceLock<Regex> = OnceLock::new();

fn get_canonical_regex() -> &'static Regex {
    CANONICAL_RE.get_or_init(|| {
        Regex::new(r#"<link rel="canonical" href="https://www\.youtube\.com/watch\?v=([^"]+)">"#)
            .expect("Failed to compile canonical link regex")
    })
}

fn get_api_key_regex() -> &'static Regex {
    API_KEY_RE.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)
            .expect("Failed to compile API key regex")
    })
}

fn get_client_version_regex() -> &'static Regex {
    CLIENT_VERSION_RE.get_or_init(|| {
        Regex::new(r#""clientVersion"\s*:\s*"([\d.]+)""#)
            .expect("Failed to compile client version regex")
    })
}

fn get_continuation_regex() -> &'static Regex {
    CONTINUATION_RE.get_or_init(|| {
        Regex::new(r#""continuation"\s*:\s*"([^"]+)""#)
            .expect("Failed to compile continuation regex")
    })
}

fn get_url_video_id_regex() -> &'static Regex {
    URL_VIDEO_ID_RE.get_or_init(|| {
        Regex::new(r"(?:[?&]v=|youtu\.be/|/live/|/shorts/)([A-Za-z0-9_-]{11})")
            .expect("Failed to compile URL video id regex")
    })
}

fn get_url_handle_regex() -> &'static Regex {
    URL_HANDLE_RE.get_or_init(|| {
        Regex::new(r"youtube\.com/(@[^/?#]+)").expect("Failed to compile URL handle regex")
    })
}

fn get_url_channel_regex() -> &'static Regex {
    URL_CHANNEL_RE.get_or_init(|| {
        Regex::new(r"youtube\.com/channel/([^/?#]+)")
            .expect("Failed to compile URL channel regex")
    })
}

/// 配信の指定方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamReference {
    /// 11文字の動画ID
    VideoId(String),
    /// @ハンドル（@を含む）
    Handle(String),
    /// チャンネルID
    Channel(String),
}

impl StreamReference {
    /// 入力文字列を分類する
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if input.contains("youtube.com") || input.contains("youtu.be") {
            if let Some(caps) = get_url_video_id_regex().captures(input) {
                return StreamReference::VideoId(caps[1].to_string());
            }
            if let Some(caps) = get_url_handle_regex().captures(input) {
                return StreamReference::Handle(caps[1].to_string());
            }
            if let Some(caps) = get_url_channel_regex().captures(input) {
                return StreamReference::Channel(caps[1].to_string());
            }
        }

        if input.starts_with('@') {
            StreamReference::Handle(input.to_string())
        } else if input.chars().count() == VIDEO_ID_LENGTH {
            StreamReference::VideoId(input.to_string())
        } else {
            StreamReference::Channel(input.to_string())
        }
    }
}

/// watchページから抽出したポーリング初期値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPageOptions {
    pub api_key: String,
    pub client_version: String,
    pub continuation: String,
}

/// 入力から動画IDを解決
///
/// ハンドル・チャンネルは /live ページを取得し、canonicalリンクから動画IDを読む
pub async fn resolve_video_id<T: ChatTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    input: &str,
) -> Result<String, YouTubeError> {
    // ハンドル・チャンネルは配信中の動画にリダイレクトされる /live ページを見る
    let url = match StreamReference::parse(input) {
        StreamReference::VideoId(video_id) => return Ok(video_id),
        StreamReference::Handle(handle) => format!("{}/{}/live", base_url, handle),
        StreamReference::Channel(channel) => format!("{}/channel/{}/live", base_url, channel),
    };

    log::info!("Resolving live stream from {}", url);
    let html = transport.get_text(&url).await?;

    get_canonical_regex()
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| YouTubeError::VideoNotFound(input.to_string()))
}

/// watchページからAPIキー・クライアントバージョン・continuationを抽出
pub fn extract_options_from_html(html: &str) -> Result<WatchPageOptions, YouTubeError> {
    let capture = |re: &Regex, name: &'static str| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(YouTubeError::PageTokenNotFound(name))
    };

    Ok(WatchPageOptions {
        api_key: capture(get_api_key_regex(), "INNERTUBE_API_KEY")?,
        client_version: capture(get_client_version_regex(), "clientVersion")?,
        continuation: capture(get_continuation_regex(), "continuation")?,
    })
}

/// Top chatからAll chatのcontinuationに切り替える
///
/// 未選択のメニュー項目が無ければ元のcontinuationをそのまま返す
pub async fn switch_to_all_chat<T: ChatTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    state: &PollState,
) -> Result<String, YouTubeError> {
    let response = fetch_live_chat(transport, base_url, state).await?;
    match response.unselected_view_continuation() {
        Some(all_chat) => {
            log::info!("Switched to all chat continuation");
            Ok(all_chat)
        }
        None => {
            log::debug!("No all chat continuation offered, keeping the initial one");
            Ok(state.continuation.clone())
        }
    }
}

/// 入力からポーリング開始状態を作る
///
/// ここで失敗した場合はリトライせず、実行全体を終了する
pub async fn bootstrap<T: ChatTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    input: &str,
    switch_all_chat: bool,
) -> Result<PollState, YouTubeError> {
    let video_id = resolve_video_id(transport, base_url, input).await?;
    log::info!("Resolved videoId = {}", video_id);

    let html = transport
        .get_text(&format!("{}/watch?v={}", base_url, video_id))
        .await?;
    let options = extract_options_from_html(&html)?;
    log::info!(
        "Watch page options: apiKey={}, clientVersion={}",
        mask_secret(&options.api_key),
        options.client_version
    );

    let mut state = PollState::new(
        options.api_key,
        options.client_version,
        options.continuation,
        video_id,
    );

    if switch_all_chat {
        state.continuation = switch_to_all_chat(transport, base_url, &state).await?;
    }

    Ok(state)
}

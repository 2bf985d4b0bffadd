//! InnerTube API クライアント実装

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::types::InnerTubeChatResponse;
use crate::config::http_timeout;
use crate::util::utc_offset_minutes;
use crate::youtube::errors::YouTubeError;
use crate::youtube::state::PollState;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// get_live_chat のパス
const LIVE_CHAT_PATH: &str = "/youtubei/v1/live_chat/get_live_chat";

/// HTTPトランスポート
///
/// ポーリングループとブートストラップが使う最小限のHTTP操作。
/// テストではフェイク実装に差し替える。
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// GETしてレスポンスボディをテキストで返す（リダイレクト追従）
    async fn get_text(&self, url: &str) -> Result<String, YouTubeError>;

    /// JSONをPOSTしてレスポンスボディをJSONで返す
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<Value, YouTubeError>;
}

/// InnerTube APIクライアント（reqwest実装）
///
/// Cookieストアを有効にし、1回の実行中はセッションを使い回す
#[derive(Debug, Clone)]
pub struct InnerTubeClient {
    client: Client,
}

impl InnerTubeClient {
    /// 新しいクライアントを作成
    ///
    /// # Errors
    /// HTTPクライアントのビルドに失敗した場合にエラーを返す
    pub fn new() -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(http_timeout())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ChatTransport for InnerTubeClient {
    async fn get_text(&self, url: &str) -> Result<String, YouTubeError> {
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(YouTubeError::ApiError(format!(
                "GET {} failed: {}",
                url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<Value, YouTubeError> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        // Content-Typeが指定済みなら json() は上書きしない
        let response = request.json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("InnerTube API error: {} - {}", status, body);
            return Err(YouTubeError::ApiError(format!(
                "InnerTube API error: {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| YouTubeError::ParseError(format!("InnerTube parse error: {}", e)))
    }
}

/// get_live_chat を1回呼び出してレスポンスを返す
pub async fn fetch_live_chat<T: ChatTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    state: &PollState,
) -> Result<InnerTubeChatResponse, YouTubeError> {
    let url = format!("{}{}?key={}", base_url, LIVE_CHAT_PATH, state.api_key);
    let headers = [
        ("Content-Type", "application/json".to_string()),
        ("X-YouTube-Client-Name", "1".to_string()),
        ("X-YouTube-Client-Version", state.client_version.clone()),
    ];
    let body = build_request_body(&state.client_version, &state.continuation);

    let value = transport.post_json(&url, &headers, &body).await?;
    serde_json::from_value(value)
        .map_err(|e| YouTubeError::ParseError(format!("InnerTube parse error: {}", e)))
}

/// リクエストボディを構築
pub fn build_request_body(client_version: &str, continuation: &str) -> Value {
    json!({
        "context": {
            "client": {
                "clientName": "WEB",
                "clientVersion": client_version,
                "hl": "ja",
                "gl": "JP",
                "utcOffsetMinutes": utc_offset_minutes()
            }
        },
        "continuation": continuation
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn poll_state() -> PollState {
        PollState::new(
            "test-api-key".to_string(),
            "2.20240101.00.00".to_string(),
            "cont-1".to_string(),
            "abcdefghijk".to_string(),
        )
    }

    #[test]
    fn test_build_request_body() {
        let body = build_request_body("2.20240101.00.00", "cont-token");
        assert_eq!(body["continuation"], "cont-token");
        assert_eq!(body["context"]["client"]["clientName"], "WEB");
        assert_eq!(body["context"]["client"]["clientVersion"], "2.20240101.00.00");
        assert_eq!(body["context"]["client"]["hl"], "ja");
        assert_eq!(body["context"]["client"]["gl"], "JP");
        assert_eq!(
            body["context"]["client"]["utcOffsetMinutes"],
            utc_offset_minutes()
        );
    }

    #[tokio::test]
    async fn test_fetch_live_chat_posts_expected_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/youtubei/v1/live_chat/get_live_chat")
            .match_query(Matcher::UrlEncoded("key".into(), "test-api-key".into()))
            .match_header("x-youtube-client-name", "1")
            .match_header("x-youtube-client-version", "2.20240101.00.00")
            .match_body(Matcher::PartialJson(json!({"continuation": "cont-1"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"continuationContents": {"liveChatContinuation": {
                    "continuations": [{"invalidationContinuationData": {"continuation": "cont-2", "timeoutMs": 3000}}]
                }}})
                .to_string(),
            )
            .create_async()
            .await;

        let client = InnerTubeClient::new().unwrap();
        let response = fetch_live_chat(&client, &server.url(), &poll_state())
            .await
            .unwrap();
        let next = response.next_continuation().unwrap();
        assert_eq!(next.token, "cont-2");
        assert_eq!(next.timeout_ms, 3000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_live_chat_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/youtubei/v1/live_chat/get_live_chat")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = InnerTubeClient::new().unwrap();
        let result = fetch_live_chat(&client, &server.url(), &poll_state()).await;
        assert!(matches!(result, Err(YouTubeError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_is_http_error() {
        // 待ち受けの無いポート
        let client = InnerTubeClient::new().unwrap();
        let result = client.get_text("http://127.0.0.1:9/").await;
        assert!(matches!(result, Err(YouTubeError::HttpError(_))));

        let result = fetch_live_chat(&client, "http://127.0.0.1:9", &poll_state()).await;
        assert!(matches!(result, Err(YouTubeError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_get_text_follows_redirect() {
        let mut server = mockito::Server::new_async().await;
        let _redirect = server
            .mock("GET", "/@someone/live")
            .with_status(302)
            .with_header("location", "/watch?v=abcdefghijk")
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/watch")
            .match_query(Matcher::UrlEncoded("v".into(), "abcdefghijk".into()))
            .with_status(200)
            .with_body("<html>watch page</html>")
            .create_async()
            .await;

        let client = InnerTubeClient::new().unwrap();
        let body = client
            .get_text(&format!("{}/@someone/live", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "<html>watch page</html>");
    }
}

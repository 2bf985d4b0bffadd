use thiserror::Error;

#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Video not found or not a live stream: {0}")]
    VideoNotFound(String),

    #[error("{0} not found in watch page")]
    PageTokenNotFound(&'static str),

    #[error("Unknown continuation block type: {0:?}")]
    UnknownContinuation(Vec<String>),

    #[error("Live chat poller is already running")]
    PollerAlreadyRunning,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for YouTubeError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeError::ParseError(err.to_string())
    }
}

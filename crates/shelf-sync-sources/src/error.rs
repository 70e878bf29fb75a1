use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    Status { status: u16, url: String, body: String },

    /// The platform answered 200 with an error code in the body
    #[error("{platform} error {code}: {message}")]
    Api {
        platform: &'static str,
        code: i64,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse page: {0}")]
    Parse(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

impl SourceError {
    pub fn parse(message: impl Into<String>) -> Self {
        SourceError::Parse(message.into())
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode store response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed store payload: {0}")]
    Malformed(String),

    #[error("Append of {0} blocks exceeds the per-call limit of {}", crate::traits::APPEND_BATCH_LIMIT)]
    BatchTooLarge(usize),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store rejected write: {0}")]
    Rejected(String),
}

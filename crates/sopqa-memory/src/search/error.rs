#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("search service rate limited the request")]
    RateLimited,

    #[error("search service unavailable (HTTP {0})")]
    Unavailable(u16),

    #[error("index not found: {0}")]
    NotFound(String),

    #[error("search service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{} record(s) failed to upload: {}", failed.len(), failed.join(", "))]
    Upload { failed: Vec<String> },

    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Classify a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, index: &str, message: String) -> Self {
        match status.as_u16() {
            429 => Self::RateLimited,
            404 => Self::NotFound(index.to_owned()),
            code if status.is_server_error() => Self::Unavailable(code),
            code => Self::Status {
                status: code,
                message,
            },
        }
    }
}

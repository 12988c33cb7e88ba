use thiserror::Error;

/// Errors returned while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429. `retry_after_secs` is the server's requested wait, when given.
    #[error("rate limited by X API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-2xx response.
    #[error("X API rejected the post with HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid notifier configuration: {0}")]
    Config(String),
}

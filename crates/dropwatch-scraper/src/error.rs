use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("too many redirects probing {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: usize },

    #[error("invalid store URL \"{store_url}\": {reason}")]
    InvalidStoreUrl { store_url: String, reason: String },
}

impl ScraperError {
    /// `true` for errors that mean "the server answered, but not with a page".
    ///
    /// After the first page these end pagination normally instead of being
    /// reported as a truncated fetch.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnexpectedStatus { .. })
    }
}

//! HTTP client for the X API v2 `POST /2/tweets` endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::NotifyError;
use crate::notifier::{MessageId, Notifier};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

/// Posts messages as the account that owns the user-context access token.
///
/// Use [`XClient::new`] for production or [`XClient::with_base_url`] to point
/// at a mock server in tests.
pub struct XClient {
    client: Client,
    access_token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl XClient {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, timeout_secs: u64, max_retries: u32) -> Result<Self, NotifyError> {
        Self::with_base_url(access_token, timeout_secs, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`NotifyError::Config`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        access_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dropwatch/0.1 (catalog-watch)")
            .build()?;

        // Exactly one trailing slash so `join("2/tweets")` appends rather
        // than replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| NotifyError::Config(format!("invalid X API base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the back-off base (0 disables sleeping between retries).
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    pub(crate) fn tweets_url(&self) -> Result<Url, NotifyError> {
        self.base_url
            .join("2/tweets")
            .map_err(|e| NotifyError::Config(format!("cannot build tweets URL: {e}")))
    }

    /// Posts `text`, retrying rate limits and connection failures a bounded
    /// number of times. A timeout or 5xx is returned as-is: X may already
    /// have published the post.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::RateLimited`] — HTTP 429 after retries, or a wait too long to honour.
    /// - [`NotifyError::Rejected`] — any other non-2xx status.
    /// - [`NotifyError::Http`] — connection, timeout, or TLS failure.
    /// - [`NotifyError::Deserialize`] — the success body lacks a post id.
    pub async fn post(&self, text: &str) -> Result<MessageId, NotifyError> {
        let url = self.tweets_url()?;
        let body = serde_json::json!({ "text": text });

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let body = &body;
            async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.access_token)
                    .json(body)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(NotifyError::RateLimited {
                        retry_after_secs: retry_after_secs(response.headers()),
                    });
                }

                let payload = response.text().await?;
                if !status.is_success() {
                    return Err(NotifyError::Rejected {
                        status: status.as_u16(),
                        detail: error_detail(&payload),
                    });
                }

                let created: CreateTweetResponse =
                    serde_json::from_str(&payload).map_err(|e| NotifyError::Deserialize {
                        context: "POST /2/tweets".to_owned(),
                        source: e,
                    })?;
                Ok(MessageId(created.data.id))
            }
        })
        .await
    }
}

impl Notifier for XClient {
    async fn notify(&self, message: &str) -> Result<MessageId, NotifyError> {
        self.post(message).await
    }
}

/// Seconds to wait from `Retry-After`, or from `x-rate-limit-reset`
/// (epoch seconds) when that is all the API sent.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
    };

    if let Some(secs) = header("retry-after") {
        return u64::try_from(secs).ok();
    }
    header("x-rate-limit-reset").map(|reset| {
        let remaining = reset - chrono::Utc::now().timestamp();
        u64::try_from(remaining).unwrap_or(0)
    })
}

/// Pulls a human-readable reason out of an X API error body.
fn error_detail(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("title"))
                .and_then(serde_json::Value::as_str)
        })
        .map_or_else(|| body.chars().take(200).collect(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn tweets_url_appends_to_base_path() {
        let client = XClient::with_base_url("token", 5, 0, "http://127.0.0.1:9000/x-proxy").unwrap();
        assert_eq!(
            client.tweets_url().unwrap().as_str(),
            "http://127.0.0.1:9000/x-proxy/2/tweets"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let result = XClient::with_base_url("token", 5, 0, "not a url");
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[test]
    fn retry_after_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("12"));
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1"));
        assert_eq!(retry_after_secs(&headers), Some(12));
    }

    #[test]
    fn past_rate_limit_reset_means_no_wait() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1"));
        assert_eq!(retry_after_secs(&headers), Some(0));
        assert_eq!(retry_after_secs(&HeaderMap::new()), None);
    }

    #[test]
    fn error_detail_prefers_api_detail() {
        assert_eq!(
            error_detail(r#"{"title":"Forbidden","detail":"You are not allowed to create a Tweet with duplicate content."}"#),
            "You are not allowed to create a Tweet with duplicate content."
        );
        assert_eq!(error_detail("plain text"), "plain text");
    }
}

//! HTTP client for a storefront's public `products.json` endpoint.

mod fetch_all;
mod origin;

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::types::ShopifyProductsResponse;

pub use fetch_all::CatalogFetch;
pub use origin::extract_store_origin;
pub(crate) use origin::extract_domain;

/// HTTP client for the public `products.json` endpoint.
///
/// Maps 429, 404 and other non-2xx responses to typed errors. Transient
/// errors (429, network failures) are retried with exponential backoff up to
/// `max_retries` additional attempts.
pub struct ShopifyClient {
    pub(super) client: Client,
    /// Maximum number of retry attempts after the first failure.
    pub(super) max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub(super) backoff_base_secs: u64,
}

impl ShopifyClient {
    /// Creates a `ShopifyClient` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches one page (1-based) of products, retrying transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScraperError::NotFound`] — HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`ScraperError::Http`] — network or TLS failure after all retries exhausted.
    /// - [`ScraperError::Deserialize`] — response body is not valid JSON.
    pub async fn fetch_products_page(
        &self,
        store_url: &str,
        limit: u32,
        page: u32,
    ) -> Result<ShopifyProductsResponse, ScraperError> {
        let url = Self::products_url(store_url, limit, page)?;
        let referer = extract_store_origin(store_url);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let referer = referer.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .header(reqwest::header::REFERER, &referer)
                    .header(reqwest::header::CACHE_CONTROL, "no-cache")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);

                    return Err(ScraperError::RateLimited {
                        domain: extract_domain(&url),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<ShopifyProductsResponse>(&body).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("products page {page} from {url}"),
                        source: e,
                    }
                })
            }
        })
        .await
    }

    /// Builds the `products.json` URL for the given store, page size, and
    /// 1-based page number.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidStoreUrl`] if the extracted origin cannot
    /// be parsed as a valid URL base.
    fn products_url(store_url: &str, limit: u32, page: u32) -> Result<String, ScraperError> {
        let origin = extract_store_origin(store_url);
        let base = format!("{origin}/products.json");
        let mut url = reqwest::Url::parse(&base).map_err(|e| ScraperError::InvalidStoreUrl {
            store_url: store_url.to_owned(),
            reason: format!("origin \"{origin}\" is not a valid URL base: {e}"),
        })?;

        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("page", &page.to_string());

        Ok(url.to_string())
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;

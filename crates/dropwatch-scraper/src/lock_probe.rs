//! Password-page detection for a storefront root.
//!
//! A locked store either redirects `/` to `/password` or serves the password
//! prompt in place. Redirects are followed by hand so the `Location` of each
//! hop can be inspected.

use std::sync::LazyLock;
use std::time::Duration;

use dropwatch_core::LockProbe;
use regex::Regex;
use reqwest::{redirect, Client, StatusCode, Url};

use crate::client::extract_store_origin;
use crate::error::ScraperError;

/// Maximum redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

static PASSWORD_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)storefront_password|action\s*=\s*["']/password["']|password-page|enter store using password|opening soon"#,
    )
    .expect("valid password markup regex")
});

/// Returns `true` if `body` contains password-prompt markup.
#[must_use]
pub fn has_password_markup(body: &str) -> bool {
    PASSWORD_MARKUP.is_match(body)
}

/// Probes a storefront root for a password gate.
pub struct LockProber {
    client: Client,
}

impl LockProber {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Probes the store and folds every failure into [`LockProbe::Unknown`].
    pub async fn probe(&self, store_url: &str) -> LockProbe {
        match self.probe_status(store_url).await {
            Ok(probe) => {
                tracing::debug!(store_url, probe = ?probe, "lock probe finished");
                probe
            }
            Err(e) => {
                tracing::warn!(store_url, error = %e, "lock probe failed — treating as unknown");
                LockProbe::Unknown
            }
        }
    }

    /// Probes the store root, following at most [`MAX_REDIRECTS`] redirects.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidStoreUrl`] — the store URL has no usable origin.
    /// - [`ScraperError::Http`] — network or TLS failure.
    /// - [`ScraperError::UnexpectedStatus`] — 5xx, or 4xx without password markup.
    /// - [`ScraperError::TooManyRedirects`] — redirect chain longer than the limit.
    pub async fn probe_status(&self, store_url: &str) -> Result<LockProbe, ScraperError> {
        let origin = extract_store_origin(store_url);
        let mut url = Url::parse(&format!("{origin}/")).map_err(|e| {
            ScraperError::InvalidStoreUrl {
                store_url: store_url.to_owned(),
                reason: e.to_string(),
            }
        })?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .get(url.clone())
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await?;
            let status = response.status();

            if status.is_redirection() {
                let Some(next) = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| url.join(loc).ok())
                else {
                    return Ok(LockProbe::Unlocked);
                };
                if is_password_path(&next) {
                    return Ok(LockProbe::Locked);
                }
                url = next;
                continue;
            }

            if status.is_server_error() {
                return Err(unexpected_status(status, &url));
            }

            let body = response.text().await?;
            if has_password_markup(&body) {
                return Ok(LockProbe::Locked);
            }
            if status.is_success() {
                return Ok(LockProbe::Unlocked);
            }
            return Err(unexpected_status(status, &url));
        }

        Err(ScraperError::TooManyRedirects {
            url: origin,
            limit: MAX_REDIRECTS,
        })
    }
}

fn is_password_path(url: &Url) -> bool {
    url.path().trim_end_matches('/') == "/password"
}

fn unexpected_status(status: StatusCode, url: &Url) -> ScraperError {
    ScraperError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
    }
}

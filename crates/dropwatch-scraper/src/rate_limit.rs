//! Retry with exponential back-off for storefront requests.
//!
//! Transient failures (429, network errors) are retried; everything else is
//! returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on a single back-off sleep, including server-requested
/// `Retry-After` values.
const MAX_DELAY_SECS: u64 = 120;

/// Returns `true` if `err` is transient and worth another attempt.
///
/// Retriable: [`ScraperError::RateLimited`] and [`ScraperError::Http`].
/// Status errors, bad JSON, redirect loops and invalid URLs are not.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. } | ScraperError::Http(_)
    )
}

/// Seconds to wait before retry number `attempt + 1`.
///
/// `backoff_base_secs * 2^attempt`, raised to the server's `Retry-After`
/// when rate limited, and capped at [`MAX_DELAY_SECS`].
fn backoff_delay_secs(err: &ScraperError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let computed = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    let requested = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => *retry_after_secs,
        _ => 0,
    };
    computed.max(requested).min(MAX_DELAY_SECS)
}

/// Executes `operation`, retrying transient errors up to `max_retries`
/// additional times with exponential back-off.
///
/// | Attempt | Sleep before next attempt (`backoff_base_secs = 1`) |
/// |---------|------------------------------------------------------|
/// | 0 (initial) | none |
/// | 1 | 1 s (or `Retry-After`, if larger) |
/// | 2 | 2 s |
/// | 3 | 4 s |
///
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = if backoff_base_secs == 0 {
            0
        } else {
            backoff_delay_secs(&err, attempt, backoff_base_secs)
        };
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient storefront error — retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

//! Retry with exponential back-off and jitter for the X client.
//!
//! [`retry_with_backoff`] wraps a single post attempt and retries failures
//! that happened before X accepted it, a bounded number of times. A rate limit whose requested wait is
//! longer than [`MAX_DELAY_MS`] is returned immediately: the job does not
//! stall for a full rate-limit window.

use std::future::Future;
use std::time::Duration;

use crate::error::NotifyError;

/// Upper bound on a single back-off sleep.
pub(crate) const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// A post is not idempotent, so only failures where X never accepted the
/// request are retried:
/// - [`NotifyError::RateLimited`] with no wait or a wait within [`MAX_DELAY_MS`].
/// - Connection failures, where the request never reached the server.
///
/// A timeout or a 5xx may follow an accepted post; re-sending it could
/// publish the message twice, so those fail the delivery instead.
pub(crate) fn is_retriable(err: &NotifyError) -> bool {
    match err {
        NotifyError::RateLimited { retry_after_secs } => {
            retry_after_secs.is_none_or(|secs| secs.saturating_mul(1_000) <= MAX_DELAY_MS)
        }
        NotifyError::Http(e) => e.is_connect(),
        NotifyError::Rejected { .. } | NotifyError::Deserialize { .. } | NotifyError::Config(_) => {
            false
        }
    }
}

/// Milliseconds to sleep before retry number `attempt` (1-based).
///
/// `backoff_base_ms * 2^(attempt-1)` with ±25 % jitter, raised to the
/// server's `Retry-After`, capped at [`MAX_DELAY_MS`].
fn backoff_delay_ms(err: &NotifyError, attempt: u32, backoff_base_ms: u64) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    let requested = match err {
        NotifyError::RateLimited {
            retry_after_secs: Some(secs),
        } => secs.saturating_mul(1_000),
        _ => 0,
    };
    jittered.max(requested).min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
///
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NotifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = if backoff_base_ms == 0 {
                    0
                } else {
                    backoff_delay_ms(&err, attempt, backoff_base_ms)
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "X API transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

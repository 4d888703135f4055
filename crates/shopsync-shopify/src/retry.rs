//! Exponential back-off with jitter for Admin API page requests.
//!
//! Only transient conditions are retried. Auth failures, 404s, and other
//! non-2xx statuses come back the same on every attempt and are returned
//! immediately, as are body parse failures.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:** [`ShopifyError::RateLimited`] (HTTP 429) and
/// [`ShopifyError::Http`] (connect failure, timeout, reset).
///
/// **Not retriable:** everything else, including
/// [`ShopifyError::Unauthorized`] and [`ShopifyError::Deserialize`].
pub(crate) fn is_retriable(err: &ShopifyError) -> bool {
    matches!(
        err,
        ShopifyError::RateLimited { .. } | ShopifyError::Http(_)
    )
}

/// Computes the sleep before retry number `attempt` (1-based).
///
/// `backoff_base_ms × 2^(attempt-1)`, capped at 60 s, then scaled by a random
/// factor in `[0.75, 1.25)`. A 429 never waits less than its `Retry-After`.
fn retry_delay_ms(attempt: u32, backoff_base_ms: u64, err: &ShopifyError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

    match err {
        ShopifyError::RateLimited { retry_after_secs } => {
            jittered.max(retry_after_secs.saturating_mul(1000).min(MAX_DELAY_MS))
        }
        _ => jittered,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// With `max_retries = 2` the operation runs at most 3 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
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
                let delay_ms = retry_delay_ms(attempt, backoff_base_ms, &err);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Admin API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

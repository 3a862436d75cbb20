//! Retry with exponential back-off and jitter for conversion dispatch.
//!
//! Dispatch runs with zero retries by default. Because every event carries
//! the lead id as `external_id`, a repeated delivery is deduplicated by the
//! receiving platform, so turning retries on does not change the caller's
//! contract.

use std::future::Future;
use std::time::Duration;

use crate::error::DispatchError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, and HTTP 5xx answers.
///
/// **Not retriable:** missing configuration, invalid events, 4xx answers
/// (bad token, malformed payload), and unparseable bodies.
pub(crate) fn is_retriable(err: &DispatchError) -> bool {
    match err {
        DispatchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        DispatchError::Upstream { status, .. } => *status >= 500,
        DispatchError::Validation(_)
        | DispatchError::Configuration(_)
        | DispatchError::Deserialize { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// The n-th retry waits `backoff_base_ms × 2^(n-1)` ± 25 % jitter, capped at
/// 30 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DispatchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DispatchError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "conversion dispatch failed transiently, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

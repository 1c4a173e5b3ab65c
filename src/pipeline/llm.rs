//! The completion call, with optional retries.
//!
//! All prompt wording lives in [`crate::prompts`]; this module only sends the
//! two turns and decides whether a failure is worth another attempt.
//!
//! ## Retry Strategy
//!
//! The default is a single attempt. With `max_retries > 0`, retryable
//! failures (transport errors, 5xx, 429, timeouts) back off exponentially
//! (`retry_backoff_ms * 2^(attempt-1)`): with 500 ms base and 3 retries the
//! waits are 500 ms → 1 s → 2 s. Authentication failures stop immediately.
//! Whatever happens, the caller sees one result.

use crate::client::{Completion, CompletionClient};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Send the prompt and return the completion plus the number of retries used.
pub async fn request_completion(
    client: &dyn CompletionClient,
    system: &str,
    prompt: &str,
    config: &AnalysisConfig,
) -> Result<(Completion, u32), AnalysisError> {
    let mut attempt: u32 = 0;

    loop {
        if attempt > 0 {
            let backoff = config
                .retry_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!(
                "{}: retry {}/{} after {}ms",
                client.name(),
                attempt,
                config.max_retries,
                backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match client.complete(system, prompt).await {
            Ok(completion) => {
                debug!(
                    "{}: completion after {} attempt(s)",
                    client.name(),
                    attempt + 1
                );
                return Ok((completion, attempt));
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", client.name(), attempt + 1, e);
                if attempt >= config.max_retries || !e.is_retryable() {
                    return Err(e);
                }
                attempt += 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_retry(attempt, config.max_retries, &e.to_string());
                }
            }
        }
    }
}

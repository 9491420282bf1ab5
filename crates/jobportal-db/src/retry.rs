//! Retry policy with exponential backoff and jitter.
//!
//! Used for the initial database connect so a database that is still booting
//! (common under docker-compose) does not take the API down with it.

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tracing::{info_span, warn, Instrument};

use crate::error::{DbError, DbResult};

// =============================================================================
// Configuration
// =============================================================================

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_retries: lookup("DB_CONNECT_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            base_delay_ms: lookup("DB_RETRY_BASE_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.base_delay_ms),
            max_delay_ms: lookup("DB_RETRY_MAX_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_delay_ms),
        }
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Execute an async operation with retry.
///
/// Retries only errors for which [`DbError::is_retryable`] holds; anything
/// else is returned immediately.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> DbResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let mut attempt = 0;

    loop {
        let span = info_span!("db_retry", operation = %operation, attempt = attempt + 1);

        match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_delay(config, attempt);

                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Database operation failed, retrying: {}",
                    e
                );
                counter!("jobportal_db_retries_total", "operation" => operation.to_string())
                    .increment(1);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Calculate retry delay with exponential backoff and full jitter.
fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    // base * 2^attempt
    let exp_delay = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = exp_delay.min(config.max_delay_ms);

    let jittered = ((capped_delay as f64) * rand::random::<f64>()) as u64;

    Duration::from_millis(jittered.max(config.base_delay_ms).min(config.max_delay_ms))
}

// =============================================================================
// Tests
// =============================================================================

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Abort,
}

/// Run `f` until it succeeds, `policy` says abort, or attempts run out.
/// The last error is returned as-is.
pub async fn retry_with_policy<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
    policy: impl Fn(&E) -> RetryDecision,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let e = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if policy(&e) == RetryDecision::Abort {
            log::error!("❌ {} aborted: {}", operation_name, e);
            return Err(e);
        }
        if attempt >= max_attempts {
            log::error!("❌ {} failed after {} attempts: {}", operation_name, attempt, e);
            return Err(e);
        }

        log::warn!(
            "⚠️ {} failed (attempt {}/{}): {}",
            operation_name,
            attempt,
            max_attempts,
            e
        );
        let delay = calculate_delay(config, attempt);
        log::info!("Retrying {} in {:?}...", operation_name, delay);
        sleep(delay).await;
        attempt += 1;
    }
}

/// Exponential backoff with ±25% jitter, capped at `max_delay`.
fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponential = config.exponential_base.powi(attempt.saturating_sub(1) as i32);
    let delay_ms = (config.base_delay.as_millis() as f64 * exponential) as u64;

    let jitter = delay_ms / 4;
    let jittered = delay_ms - jitter + rand::thread_rng().gen_range(0..=jitter * 2);

    Duration::from_millis(jittered.min(config.max_delay.as_millis() as u64))
}

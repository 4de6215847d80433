use std::fmt::Display;
use std::future::Future;

/// Additional attempts after the first failure.
pub const MAX_RETRIES: u32 = 3;

/// Runs `op` until it succeeds or `retries` extra attempts are used up, then
/// returns the last error. Attempts are numbered from 1 and run back to back.
pub async fn with_retry<T, E, F, Fut>(label: &str, retries: u32, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut remaining = retries;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if remaining > 0 => {
                remaining -= 1;
                tracing::warn!(
                    "🔁 {} failed (attempt {}/{}), {} retries left: {}",
                    label,
                    attempt,
                    retries + 1,
                    remaining,
                    e
                );
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("❌ {} failed after {} attempts: {}", label, attempt, e);
                return Err(e);
            }
        }
    }
}

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Result of a retried operation together with how many attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: common::Result<T>,
    pub attempts: u32,
}

/// Runs `operation` up to `retries + 1` times, sleeping `delay` between attempts.
pub async fn retry_with_fixed_delay<T, F, Fut>(
    label: &str,
    mut retries: u32,
    delay: Duration,
    operation: F,
) -> Attempted<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = common::Result<T>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts,
                };
            }
            Err(e) => {
                if retries == 0 {
                    return Attempted {
                        result: Err(e),
                        attempts,
                    };
                }

                warn!(
                    task = label,
                    attempt = attempts,
                    remaining = retries,
                    error = %e,
                    "Attempt failed, retrying after {:?}",
                    delay
                );
                retries -= 1;
                sleep(delay).await;
            }
        }
    }
}

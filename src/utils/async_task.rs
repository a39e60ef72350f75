use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tracing::warn;

use crate::BackoffPolicy;
use crate::Error;
use crate::Result;

/// Runs `task` once under a deadline
pub(crate) async fn task_with_timeout<T, P>(
    task: T,
    timeout_duration: Duration,
) -> Result<P>
where
    T: Future<Output = Result<P>>,
{
    match timeout(timeout_duration, task).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(timeout_duration)),
    }
}

/// Retries `task` with a per-attempt deadline and doubling delay between
/// attempts, capped at `policy.max_delay_ms`. Returns the last error once
/// `policy.max_retries` attempts are spent.
pub(crate) async fn task_with_timeout_and_exponential_backoff<F, T, P>(
    task: F,
    policy: BackoffPolicy,
) -> Result<P>
where
    F: Fn() -> T,
    T: Future<Output = Result<P>>,
{
    let attempts = policy.max_retries.max(1);
    let timeout_duration = Duration::from_millis(policy.timeout_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let mut delay = Duration::from_millis(policy.base_delay_ms);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match task_with_timeout(task(), timeout_duration).await {
            Ok(r) => return Ok(r),
            Err(e) => e,
        };

        if attempt >= attempts {
            warn!(attempt, "task failed after max retries: {}", error);
            return Err(error);
        }

        warn!(attempt, "task failed, retrying in {:?}: {}", delay, error);
        sleep(delay).await;
        delay = (delay * 2).min(max_delay);
    }
}

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("loading {what} failed after {attempts} attempts: {last}")]
    Exhausted {
        what: String,
        attempts: u32,
        last: String,
    },
}

/// Runs `op` up to [`MAX_ATTEMPTS`] times with a fixed [`RETRY_DELAY`]
/// between attempts. Only the final failure escapes.
pub async fn load_with_retry<T, E, F, Fut>(what: &str, mut op: F) -> Result<T, LoadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut last_error = String::new();

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            warn!(
                "loading {} attempt {} failed, retrying after {}ms: {}",
                what,
                attempt,
                RETRY_DELAY.as_millis(),
                last_error
            );
            tokio::time::sleep(RETRY_DELAY).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(LoadError::Exhausted {
        what: what.to_string(),
        attempts: MAX_ATTEMPTS,
        last: last_error,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let start = Instant::now();

        let value = load_with_retry("presets", || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("offline #{n}"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), RETRY_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_three_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = load_with_retry("presets", || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<(), _>(format!("offline #{n}"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(
            err,
            LoadError::Exhausted {
                what: "presets".into(),
                attempts: 3,
                last: "offline #3".into(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_wait() {
        let start = Instant::now();
        let value = load_with_retry("x", || async { Ok::<_, String>(7) }).await;
        assert_eq!(value, Ok(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

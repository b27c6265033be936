use std::time::Duration;
use tokio::time::sleep;

/// Classification of a failed attempt.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Transient failure worth another attempt. Returned by `with_retry` once
    /// the attempts are exhausted.
    Retryable(E),
    /// Permanent failure, returned immediately.
    NonRetryable(E),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    /// Fixed pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

pub async fn with_retry<F, T, E>(mut func: F, config: &RetryConfig) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, RetryError<E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match func() {
            Ok(result) => return Ok(result),
            Err(RetryError::Retryable(err)) if attempt < max_attempts => {
                log::info!(
                    "Retry attempt {}/{} after {:?}: {}",
                    attempt + 1,
                    max_attempts,
                    config.delay,
                    err
                );
                sleep(config.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let mut calls = 0;
        let result: Result<u32, RetryError<&str>> = with_retry(
            || {
                calls += 1;
                if calls < 3 {
                    Err(RetryError::Retryable("busy"))
                } else {
                    Ok(calls)
                }
            },
            &fast(5),
        )
        .await;
        assert_eq!(result.ok(), Some(3));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), RetryError<&str>> = with_retry(
            || {
                calls += 1;
                Err(RetryError::Retryable("busy"))
            },
            &fast(4),
        )
        .await;
        assert!(matches!(result, Err(RetryError::Retryable("busy"))));
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn test_non_retryable_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), RetryError<&str>> = with_retry(
            || {
                calls += 1;
                Err(RetryError::NonRetryable("disk full"))
            },
            &fast(5),
        )
        .await;
        assert!(matches!(result, Err(RetryError::NonRetryable(_))));
        assert_eq!(calls, 1);
    }
}

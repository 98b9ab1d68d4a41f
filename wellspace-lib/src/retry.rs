//! Retry policy for read requests.

use std::future::Future;
use std::time::Duration;

use crate::error::Error;
use crate::error::ErrorKind;

/// Configuration for retrying read requests.
///
/// Only network and server failures are retried, with a linear backoff of
/// `initial_delay × attempt` capped at `max_delay`. Validation, auth and
/// not-found failures are returned at once.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wellspace_lib::retry::RetryConfig;
///
/// let config = RetryConfig::default()
///     .max_retries(4)
///     .initial_delay(Duration::from_millis(250));
///
/// let no_retry = RetryConfig::no_retry();
/// assert_eq!(no_retry.max_retries, 0);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; later retries wait a multiple of it.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Whether to retry server failures.
    pub retry_on_server: bool,
    /// Whether to retry network failures.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            retry_on_server: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    /// Creates a config with all retries disabled.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            retry_on_server: false,
            retry_on_network: false,
            ..Default::default()
        }
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the base delay.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables retry on server failures.
    pub fn retry_on_server(mut self, enabled: bool) -> Self {
        self.retry_on_server = enabled;
        self
    }

    /// Enables or disables retry on network failures.
    pub fn retry_on_network(mut self, enabled: bool) -> Self {
        self.retry_on_network = enabled;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(attempt).min(self.max_delay)
    }

    fn should_retry(&self, err: &Error) -> bool {
        match err.kind() {
            ErrorKind::Network => self.retry_on_network,
            ErrorKind::Server => self.retry_on_server,
            _ => false,
        }
    }
}

/// Runs `op`, retrying retryable failures per `config`.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_retries && config.should_retry(&err) => {
                attempt += 1;
                let delay = config.delay_for(attempt);
                log::debug!("Retrying after {delay:?} (attempt {attempt}): {err}");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn test_linear_backoff_is_capped() {
        let config = RetryConfig::default().max_delay(Duration::from_millis(2_500));
        assert_eq!(config.delay_for(1), Duration::from_secs(1));
        assert_eq!(config.delay_for(2), Duration::from_secs(2));
        assert_eq!(config.delay_for(3), Duration::from_millis(2_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_server_errors_until_success() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result = with_retry(&RetryConfig::default(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::server("busy"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Error> = with_retry(&RetryConfig::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Network("refused".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_retries_client_errors() {
        for err in [
            Error::validation("bad"),
            Error::Authentication("expired".into()),
            Error::Authorization("not yours".into()),
            Error::NotFound("gone".into()),
        ] {
            let calls = AtomicU32::new(0);
            let result: Result<(), Error> = with_retry(&RetryConfig::default(), || {
                let err = err.clone();
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(err)
                }
            })
            .await;
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_config() {
        let calls = AtomicU32::new(0);
        let _: Result<(), Error> = with_retry(&RetryConfig::no_retry(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::server("down"))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Bounded retry with jittered exponential backoff for idempotent network calls

use anyhow::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Categorizes a failed network call for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, DNS, refused or reset connection
    Network,
    /// HTTP 5xx
    Server,
    /// HTTP 429
    RateLimited,
    /// HTTP 4xx other than 429; asking again gets the same answer
    Client,
    /// Response arrived but the payload is unusable
    Integrity,
    Unknown,
}

impl FailureKind {
    /// Classify an error by its message
    #[must_use]
    pub fn classify(error: &anyhow::Error) -> Self {
        let msg = format!("{error:#}").to_lowercase();

        if let Some(status) = http_status_in(&msg) {
            return match status {
                429 => Self::RateLimited,
                500.. => Self::Server,
                _ => Self::Client,
            };
        }
        if msg.contains("too many requests") {
            return Self::RateLimited;
        }
        if msg.contains("below the") && msg.contains("threshold") {
            return Self::Integrity;
        }
        if msg.contains("timeout")
            || msg.contains("timed out")
            || msg.contains("connection refused")
            || msg.contains("connection reset")
            || msg.contains("dns")
            || msg.contains("error sending request")
        {
            return Self::Network;
        }
        Self::Unknown
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Server | Self::RateLimited | Self::Unknown => true,
            Self::Client | Self::Integrity => false,
        }
    }

    #[must_use]
    pub const fn delay_multiplier(&self) -> f64 {
        match self {
            Self::RateLimited => 3.0,
            _ => 1.0,
        }
    }
}

/// Pulls `NNN` out of messages shaped like `HTTP status NNN`.
fn http_status_in(msg: &str) -> Option<u16> {
    let rest = &msg[msg.find("http status ")? + "http status ".len()..];
    let code: String = rest.chars().take_while(char::is_ascii_digit).collect();
    code.parse().ok().filter(|c| (400..600).contains(c))
}

/// How many times to retry and how long the first backoff is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::utils::constants::MAX_NETWORK_RETRIES,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt * multiplier`, stretched by a random factor in `[1, 2)`
    fn delay_for(&self, attempt: u32, kind: FailureKind) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * f64::from(2u32.saturating_pow(attempt));
        let jitter = 1.0 + rand::rng().random_range(0.0..1.0);
        Duration::from_secs_f64(exponential * kind.delay_multiplier() * jitter)
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// policy's retries are used up.
pub async fn retry_with_backoff<F, Fut, T>(policy: RetryPolicy, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let kind = FailureKind::classify(&e);
                if !kind.is_retryable() {
                    return Err(e);
                }
                if retries >= policy.max_retries {
                    warn!("Giving up after {} retries: {e:#}", policy.max_retries);
                    return Err(e);
                }

                let delay = policy.delay_for(retries, kind);
                warn!(
                    "Retryable {kind:?} failure, attempt {}/{}, retrying in {}ms: {e:#}",
                    retries + 1,
                    policy.max_retries,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn classifies_statuses_and_transport_errors() {
        let kind = |m: &str| FailureKind::classify(&anyhow::anyhow!(m.to_string()));
        assert_eq!(kind("HTTP status 503 for photo"), FailureKind::Server);
        assert_eq!(kind("HTTP status 404 for photo"), FailureKind::Client);
        assert_eq!(kind("HTTP status 429 for photo"), FailureKind::RateLimited);
        assert_eq!(kind("operation timed out"), FailureKind::Network);
        assert_eq!(
            kind("asset payload of 43 bytes is below the 100 byte threshold"),
            FailureKind::Integrity
        );
        assert!(!FailureKind::Client.is_retryable());
        assert!(FailureKind::Server.is_retryable());
    }

    #[tokio::test]
    async fn retries_transient_failures_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<()> = retry_with_backoff(policy, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("connection reset by peer"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_fail_fast() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<()> = retry_with_backoff(policy, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("HTTP status 403 for photo"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

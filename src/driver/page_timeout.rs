//! Timeout wrapper for page operations
//!
//! Every browser call the engine makes is bounded; a timeout degrades the
//! current strategy instead of hanging the run.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

/// Run `operation` with an upper bound.
///
/// # Returns
/// * `Ok(T)` - Operation completed in time
/// * `Err` - The operation failed, or timed out as a
///   `ScrapeError::TransientNavigation` wrapped in `anyhow`
pub async fn with_timeout<F, T>(operation: F, limit: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::timeout(operation_name, limit).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_timeouts_by_name() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, anyhow::Error>(())
        };
        let err = with_timeout(slow, Duration::from_millis(10), "dismiss interstitial")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("dismiss interstitial timed out after"));
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::TransientNavigation { .. })
        ));
    }

    #[tokio::test]
    async fn passes_through_results() {
        let value = with_timeout(async { Ok(7) }, Duration::from_secs(1), "noop")
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}

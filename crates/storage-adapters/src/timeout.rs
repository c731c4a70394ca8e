//! Per-call deadlines for adapters that talk to something outside the process.

use std::future::Future;
use std::time::Duration;

use domains::{AppError, Result};
use tracing::warn;

/// Runs `fut` under `limit`. An elapsed deadline becomes `AppError::Timeout(op)`.
pub async fn bounded<T, F>(op: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(op, limit_ms = limit.as_millis() as u64, "store call exceeded its deadline");
            Err(AppError::Timeout(op.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_call_becomes_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, AppError>(1)
        };
        let err = bounded("threads.find_by_id", Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(op) if op == "threads.find_by_id"));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let value = bounded("ok", Duration::from_secs(1), async { Ok::<_, AppError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}

//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::GateError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, GateError>>,
) -> Result<T, GateError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(GateError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_future_maps_to_timeout_error() {
        let result: Result<(), GateError> = with_timeout(Duration::from_millis(250), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(GateError::Timeout(250))));
    }

    #[tokio::test]
    async fn ready_future_passes_through() {
        let result = with_timeout(Duration::from_millis(250), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}

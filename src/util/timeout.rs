//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::DispatchError;

/// Wrap a provider future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, DispatchError>>,
) -> Result<T, DispatchError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout(duration.as_millis() as u64)),
    }
}

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::AppError;

/// Run a store-bound operation under a client-side deadline.
///
/// Expiry surfaces as `AppError::Timeout`; whatever the operation already wrote stays
/// written, so callers must not assume either outcome.
pub async fn with_deadline<T, F>(limit: Duration, op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    until(Instant::now() + limit, op).await
}

/// Like [`with_deadline`], against an absolute instant shared by several steps.
pub async fn until<T, F>(deadline: Instant, op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout_at(deadline, op).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Store request timed out");
            Err(AppError::Timeout)
        }
    }
}

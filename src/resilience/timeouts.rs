//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Cancel the in-flight exchange cleanly when it elapses
//!
//! Timed-out exchanges are transport failures and surface as 500, never 504.

use std::future::Future;
use std::time::Duration;

use crate::proxy::ForwardError;

/// Run `fut` to completion or fail with [`ForwardError::Timeout`] after `limit`.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, ForwardError>
where
    F: Future<Output = Result<T, ForwardError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ForwardError::Timeout(limit)),
    }
}

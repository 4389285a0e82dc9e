//! Error types for the nsqd stats client.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for stats fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching a stats snapshot.
///
/// Callers are not expected to branch on the variant: an unreachable
/// broker and a malformed document are handled the same way.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid nsqd address: {0}")]
    InvalidAddress(String),

    #[error("failed to fetch stats: {0}")]
    Request(String),

    #[error("nsqd responded with HTTP {0}")]
    Status(u16),

    #[error("stats request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to decode stats JSON: {0}")]
    Decode(String),
}

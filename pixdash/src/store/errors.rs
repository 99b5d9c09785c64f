//! Store-specific error types.

use thiserror::Error;

/// Unified error type for event-store reads that engine code can handle.
/// The engine never retries these; they surface as a generic 5xx at the API
/// boundary with the full chain logged.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A stored row carried a value the model cannot represent
    /// (e.g. an unknown status string)
    #[error("corrupt record in {entity}: {message}")]
    Decode { entity: &'static str, message: String },

    /// Catch-all for non-recoverable read failures
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Other(anyhow::Error::new(err).context("event store query failed"))
    }
}

/// Type alias for store operation results
pub type Result<T> = std::result::Result<T, StoreError>;

//! Error types for collection operations.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by [`Collection`](super::Collection) on top of backend failures.
///
/// Backend errors pass through unchanged as `crate::Error::Backend`; these
/// variants cover what the typed layer adds: deadlines and (de)serialization
/// of records.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend did not answer before the operation deadline
    #[error("Operation '{operation}' on collection '{collection}' timed out after {timeout:?}")]
    Timeout {
        collection: String,
        operation: &'static str,
        timeout: Duration,
    },

    /// A record could not be turned into a document
    #[error("Serialization failed in collection '{collection}': {reason}")]
    SerializationFailed { collection: String, reason: String },

    /// A stored document could not be decoded into a record
    #[error("Deserialization failed in collection '{collection}': {reason}")]
    DeserializationFailed { collection: String, reason: String },

    /// A record serialized to something other than a JSON object
    #[error("Record for collection '{collection}' is not a JSON object")]
    NotADocument { collection: String },
}

impl StoreError {
    /// Check if this error is a missed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }

    /// Check if this error is a record encoding failure.
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
                | StoreError::NotADocument { .. }
        )
    }

    /// Get the collection name associated with this error.
    pub fn collection(&self) -> &str {
        match self {
            StoreError::Timeout { collection, .. }
            | StoreError::SerializationFailed { collection, .. }
            | StoreError::DeserializationFailed { collection, .. }
            | StoreError::NotADocument { collection } => collection,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}

//! Error types for the document store backends.
//!
//! Structured variants let callers tell a uniqueness violation apart from
//! an I/O failure without matching on strings.

use thiserror::Error;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A write collided with an existing value of a uniquely indexed field.
    #[error("Duplicate key in collection '{collection}': {field} = {value}")]
    DuplicateKey {
        /// The collection written to
        collection: String,
        /// The uniquely indexed field (`_id` for the primary key)
        field: String,
        /// The colliding value, JSON encoded
        value: String,
    },

    /// Document lacks a usable `_id`.
    #[error("Document in collection '{collection}' has no string _id")]
    MissingId {
        /// The collection written to
        collection: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Persistence file was written by an incompatible version.
    #[error("Unsupported persistence version {found}; expected {expected}")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// SQL database error.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of the failure with context
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error is a uniqueness violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, BackendError::DuplicateKey { .. })
    }

    /// Get the violated field if this is a uniqueness violation.
    pub fn duplicate_field(&self) -> Option<&str> {
        match self {
            BackendError::DuplicateKey { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Check if this error is related to I/O or encoding of stored data.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
                | BackendError::UnsupportedVersion { .. }
        )
    }

    /// Check if the caller handed in an unusable document.
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, BackendError::MissingId { .. })
    }

    /// Check if this error came from the SQL layer.
    pub fn is_sql_error(&self) -> bool {
        #[cfg(any(feature = "sqlite", feature = "postgres"))]
        {
            matches!(self, BackendError::SqlxError { .. })
        }
        #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
        {
            false
        }
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}

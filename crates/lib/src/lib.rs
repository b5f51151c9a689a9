//!
//! Userbase: user accounts kept in a document store.
//! This library provides the storage and authentication core used by the `userbase` server.
//!
//! ## Core Concepts
//!
//! * **Backends (`backend::BackendImpl`)**: A pluggable document store. Documents are JSON objects
//!   grouped into named collections. Implementations: `InMemory` and `SqlxBackend` (SQLite, PostgreSQL).
//! * **Filters (`backend::Filter`)**: Conjunctions of field equality conditions used to select documents.
//! * **Collections (`store::Collection`)**: A typed, timeout-bounded handle over one named collection.
//! * **Users (`user::UserRepository`)**: The `user` collection, with password hashing and a unique
//!   username index enforced by the backend.
//! * **Authentication (`user::Authenticator`)**: Password verification and signed token issuance.

pub mod backend;
pub mod clock;
pub mod constants;
pub mod store;
pub mod user;

pub use clock::{Clock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the Userbase library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Userbase library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured collection errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured user and authentication errors from the user module
    #[error(transparent)]
    User(user::UserError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Store(_) => "store",
            Error::User(_) => "user",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_duplicate_key(),
            Error::User(user_err) => user_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error indicates an operation ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error is caused by caller input rather than the system.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error is a serialization or decoding failure.
    pub fn is_serialization_error(&self) -> bool {
        match self {
            Error::Serialize(_) => true,
            Error::Store(store_err) => store_err.is_serialization_error(),
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}

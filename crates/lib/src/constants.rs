//! Constants used throughout the Userbase library.
//!
//! Central definitions for collection names, reserved document fields and
//! default limits.

use std::time::Duration;

/// Collection holding user records.
pub const USERS: &str = "user";

/// Reserved document field carrying the primary key.
pub const ID_FIELD: &str = "_id";

/// Natural lookup key of a user record. Uniquely indexed.
pub const USERNAME_FIELD: &str = "username";

/// Upper bound for a single collection operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Length in bytes of a generated token signing secret.
pub const GENERATED_SECRET_LENGTH: usize = 32;

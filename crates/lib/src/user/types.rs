//! Core data types for the user system

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Account role, carried into token claims.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record stored in the `user` collection
///
/// `username` is the natural key and is uniquely indexed by the backend.
/// Records are written once by sign-up and never updated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Random UUIDv4, assigned at creation
    #[serde(rename = "_id")]
    pub id: String,

    /// Login identifier, case-sensitive
    pub username: String,

    /// Argon2id PHC string
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,

    /// Creation time in Unix seconds
    #[serde(default)]
    pub created_at: i64,
}

impl User {
    /// The caller-facing projection of this record.
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// What callers get to see of a user. Never includes the hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: i64,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Credentials submitted by a client.
///
/// The plaintext password is wiped from memory when the form is dropped.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct UserForm {
    #[zeroize(skip)]
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl UserForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Presence check: both fields must be non-empty.
    pub fn validate(&self) -> Result<(), super::UserError> {
        if self.username.is_empty() {
            return Err(super::UserError::InvalidForm {
                reason: "username is required".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(super::UserError::InvalidForm {
                reason: "password is required".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for UserForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub token: String,
    /// Token expiry in Unix seconds
    pub expires_at: i64,
    pub user: UserView,
}

/// Outcome of deleting by username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Deletion {
    Deleted(User),
    /// A record was removed but could not be read back as a [`User`].
    DeletedUnreadable { id: String },
    NotFound,
}

impl Deletion {
    pub fn is_deleted(&self) -> bool {
        !matches!(self, Deletion::NotFound)
    }
}

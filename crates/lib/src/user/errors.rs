//! Error types for the user system
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found: {username}")]
    UserNotFound { username: String },

    #[error("Username already exists: {username}")]
    UsernameTaken { username: String },

    /// Covers both an unknown username and a wrong password
    #[error("Wrong username or password")]
    InvalidCredentials,

    #[error("Invalid form: {reason}")]
    InvalidForm { reason: String },

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },

    #[error("Stored password hash is malformed: {reason}")]
    MalformedHash { reason: String },

    #[error("Failed to issue token: {reason}")]
    TokenIssueFailed { reason: String },

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },
}

impl UserError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::UserNotFound { .. })
    }

    /// Check if this error indicates the username is already in use.
    pub fn is_conflict(&self) -> bool {
        matches!(self, UserError::UsernameTaken { .. })
    }

    /// Check if this error should be answered with "unauthorized".
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            UserError::InvalidCredentials | UserError::InvalidToken { .. }
        )
    }

    /// Check if this error is caused by the submitted form.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, UserError::InvalidForm { .. })
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}

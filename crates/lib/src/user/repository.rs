//! Data access for user records.

use std::sync::Arc;
use std::time::Duration;

use super::crypto::hash_password;
use super::errors::UserError;
use super::types::{Deletion, Role, User, UserForm};
use crate::backend::{BackendImpl, Filter, document_id};
use crate::constants::{USERNAME_FIELD, USERS};
use crate::store::Collection;
use crate::{Clock, Result, SystemClock};

/// The `user` collection.
///
/// Construct once at startup and share behind an `Arc`. Username uniqueness
/// is enforced by the backend's unique index, so `create` is a single insert
/// with no separate existence check.
#[derive(Debug, Clone)]
pub struct UserRepository {
    users: Collection,
    clock: Arc<dyn Clock>,
}

impl UserRepository {
    /// Bind the `user` collection and ensure the unique index on `username`.
    ///
    /// # Errors
    /// Fails if the index cannot be created, including when stored records
    /// already share a username.
    pub async fn new(backend: Arc<dyn BackendImpl>, timeout: Duration) -> Result<Self> {
        let users = Collection::new(backend, USERS).with_timeout(timeout);
        users.create_unique_index(USERNAME_FIELD).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to ensure unique username index");
        })?;
        Ok(Self {
            users,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for `created_at`.
    #[cfg(any(test, feature = "testing"))]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Every user record. Records that cannot be decoded are skipped.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        self.users
            .find_all(&Filter::all())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to list users"))
    }

    /// Look up a user. `Ok(None)` means no such user.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.users
            .find_one(&Filter::eq(USERNAME_FIELD, username))
            .await
            .inspect_err(|e| tracing::error!(username, error = %e, "Failed to look up user"))
    }

    /// Look up a user that must exist.
    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        self.find_by_username(username).await?.ok_or_else(|| {
            UserError::UserNotFound {
                username: username.to_string(),
            }
            .into()
        })
    }

    /// Create a member account from `form`.
    pub async fn create(&self, form: &UserForm) -> Result<User> {
        self.create_with_role(form, Role::Member).await
    }

    /// Create an account with an explicit role.
    ///
    /// # Errors
    /// * `UserError::InvalidForm` if a field is empty
    /// * `UserError::UsernameTaken` if the username is in use
    pub async fn create_with_role(&self, form: &UserForm, role: Role) -> Result<User> {
        form.validate()?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: form.username.clone(),
            password_hash: hash_password(&form.password)?,
            role,
            created_at: self.clock.now_secs(),
        };

        match self.users.insert_one(&user).await {
            Ok(()) => {
                tracing::info!(username = %user.username, id = %user.id, role = %user.role, "Created user");
                Ok(user)
            }
            Err(crate::Error::Backend(e)) if e.duplicate_field() == Some(USERNAME_FIELD) => {
                tracing::debug!(username = %user.username, "Username already taken");
                Err(UserError::UsernameTaken {
                    username: user.username,
                }
                .into())
            }
            Err(e) => {
                tracing::error!(username = %user.username, error = %e, "Failed to create user");
                Err(e)
            }
        }
    }

    /// Remove the user called `username`, returning what was removed.
    ///
    /// A record that no longer decodes is still removed and reported as
    /// `Deletion::DeletedUnreadable`.
    pub async fn delete_by_username(&self, username: &str) -> Result<Deletion> {
        let Some(document) = self
            .users
            .find_one_and_delete(&Filter::eq(USERNAME_FIELD, username))
            .await
            .inspect_err(|e| tracing::error!(username, error = %e, "Failed to delete user"))?
        else {
            return Ok(Deletion::NotFound);
        };

        let id = document_id(USERS, &document).unwrap_or_default();
        match self.users.decode::<User>(document) {
            Ok(user) => {
                tracing::info!(username, id = %user.id, "Deleted user");
                Ok(Deletion::Deleted(user))
            }
            Err(e) => {
                tracing::warn!(username, id = %id, error = %e, "Deleted undecodable user record");
                Ok(Deletion::DeletedUnreadable { id })
            }
        }
    }

    /// Number of stored user records.
    pub async fn count(&self) -> Result<u64> {
        self.users.count(&Filter::all()).await
    }
}

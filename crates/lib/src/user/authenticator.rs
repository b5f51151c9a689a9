//! Login and sign-up flows.

use std::sync::{Arc, OnceLock};

use super::crypto::{hash_password, verify_password};
use super::errors::UserError;
use super::repository::UserRepository;
use super::token::TokenIssuer;
use super::types::{AuthSession, User, UserForm};
use crate::Result;

/// Hash verified on logins for unknown usernames, so they cost the same
/// Argon2 work as a wrong password.
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| {
            hash_password("userbase-decoy")
                .inspect_err(|e| tracing::error!(error = %e, "Failed to prepare decoy hash"))
                .ok()
        })
        .as_deref()
}

/// Turns credentials into sessions.
///
/// Every rejection during login surfaces as `UserError::InvalidCredentials`,
/// whatever the underlying cause, so callers cannot probe which usernames
/// exist. The cause is logged.
#[derive(Debug, Clone)]
pub struct Authenticator {
    repo: Arc<UserRepository>,
    tokens: Arc<TokenIssuer>,
}

impl Authenticator {
    pub fn new(repo: Arc<UserRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { repo, tokens }
    }

    pub fn repository(&self) -> &Arc<UserRepository> {
        &self.repo
    }

    pub fn tokens(&self) -> &Arc<TokenIssuer> {
        &self.tokens
    }

    /// Verify `form` and issue a session token.
    ///
    /// # Errors
    /// * `UserError::InvalidForm` if a field is empty (nothing is looked up)
    /// * `UserError::InvalidCredentials` for any other rejection
    /// * `UserError::TokenIssueFailed` if signing fails
    pub async fn login(&self, form: &UserForm) -> Result<AuthSession> {
        form.validate()?;

        let user = self.check_credentials(form).await?;
        let issued = self.tokens.issue(&user)?;

        tracing::info!(username = %user.username, "User logged in");
        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.view(),
        })
    }

    async fn check_credentials(&self, form: &UserForm) -> Result<User> {
        let user = match self.repo.find_by_username(&form.username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(username = %form.username, "Login for unknown user");
                if let Some(hash) = decoy_hash() {
                    let _ = verify_password(&form.password, hash);
                }
                return Err(UserError::InvalidCredentials.into());
            }
            Err(e) => {
                tracing::warn!(username = %form.username, error = %e, "Login lookup failed");
                return Err(UserError::InvalidCredentials.into());
            }
        };

        match verify_password(&form.password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => {
                tracing::debug!(username = %form.username, "Wrong password");
                Err(UserError::InvalidCredentials.into())
            }
            Err(e) => {
                tracing::error!(username = %form.username, error = %e, "Stored password hash is unusable");
                Err(UserError::InvalidCredentials.into())
            }
        }
    }

    /// Register a new member account.
    pub async fn sign_up(&self, form: &UserForm) -> Result<User> {
        form.validate()?;
        self.repo.create(form).await
    }
}

//! User accounts
//!
//! Records live in the `user` collection of a [`BackendImpl`](crate::backend::BackendImpl).
//!
//! # Architecture
//!
//! - **UserRepository**: CRUD over user records; hashes passwords on create and
//!   maps unique-index violations to `UserError::UsernameTaken`
//! - **Authenticator**: password verification and token issuance
//! - **TokenIssuer**: HS256 JWT signing and verification
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! # use userbase::backend::database::InMemory;
//! # use userbase::constants::DEFAULT_OPERATION_TIMEOUT;
//! # use userbase::user::{Authenticator, TokenIssuer, UserForm, UserRepository};
//! # #[tokio::main]
//! # async fn main() -> userbase::Result<()> {
//! let repo = UserRepository::new(Arc::new(InMemory::new()), DEFAULT_OPERATION_TIMEOUT).await?;
//! let auth = Authenticator::new(Arc::new(repo), Arc::new(TokenIssuer::new("secret")));
//!
//! auth.sign_up(&UserForm::new("alice", "correct horse")).await?;
//! let session = auth.login(&UserForm::new("alice", "correct horse")).await?;
//! assert_eq!(session.user.username, "alice");
//! # Ok(())
//! # }
//! ```

mod authenticator;
pub mod crypto;
pub mod errors;
mod repository;
pub mod token;
pub mod types;

pub use authenticator::Authenticator;
pub use crypto::{hash_password, verify_password};
pub use errors::UserError;
pub use repository::UserRepository;
pub use token::{Claims, IssuedToken, TokenIssuer};
pub use types::{AuthSession, Deletion, Role, User, UserForm, UserView};

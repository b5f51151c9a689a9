//! HTTP interface.
//!
//! | Method | Path               | Handler        |
//! |--------|--------------------|----------------|
//! | POST   | `/login`           | `login`        |
//! | POST   | `/sign-up`         | `sign_up`      |
//! | GET    | `/users`           | `list_users`   |
//! | GET    | `/users/{username}`| `get_user`     |
//! | DELETE | `/users/{username}`| `delete_user`  |
//! | GET    | `/health`          | `health`       |

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use userbase::{
    backend::BackendImpl,
    user::{Authenticator, UserRepository},
};

pub use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserRepository>,
    pub auth: Authenticator,
    pub backend: Arc<dyn BackendImpl>,
}

impl AppState {
    pub fn new(backend: Arc<dyn BackendImpl>, auth: Authenticator) -> Self {
        Self {
            users: auth.repository().clone(),
            auth,
            backend,
        }
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/sign-up", post(handlers::sign_up))
        .route("/users", get(handlers::list_users))
        .route(
            "/users/{username}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}

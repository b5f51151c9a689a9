//! Request handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use userbase::user::{AuthSession, Deletion, UserError, UserForm, UserView};

use super::{ApiError, AppState};
use crate::backend::backend_kind;

/// Successful login
#[derive(Serialize)]
pub(crate) struct LoginResponse {
    #[serde(flatten)]
    session: AuthSession,
    error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct UserResponse {
    user: UserView,
    error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct UsersResponse {
    users: Vec<UserView>,
    error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct EmptyResponse {
    error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// Handler for POST /login
pub(crate) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(form) = payload?;
    let session = state.auth.login(&form).await?;
    Ok(Json(LoginResponse {
        session,
        error: None,
    }))
}

/// Handler for POST /sign-up
pub(crate) async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(form) = payload?;
    let user = state.auth.sign_up(&form).await?;
    Ok(Json(UserResponse {
        user: user.view(),
        error: None,
    }))
}

/// Handler for GET /users
pub(crate) async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.users.list_all().await?;
    Ok(Json(UsersResponse {
        users: users.iter().map(UserView::from).collect(),
        error: None,
    }))
}

/// Handler for GET /users/{username}
pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_by_username(&username).await?;
    Ok(Json(UserResponse {
        user: user.view(),
        error: None,
    }))
}

/// Handler for DELETE /users/{username}
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<EmptyResponse>, ApiError> {
    match state.users.delete_by_username(&username).await? {
        Deletion::NotFound => Err(UserError::UserNotFound { username }.into()),
        Deletion::Deleted(_) | Deletion::DeletedUnreadable { .. } => {
            Ok(Json(EmptyResponse { error: None }))
        }
    }
}

/// Handler for GET /health
pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: backend_kind(state.backend.as_ref()),
    })
}

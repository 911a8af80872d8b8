//! The endpoint for logging in with an email and password.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{AuthState, AuthenticatedUser, issue_token},
    user::get_user_by_email,
};

/// The request body for logging in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogInCredentials {
    /// The email address the user registered with.
    #[serde(default)]
    pub email: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// A route handler for logging in.
///
/// Responds with the user and a freshly issued bearer token.
///
/// # Errors
///
/// Returns a 400 Bad Request if a field is missing and a 401 Unauthorized if
/// the email is unknown or the password is wrong. The two cases share one
/// message so that callers cannot tell which emails are registered.
pub async fn post_log_in(
    State(state): State<AuthState>,
    payload: Result<Json<LogInCredentials>, JsonRejection>,
) -> Result<Json<AuthenticatedUser>, Error> {
    let Json(credentials) = payload?;

    let email = credentials.email.trim().to_lowercase();

    if email.is_empty() || credentials.password.is_empty() {
        return Err(Error::Validation("Please add all fields".to_owned()));
    }

    let user = {
        let connection = state.db_connection.lock()?;
        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&credentials.password)? {
        tracing::debug!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(user.id, &state.token_keys, state.token_duration)?;

    Ok(Json(AuthenticatedUser {
        id: user.id,
        name: user.name,
        email: user.email,
        token,
    }))
}

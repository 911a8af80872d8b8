//! The endpoint for registering a new user.

use std::str::FromStr;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{
    Error, PasswordHash, ValidatedPassword,
    auth::{AuthState, AuthenticatedUser, issue_token},
    user::create_user,
};

/// The request body for registering a new user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// The user's display name.
    #[serde(default)]
    pub name: String,
    /// The email address the user will log in with.
    #[serde(default)]
    pub email: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created, the new user and a bearer token.
///
/// # Errors
///
/// Returns a 400 Bad Request if a field is missing, the email is invalid or
/// already registered, or the password is too weak.
pub async fn register_user(
    State(state): State<AuthState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthenticatedUser>), Error> {
    let Json(registration) = payload?;

    let name = registration.name.trim();
    let email = registration.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || registration.password.is_empty() {
        return Err(Error::Validation("Please add all fields".to_owned()));
    }

    if EmailAddress::from_str(&email).is_err() {
        return Err(Error::InvalidEmail);
    }

    let password = ValidatedPassword::new(&registration.password, &[name, email.as_str()])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = {
        let connection = state.db_connection.lock()?;
        create_user(name, &email, password_hash, &connection)?
    };

    tracing::info!("Registered user {}", user.id);

    let token = issue_token(user.id, &state.token_keys, state.token_duration)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticatedUser {
            id: user.id,
            name: user.name,
            email: user.email,
            token,
        }),
    ))
}

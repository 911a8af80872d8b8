//! Authentication middleware that validates bearer tokens.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error, UserID,
    auth::{TokenKeys, verify_token},
    user::get_user_by_id,
};

/// The state needed for the auth middleware and the log-in/registration handlers.
#[derive(Clone)]
pub struct AuthState {
    /// The keys for signing and verifying bearer tokens.
    pub token_keys: TokenKeys,
    /// The duration for which newly issued tokens are valid.
    pub token_duration: Duration,
    /// The bcrypt cost used when hashing passwords of new users.
    pub password_hash_cost: u32,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The verified user ID is placed into the request extensions and the request
/// executed normally. Requests without a token, or with a token that is
/// invalid, expired, or belongs to a deleted user, are rejected with
/// 401 Unauthorized before reaching the handler.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => {
            return Error::MissingToken.into_response();
        }
        Err(rejection) => {
            tracing::debug!("Malformed authorization header: {rejection}");
            return Error::InvalidToken.into_response();
        }
    };

    let user_id = match authenticate(bearer.token(), &state) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

/// Resolve `token` to the ID of an existing user.
fn authenticate(token: &str, state: &AuthState) -> Result<UserID, Error> {
    let claims = verify_token(token, &state.token_keys)?;
    let connection = state.db_connection.lock()?;

    match get_user_by_id(claims.sub, &connection) {
        Ok(user) => Ok(user.id),
        Err(Error::NotFound) => {
            tracing::warn!("Token presented for unknown user {}", claims.sub);
            Err(Error::InvalidToken)
        }
        Err(error) => Err(error),
    }
}

//! A personal finance tracker.
//!
//! Users register and log in, record income and expense transactions, and
//! view aggregated statistics on a dashboard.
//!
//! This library provides a JSON REST API for the server side and, in
//! [client], the data layer used by front ends: a transaction cache kept in
//! sync with the server, derived views for filtering and sorting, and the
//! authentication session.

#![warn(missing_docs)]

use std::{net::SocketAddr, sync::PoisonError, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod app_state;
mod auth;
pub mod client;
mod date_format;
mod db;
pub mod endpoints;
mod logging;
mod not_found;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{AuthenticatedUser, LogInCredentials, Registration, TokenKeys};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use timezone::{get_local_offset, today_in};
pub use transaction::{
    MonthlyTotal, NewTransaction, StatsSnapshot, TitleTotal, Transaction, TransactionFields,
    TransactionId, TransactionType, compute_stats, create_transaction,
};
pub use user::{User, UserID, UserProfile, create_user};

/// The JSON body used for error responses and simple acknowledgements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// A human readable description of the outcome.
    pub message: String,
}

impl MessageBody {
    /// Create a message body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not install the Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested transaction does not exist.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Transaction not found")]
    NotFound,

    /// The caller tried to modify a transaction owned by another user.
    #[error("User not authorized")]
    NotOwner,

    /// The request did not include a bearer token.
    #[error("Not authorized, no token")]
    MissingToken,

    /// The bearer token could not be verified, has expired, or refers to a
    /// user that no longer exists.
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// The email and password did not match a registered user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request body was missing a required field or could not be parsed.
    #[error("{0}")]
    Validation(String),

    /// The email address used to register is not a valid email address.
    #[error("Please provide a valid email address")]
    InvalidEmail,

    /// The email address used to register already belongs to a user.
    #[error("User already exists")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("Password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::DatabaseLockError
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::NotOwner
            | Error::MissingToken
            | Error::InvalidToken
            | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Validation(_)
            | Error::InvalidEmail
            | Error::DuplicateEmail
            | Error::TooWeak(_) => StatusCode::BAD_REQUEST,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(MessageBody::new(self.to_string()))).into_response()
    }
}

//! The client side data layer for front ends.
//!
//! - [api] talks to the REST API, with the credential passed explicitly on
//!   every call.
//! - [cache] mirrors the user's transactions and statistics, applying local
//!   patches only after the server confirms a change.
//! - [view] filters, searches and sorts the cached transactions for display.
//! - [session] holds the logged in user, and [guard] decides whether a route
//!   may be shown.
//! - [dashboard] shapes statistics into chart series.

pub mod api;
pub mod cache;
pub mod dashboard;
pub mod guard;
pub mod session;
pub mod view;

use std::fmt::Debug;

pub use api::{AuthApi, HttpApi, TransactionApi};
pub use cache::{CacheAction, CacheState, TransactionCache};
pub use dashboard::{CategoryShare, MonthlyOverview, monthly_overview, top_expense_categories};
pub use guard::{Access, AuthorizedView, Route, guard};
pub use session::Session;
pub use view::{SortConfig, SortDirection, SortKey, TypeFilter, ViewSummary, derive_view};

/// The errors that client operations return.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The server rejected the request.
    #[error("server responded with {status}: {}", message.as_deref().unwrap_or("no message"))]
    Server {
        /// The HTTP status code.
        status: u16,
        /// The `message` from the response body, if there was one.
        message: Option<String>,
    },

    /// The request could not be sent or the response could not be read.
    #[error("could not reach the server: {0}")]
    Transport(String),

    /// The input was rejected before sending a request.
    #[error("{0}")]
    Invalid(String),

    /// The operation needs a logged in user.
    #[error("not logged in")]
    NotAuthenticated,
}

impl ClientError {
    /// The message to show to the user: the server's message or the local
    /// validation message, otherwise `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Invalid(message) => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}

/// A bearer token identifying the logged in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token issued by the server.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(********)")
    }
}

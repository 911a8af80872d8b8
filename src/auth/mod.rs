//! User registration, log-in, and bearer token authentication.

mod log_in;
mod middleware;
mod profile;
mod register_user;
mod token;

use serde::{Deserialize, Serialize};

use crate::UserID;

pub use log_in::{LogInCredentials, post_log_in};
pub use middleware::{AuthState, auth_guard};
pub use profile::get_profile;
pub use register_user::{Registration, register_user};
pub use token::{TokenKeys, issue_token, verify_token};

/// A logged in user and the bearer token that authenticates their requests.
///
/// This is the response body for registration and log-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// The user's ID.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// The bearer token to send with authenticated requests.
    pub token: String,
}

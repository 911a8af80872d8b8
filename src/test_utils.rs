#![allow(missing_docs)]

use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, User, ValidatedPassword,
    app_state::DEFAULT_TOKEN_DURATION,
    auth::issue_token,
    user::create_user,
};

/// The password for users created with [must_create_user].
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// Create an in-memory app state that hashes passwords with the minimum bcrypt cost.
#[track_caller]
pub(crate) fn must_create_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(connection, "42", "Etc/UTC", DEFAULT_TOKEN_DURATION)
        .expect("Could not create app state.")
        .with_password_hash_cost(4)
}

/// Register a user with [TEST_PASSWORD] and issue a token for them.
#[track_caller]
pub(crate) fn must_create_user(state: &AppState, name: &str, email: &str) -> (User, String) {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        state.password_hash_cost,
    )
    .expect("Could not hash password.");

    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock.");
        create_user(name, email, password_hash, &connection).expect("Could not create user.")
    };

    let token = issue_token(user.id, &state.token_keys, state.token_duration)
        .expect("Could not issue token.");

    (user, token)
}

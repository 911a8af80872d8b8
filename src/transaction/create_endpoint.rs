use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserID,
    timezone::today_in,
    transaction::{Transaction, TransactionFields, create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to date transactions that arrive without a date.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for creating a new transaction owned by the caller.
///
/// Responds with 201 Created and the stored transaction. Any owner in the
/// request body is ignored.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<TransactionFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(fields) = payload?;

    let today = today_in(&state.local_timezone).unwrap_or_else(|| {
        tracing::warn!(
            "Unknown timezone {}, dating transaction in UTC",
            state.local_timezone
        );
        OffsetDateTime::now_utc().date()
    });
    let new_transaction = fields.into_new_transaction(today)?;

    let connection = state.db_connection.lock()?;
    let transaction = create_transaction(user_id, new_transaction, &connection)?;

    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use rusqlite::Connection;

use crate::{
    Error, MessageBody, UserID,
    transaction::{TransactionId, TransactionState, get_owned_transaction},
};

/// A route handler for deleting a transaction owned by the caller.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<MessageBody>, Error> {
    let Ok(Path(transaction_id)) = path else {
        return Err(Error::NotFound);
    };

    let connection = state.db_connection.lock()?;
    delete_transaction(transaction_id, user_id, &connection)?;

    tracing::debug!("User {user_id} deleted transaction {transaction_id}");

    Ok(Json(MessageBody::new("Transaction removed")))
}

type RowsAffected = usize;

/// Delete the transaction `id` if it belongs to `owner`.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist,
/// [Error::NotOwner] if it belongs to another user, or [Error::SqlError].
pub fn delete_transaction(
    id: TransactionId,
    owner: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    get_owned_transaction(id, owner, connection)?;

    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, owner),
        )
        .map_err(|err| err.into())
}

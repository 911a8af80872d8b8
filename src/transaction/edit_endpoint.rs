use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use rusqlite::Connection;

use crate::{
    Error, UserID,
    transaction::{
        Transaction, TransactionFields, TransactionId, TransactionState, get_owned_transaction,
    },
};

/// A route handler for partially updating a transaction.
///
/// Responds with the transaction as stored after the update.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<TransactionId>, PathRejection>,
    payload: Result<Json<TransactionFields>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    // A path that is not an ID cannot name an existing transaction.
    let Ok(Path(transaction_id)) = path else {
        return Err(Error::NotFound);
    };
    let Json(fields) = payload?;

    let connection = state.db_connection.lock()?;

    update_transaction(transaction_id, user_id, fields, &connection).map(Json)
}

/// Apply `fields` to the transaction `id` owned by `owner`.
///
/// See [TransactionFields::apply_to] for which values are applied.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist,
/// [Error::NotOwner] if it belongs to another user, [Error::Validation] if the
/// amount is not a finite number, or [Error::SqlError].
pub fn update_transaction(
    id: TransactionId,
    owner: UserID,
    fields: TransactionFields,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let mut transaction = get_owned_transaction(id, owner, connection)?;
    fields.apply_to(&mut transaction)?;

    connection.execute(
        "UPDATE \"transaction\"
         SET title = ?1, amount = ?2, type = ?3, date = ?4, reference = ?5
         WHERE id = ?6 AND user_id = ?7",
        (
            &transaction.title,
            transaction.amount,
            transaction.kind,
            transaction.date,
            &transaction.reference,
            id,
            owner,
        ),
    )?;

    Ok(transaction)
}

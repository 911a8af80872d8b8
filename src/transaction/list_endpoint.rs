use axum::{Extension, Json, extract::State};
use rusqlite::Connection;

use crate::{
    Error, UserID,
    transaction::{Transaction, TransactionState, map_transaction_row},
};

/// A route handler that lists the caller's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.db_connection.lock()?;

    get_transactions_for_user(user_id, &connection).map(Json)
}

/// Get all transactions owned by `owner`, sorted by date descending.
///
/// Transactions on the same date are ordered newest ID first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_for_user(
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, title, amount, type, date, reference
             FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &owner)], map_transaction_row)?
        .map(|result| result.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        db::initialize,
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::create_user,
    };

    use super::get_transactions_for_user;

    #[test]
    fn lists_only_owned_transactions_newest_first() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let ada = create_user("Ada", "ada@example.com", PasswordHash::new_unchecked("x"), &conn)
            .unwrap();
        let grace = create_user(
            "Grace",
            "grace@example.com",
            PasswordHash::new_unchecked("x"),
            &conn,
        )
        .unwrap();
        let older = create_transaction(
            ada.id,
            NewTransaction::new("Rent", 450.0, TransactionType::Expense, date!(2025 - 01 - 01)),
            &conn,
        )
        .unwrap();
        let same_day_first = create_transaction(
            ada.id,
            NewTransaction::new("Coffee", 4.5, TransactionType::Expense, date!(2025 - 02 - 01)),
            &conn,
        )
        .unwrap();
        let same_day_second = create_transaction(
            ada.id,
            NewTransaction::new("Salary", 900.0, TransactionType::Income, date!(2025 - 02 - 01)),
            &conn,
        )
        .unwrap();
        create_transaction(
            grace.id,
            NewTransaction::new("Books", 30.0, TransactionType::Expense, date!(2025 - 03 - 01)),
            &conn,
        )
        .unwrap();

        let transactions = get_transactions_for_user(ada.id, &conn).unwrap();

        assert_eq!(transactions, vec![same_day_second, same_day_first, older]);
    }
}

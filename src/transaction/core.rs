//! Defines the core data models and database queries for transactions.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::{AppState, Error, UserID};

/// The ID of a transaction in the database.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lower case name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// An expense or income recorded by a user.
///
/// The amount is stored as supplied; whether it adds to or subtracts from the
/// balance is decided by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that created the transaction.
    pub user: UserID,
    /// A short description, e.g. "Groceries".
    pub title: String,
    /// The amount of money earned or spent.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// When the transaction happened.
    #[serde(with = "crate::date_format")]
    pub date: Date,
    /// Free text such as an invoice number.
    pub reference: Option<String>,
}

/// The validated fields for creating a [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// A short, non-empty description.
    pub title: String,
    /// The amount of money earned or spent.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// Optional free text.
    pub reference: Option<String>,
}

impl NewTransaction {
    /// Create a new transaction without a reference.
    pub fn new(title: &str, amount: f64, kind: TransactionType, date: Date) -> Self {
        Self {
            title: title.to_owned(),
            amount,
            kind,
            date,
            reference: None,
        }
    }

    /// Set the reference for the transaction.
    pub fn reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_owned());
        self
    }
}

/// The fields a client may send when creating or updating a transaction.
///
/// Every field is optional so the same shape serves both the create body,
/// which is checked by [TransactionFields::into_new_transaction], and partial
/// updates, which go through [TransactionFields::apply_to].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFields {
    /// A short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The amount. Numeric strings such as `"12.50"` are accepted.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_amount"
    )]
    pub amount: Option<f64>,
    /// Income or expense.
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_kind"
    )]
    pub kind: Option<TransactionType>,
    /// The date of the transaction, "YYYY-MM-DD".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::date_format::option"
    )]
    pub date: Option<Date>,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl TransactionFields {
    /// Check that the required fields are present, using `today` if no date
    /// was given.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the title, amount or type is missing.
    pub fn into_new_transaction(self, today: Date) -> Result<NewTransaction, Error> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(Error::Validation("Please add a title".to_owned())),
        };

        let Some(amount) = self.amount else {
            return Err(Error::Validation("Please add an amount".to_owned()));
        };

        if !amount.is_finite() {
            return Err(Error::Validation("Please add a valid amount".to_owned()));
        }

        let Some(kind) = self.kind else {
            return Err(Error::Validation(
                "Please specify income or expense".to_owned(),
            ));
        };

        Ok(NewTransaction {
            title,
            amount,
            kind,
            date: self.date.unwrap_or(today),
            reference: self.reference.filter(|reference| !reference.is_empty()),
        })
    }

    /// Overwrite the fields of `transaction` with the supplied values.
    ///
    /// Only truthy values are applied: empty strings and a zero amount are
    /// treated like absent fields and keep the stored value. This means an
    /// update cannot clear a reference or set an amount to zero.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the amount is not a finite number, in
    /// which case `transaction` is left untouched.
    pub fn apply_to(self, transaction: &mut Transaction) -> Result<(), Error> {
        if self.amount.is_some_and(|amount| !amount.is_finite()) {
            return Err(Error::Validation("Please add a valid amount".to_owned()));
        }

        if let Some(title) = self.title.filter(|title| !title.is_empty()) {
            transaction.title = title;
        }

        if let Some(amount) = self.amount.filter(|amount| *amount != 0.0) {
            transaction.amount = amount;
        }

        if let Some(kind) = self.kind {
            transaction.kind = kind;
        }

        if let Some(date) = self.date {
            transaction.date = date;
        }

        if let Some(reference) = self.reference.filter(|reference| !reference.is_empty()) {
            transaction.reference = Some(reference);
        }

        Ok(())
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
    }

    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawAmount::Number(amount)) => Ok(Some(amount)),
        Some(RawAmount::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawAmount::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid amount \"{text}\""))),
    }
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<TransactionType>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some("income") => Ok(Some(TransactionType::Income)),
        Some("expense") => Ok(Some(TransactionType::Expense)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid transaction type \"{other}\", expected \"income\" or \"expense\""
        ))),
    }
}

// ============================================================================
// STATE
// ============================================================================

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `owner`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error,
/// e.g. if `owner` does not refer to a registered user.
pub fn create_transaction(
    owner: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, title, amount, type, date, reference)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, title, amount, type, date, reference",
        )?
        .query_row(
            (
                owner,
                new_transaction.title,
                new_transaction.amount,
                new_transaction.kind,
                new_transaction.date,
                new_transaction.reference,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// This does not check ownership, callers must compare [Transaction::user]
/// with the caller's ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, title, amount, type, date, reference
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Fetch the transaction `id` and check that it belongs to `owner`.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist and
/// [Error::NotOwner] if it belongs to another user.
pub fn get_owned_transaction(
    id: TransactionId,
    owner: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    if transaction.user != owner {
        tracing::warn!(
            "User {owner} tried to access transaction {id} owned by user {}",
            transaction.user
        );
        return Err(Error::NotOwner);
    }

    Ok(transaction)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                date TEXT NOT NULL,
                reference TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Listing and stats always filter by user and order by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Expects the columns `id, user_id, title, amount, type, date, reference`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user = row.get(1)?;
    let title = row.get(2)?;
    let amount = row.get(3)?;
    let kind = row.get(4)?;
    let date = row.get(5)?;
    let reference = row.get(6)?;

    Ok(Transaction {
        id,
        user,
        title,
        amount,
        kind,
        date,
        reference,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash, UserID,
        db::initialize,
        transaction::{
            NewTransaction, TransactionType, core::get_owned_transaction, create_transaction,
            get_transaction,
        },
        user::create_user,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            "Ada",
            "ada@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();

        let transaction = create_transaction(
            user_id,
            NewTransaction::new("Rent", 450.0, TransactionType::Expense, date!(2025 - 10 - 05))
                .reference("October"),
            &conn,
        )
        .unwrap();

        assert!(transaction.id > 0);
        assert_eq!(transaction.user, user_id);
        assert_eq!(transaction.amount, 450.0);
        assert_eq!(transaction.kind, TransactionType::Expense);
        assert_eq!(transaction.reference.as_deref(), Some("October"));
        assert_eq!(get_transaction(transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn create_fails_for_unknown_user() {
        let (conn, _) = get_test_connection();

        let result = create_transaction(
            UserID::new(999),
            NewTransaction::new("Rent", 450.0, TransactionType::Expense, date!(2025 - 10 - 05)),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn get_fails_with_missing_id() {
        let (conn, _) = get_test_connection();

        assert_eq!(get_transaction(42, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_owned_fails_for_other_user() {
        let (conn, user_id) = get_test_connection();
        let transaction = create_transaction(
            user_id,
            NewTransaction::new("Rent", 450.0, TransactionType::Expense, date!(2025 - 10 - 05)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_owned_transaction(transaction.id, UserID::new(user_id.as_i64() + 1), &conn),
            Err(Error::NotOwner)
        );
        assert_eq!(
            get_owned_transaction(transaction.id, user_id, &conn),
            Ok(transaction)
        );
    }
}

//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the fields clients send to create or update one
//! - Database functions for storing, querying, and managing a user's transactions
//! - The statistics computed over a user's transactions
//! - Route handlers for the transaction endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod stats;
mod stats_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionFields, TransactionId, TransactionState,
    TransactionType, create_transaction, create_transaction_table, get_owned_transaction,
    map_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use list_endpoint::{get_transactions_endpoint, get_transactions_for_user};
pub use stats::{MonthlyTotal, StatsSnapshot, TitleTotal, compute_stats, get_stats_for_user};
pub use stats_endpoint::get_stats_endpoint;

#[cfg(test)]
pub use core::get_transaction;

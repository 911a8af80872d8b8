//! Aggregates a user's transactions into totals, a monthly series and a
//! ranking of expenses by title.
//!
//! The snapshot is recomputed from the stored transactions on every request
//! and never persisted.

use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error, UserID,
    transaction::{Transaction, TransactionType, get_transactions_for_user},
};

/// The total for one transaction type in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// The month of the year, 1 to 12.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// Whether this is the income or expense total.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The sum of the amounts.
    pub total: f64,
}

/// The sum of all expenses sharing a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleTotal {
    /// The transaction title.
    pub title: String,
    /// The sum of the amounts.
    pub total: f64,
}

/// Aggregate statistics over one user's transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expense: f64,
    /// `total_income - total_expense`.
    pub balance: f64,
    /// Totals per month and type, oldest month first. Within a month the
    /// income total comes before the expense total.
    pub monthly_data: Vec<MonthlyTotal>,
    /// Expense totals per title, largest first.
    pub expenses_by_title: Vec<TitleTotal>,
}

/// Compute the statistics for `transactions`.
///
/// Expense titles with equal totals keep the order in which the titles first
/// appear in `transactions`.
pub fn compute_stats(transactions: &[Transaction]) -> StatsSnapshot {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    let mut monthly_totals: BTreeMap<(i32, u8, TransactionType), f64> = BTreeMap::new();
    let mut expenses_by_title: Vec<TitleTotal> = Vec::new();
    let mut title_index: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions {
        match transaction.kind {
            TransactionType::Income => total_income += transaction.amount,
            TransactionType::Expense => {
                total_expense += transaction.amount;

                let index = *title_index
                    .entry(transaction.title.as_str())
                    .or_insert_with(|| {
                        expenses_by_title.push(TitleTotal {
                            title: transaction.title.clone(),
                            total: 0.0,
                        });
                        expenses_by_title.len() - 1
                    });
                expenses_by_title[index].total += transaction.amount;
            }
        }

        let key = (
            transaction.date.year(),
            u8::from(transaction.date.month()),
            transaction.kind,
        );
        *monthly_totals.entry(key).or_insert(0.0) += transaction.amount;
    }

    // `sort_by` is stable, so equal totals stay in first-seen order.
    expenses_by_title.sort_by(|a, b| b.total.total_cmp(&a.total));

    let monthly_data = monthly_totals
        .into_iter()
        .map(|((year, month, kind), total)| MonthlyTotal {
            month,
            year,
            kind,
            total,
        })
        .collect();

    StatsSnapshot {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        monthly_data,
        expenses_by_title,
    }
}

/// Compute the statistics for all transactions owned by `owner`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_stats_for_user(owner: UserID, connection: &Connection) -> Result<StatsSnapshot, Error> {
    let transactions = get_transactions_for_user(owner, connection)?;

    Ok(compute_stats(&transactions))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::{Date, macros::date};

    use crate::{
        UserID,
        transaction::{Transaction, TransactionType},
    };

    use super::{MonthlyTotal, StatsSnapshot, TitleTotal, compute_stats};

    fn transaction(title: &str, amount: f64, kind: TransactionType, date: Date) -> Transaction {
        Transaction {
            id: 0,
            user: UserID::new(1),
            title: title.to_owned(),
            amount,
            kind,
            date,
            reference: None,
        }
    }

    #[test]
    fn empty_input_gives_zeroed_snapshot() {
        assert_eq!(compute_stats(&[]), StatsSnapshot::default());
    }

    #[test]
    fn computes_totals_and_monthly_series() {
        let transactions = [
            transaction("Salary", 100.0, TransactionType::Income, date!(2025 - 01 - 05)),
            transaction("Rent", 40.0, TransactionType::Expense, date!(2025 - 01 - 10)),
            transaction("Coffee", 10.0, TransactionType::Expense, date!(2025 - 02 - 03)),
        ];

        let stats = compute_stats(&transactions);

        assert_eq!(stats.total_income, 100.0);
        assert_eq!(stats.total_expense, 50.0);
        assert_eq!(stats.balance, 50.0);
        assert_eq!(
            stats.monthly_data,
            vec![
                MonthlyTotal {
                    month: 1,
                    year: 2025,
                    kind: TransactionType::Income,
                    total: 100.0
                },
                MonthlyTotal {
                    month: 1,
                    year: 2025,
                    kind: TransactionType::Expense,
                    total: 40.0
                },
                MonthlyTotal {
                    month: 2,
                    year: 2025,
                    kind: TransactionType::Expense,
                    total: 10.0
                },
            ]
        );
        assert_eq!(
            stats.expenses_by_title,
            vec![
                TitleTotal {
                    title: "Rent".to_owned(),
                    total: 40.0
                },
                TitleTotal {
                    title: "Coffee".to_owned(),
                    total: 10.0
                },
            ]
        );
    }

    #[test]
    fn monthly_series_is_chronological_across_years() {
        let transactions = [
            transaction("A", 1.0, TransactionType::Expense, date!(2025 - 01 - 01)),
            transaction("B", 2.0, TransactionType::Expense, date!(2024 - 12 - 31)),
            transaction("C", 3.0, TransactionType::Income, date!(2024 - 12 - 01)),
        ];

        let months: Vec<(i32, u8, TransactionType)> = compute_stats(&transactions)
            .monthly_data
            .into_iter()
            .map(|entry| (entry.year, entry.month, entry.kind))
            .collect();

        assert_eq!(
            months,
            vec![
                (2024, 12, TransactionType::Income),
                (2024, 12, TransactionType::Expense),
                (2025, 1, TransactionType::Expense),
            ]
        );
    }

    #[test]
    fn expenses_are_grouped_by_title_and_ties_keep_first_seen_order() {
        let transactions = [
            transaction("Coffee", 5.0, TransactionType::Expense, date!(2025 - 03 - 03)),
            transaction("Books", 10.0, TransactionType::Expense, date!(2025 - 03 - 02)),
            transaction("Coffee", 5.0, TransactionType::Expense, date!(2025 - 03 - 01)),
            transaction("Coffee", 99.0, TransactionType::Income, date!(2025 - 03 - 01)),
        ];

        let titles: Vec<(String, f64)> = compute_stats(&transactions)
            .expenses_by_title
            .into_iter()
            .map(|entry| (entry.title, entry.total))
            .collect();

        assert_eq!(
            titles,
            vec![("Coffee".to_owned(), 10.0), ("Books".to_owned(), 10.0)]
        );
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let transactions = [
            transaction("Salary", 20.0, TransactionType::Income, date!(2025 - 01 - 05)),
            transaction("Rent", 75.5, TransactionType::Expense, date!(2025 - 01 - 10)),
        ];

        let stats = compute_stats(&transactions);

        assert_eq!(stats.balance, stats.total_income - stats.total_expense);
        assert_eq!(stats.balance, -55.5);
    }

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let stats = compute_stats(&[transaction(
            "Rent",
            40.0,
            TransactionType::Expense,
            date!(2025 - 01 - 10),
        )]);

        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({
                "totalIncome": 0.0,
                "totalExpense": 40.0,
                "balance": -40.0,
                "monthlyData": [{ "month": 1, "year": 2025, "type": "expense", "total": 40.0 }],
                "expensesByTitle": [{ "title": "Rent", "total": 40.0 }],
            })
        );
    }
}

//! Chart series for the dashboard.

use crate::{StatsSnapshot, TransactionType};

/// Income and expense totals for each month of one year.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyOverview {
    /// The year the totals are for.
    pub year: i32,
    /// Income per month, January first.
    pub income: [f64; 12],
    /// Expenses per month, January first.
    pub expense: [f64; 12],
}

/// One slice of the expense breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    /// The transaction title.
    pub title: String,
    /// The sum of expenses with this title.
    pub total: f64,
    /// `total` as a percentage of all expenses.
    pub percentage: f64,
}

/// The monthly series for `year`. Months without transactions are zero.
pub fn monthly_overview(stats: &StatsSnapshot, year: i32) -> MonthlyOverview {
    let mut overview = MonthlyOverview {
        year,
        income: [0.0; 12],
        expense: [0.0; 12],
    };

    for entry in stats.monthly_data.iter().filter(|entry| entry.year == year) {
        let Some(index) = usize::from(entry.month).checked_sub(1).filter(|i| *i < 12) else {
            continue;
        };

        match entry.kind {
            TransactionType::Income => overview.income[index] += entry.total,
            TransactionType::Expense => overview.expense[index] += entry.total,
        }
    }

    overview
}

/// The `n` largest expense titles with their share of all expenses.
pub fn top_expense_categories(stats: &StatsSnapshot, n: usize) -> Vec<CategoryShare> {
    stats
        .expenses_by_title
        .iter()
        .take(n)
        .map(|entry| CategoryShare {
            title: entry.title.clone(),
            total: entry.total,
            percentage: if stats.total_expense > 0.0 {
                entry.total / stats.total_expense * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

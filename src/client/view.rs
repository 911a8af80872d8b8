//! Filtering, searching and sorting of cached transactions for display.

use std::cmp::Ordering;

use crate::{Transaction, TransactionType};

/// Which transaction types to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    /// Show income and expenses.
    #[default]
    All,
    /// Show income only.
    Income,
    /// Show expenses only.
    Expense,
}

impl TypeFilter {
    fn matches(&self, kind: TransactionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => kind == TransactionType::Income,
            TypeFilter::Expense => kind == TransactionType::Expense,
        }
    }
}

/// The field to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Sort chronologically.
    Date,
    /// Sort numerically.
    Amount,
    /// Sort alphabetically, ignoring case.
    Title,
}

/// The direction to sort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// The active sort. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    /// The field to sort by.
    pub key: SortKey,
    /// The direction to sort in.
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Descending,
        }
    }
}

impl SortConfig {
    /// The sort after the user selects `key`.
    ///
    /// Selecting the key that is already sorted ascending switches to
    /// descending. Any other selection sorts ascending by `key`.
    pub fn request(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };

        Self { key, direction }
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Return the transactions that match `filter` and `search_term`, sorted by
/// `sort`.
///
/// The search is a case-insensitive substring match on the title and
/// reference. Transactions that compare equal keep their order in
/// `transactions`, in either direction.
pub fn derive_view(
    transactions: &[Transaction],
    filter: TypeFilter,
    search_term: &str,
    sort: SortConfig,
) -> Vec<Transaction> {
    let search_term = search_term.to_lowercase();

    let mut view: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| filter.matches(transaction.kind))
        .filter(|transaction| matches_search(transaction, &search_term))
        .cloned()
        .collect();

    view.sort_by(|a, b| sort.compare(a, b));

    view
}

fn matches_search(transaction: &Transaction, search_term: &str) -> bool {
    search_term.is_empty()
        || transaction.title.to_lowercase().contains(search_term)
        || transaction
            .reference
            .as_ref()
            .is_some_and(|reference| reference.to_lowercase().contains(search_term))
}

/// Counts for the "showing N of M" line under the transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSummary {
    /// The number of transactions shown.
    pub shown: usize,
    /// The number of cached transactions.
    pub total: usize,
    /// Whether a filter or search is hiding transactions.
    pub is_filtered: bool,
}

impl ViewSummary {
    /// Summarise a view of `total` transactions that shows `shown` of them.
    pub fn new(shown: usize, total: usize, filter: TypeFilter, search_term: &str) -> Self {
        Self {
            shown,
            total,
            is_filtered: filter != TypeFilter::All || !search_term.is_empty(),
        }
    }

    /// Whether an empty view is due to the filters rather than there being no
    /// transactions at all.
    pub fn is_empty_due_to_filters(&self) -> bool {
        self.shown == 0 && self.total > 0 && self.is_filtered
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{Transaction, TransactionType, UserID};

    use super::{SortConfig, SortDirection, SortKey, TypeFilter, ViewSummary, derive_view};

    fn transaction(
        id: i64,
        title: &str,
        amount: f64,
        kind: TransactionType,
        date: Date,
        reference: Option<&str>,
    ) -> Transaction {
        Transaction {
            id,
            user: UserID::new(1),
            title: title.to_owned(),
            amount,
            kind,
            date,
            reference: reference.map(str::to_owned),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            transaction(1, "Salary", 1000.0, TransactionType::Income, date!(2025 - 01 - 31), None),
            transaction(2, "rent", 450.0, TransactionType::Expense, date!(2025 - 01 - 01), Some("INV-9")),
            transaction(3, "Coffee", 4.5, TransactionType::Expense, date!(2025 - 02 - 14), None),
            transaction(4, "Books", 4.5, TransactionType::Expense, date!(2025 - 02 - 14), Some("gift")),
        ]
    }

    fn ids(view: &[Transaction]) -> Vec<i64> {
        view.iter().map(|transaction| transaction.id).collect()
    }

    #[test]
    fn default_sort_is_newest_first_with_stable_ties() {
        let view = derive_view(&sample(), TypeFilter::All, "", SortConfig::default());

        assert_eq!(ids(&view), vec![3, 4, 1, 2]);
    }

    #[test]
    fn filters_by_type() {
        let view = derive_view(&sample(), TypeFilter::Income, "", SortConfig::default());

        assert_eq!(ids(&view), vec![1]);
    }

    #[test]
    fn search_matches_title_or_reference_ignoring_case() {
        let sort = SortConfig::default();

        assert_eq!(ids(&derive_view(&sample(), TypeFilter::All, "COF", sort)), vec![3]);
        assert_eq!(ids(&derive_view(&sample(), TypeFilter::All, "inv", sort)), vec![2]);
        assert_eq!(
            ids(&derive_view(&sample(), TypeFilter::Income, "gift", sort)),
            Vec::<i64>::new()
        );
    }

    #[test]
    fn sorts_by_amount_and_title() {
        let by_amount = SortConfig {
            key: SortKey::Amount,
            direction: SortDirection::Ascending,
        };
        let by_title = SortConfig {
            key: SortKey::Title,
            direction: SortDirection::Ascending,
        };

        assert_eq!(
            ids(&derive_view(&sample(), TypeFilter::All, "", by_amount)),
            vec![3, 4, 2, 1]
        );
        assert_eq!(
            ids(&derive_view(&sample(), TypeFilter::All, "", by_title)),
            vec![4, 3, 2, 1]
        );
    }

    #[test]
    fn deriving_twice_gives_the_same_view_and_keeps_source() {
        let source = sample();
        let sort = SortConfig::default().request(SortKey::Title);

        let once = derive_view(&source, TypeFilter::Expense, "o", sort);
        let twice = derive_view(&once, TypeFilter::Expense, "o", sort);

        assert_eq!(once, twice);
        assert_eq!(source, sample());
    }

    #[test]
    fn requesting_a_sort_toggles_direction() {
        let sort = SortConfig::default();

        let sort = sort.request(SortKey::Date);
        assert_eq!(sort.direction, SortDirection::Ascending);

        let sort = sort.request(SortKey::Date);
        assert_eq!(sort.direction, SortDirection::Descending);

        let sort = sort.request(SortKey::Amount);
        assert_eq!(
            sort,
            SortConfig {
                key: SortKey::Amount,
                direction: SortDirection::Ascending
            }
        );
    }

    #[test]
    fn summary_reports_empty_results_caused_by_filters() {
        let filtered = ViewSummary::new(0, 4, TypeFilter::All, "nothing matches");
        let no_data = ViewSummary::new(0, 0, TypeFilter::All, "");

        assert!(filtered.is_empty_due_to_filters());
        assert!(!no_data.is_empty_due_to_filters());
    }
}

//! Pure functions that summarise transactions for display.
//!
//! The functions here never touch the database or the clock. Callers load and
//! filter the transactions first (e.g. to a single month) and pass in borrowed
//! snapshots, so the functions can be called concurrently and always give the
//! same output for the same input.
//!
//! Amounts are summed as `f64` in input order. The totals are reproducible for
//! a fixed input ordering, but reordering the input may change the last few
//! bits of a total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{category::Taxonomy, month::MonthKey, transaction::Transaction};

/// The section and category name used for transactions whose category is not in the taxonomy.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The transactions of one category within a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    /// The category name.
    pub name: String,
    /// The signed sum of the category's transaction amounts.
    pub total: f64,
    /// The category's transactions in input order.
    pub transactions: Vec<Transaction>,
}

/// The transactions of one section, grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTransaction {
    /// The section name.
    pub section: String,
    /// The sum of the section's category totals.
    pub total: f64,
    /// The section's categories in the order they first appear in the input.
    pub categories: Vec<CategoryGroup>,
}

/// Income and expenses over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// The sum of the positive amounts.
    pub income: f64,
    /// The sum of the magnitudes of the negative amounts, always zero or more.
    pub expenses: f64,
}

/// Group transactions into the sections of `taxonomy` and then by category.
///
/// Each transaction goes to the first section whose category list contains its
/// category. A transaction whose category is in no section goes to the
/// "Uncategorized" section under its own category name, so no transaction is
/// ever dropped. Sections and categories appear in the order they are first
/// seen in `transactions` and only if they have at least one transaction.
pub fn group_by_section(
    transactions: &[Transaction],
    taxonomy: &Taxonomy,
) -> Vec<GroupedTransaction> {
    let mut sections: Vec<GroupedTransaction> = Vec::new();

    for transaction in transactions {
        let section_name = taxonomy
            .section_of(&transaction.category)
            .unwrap_or(UNCATEGORIZED);

        let section_index = match sections.iter().position(|s| s.section == section_name) {
            Some(index) => index,
            None => {
                sections.push(GroupedTransaction {
                    section: section_name.to_owned(),
                    total: 0.0,
                    categories: Vec::new(),
                });
                sections.len() - 1
            }
        };
        let categories = &mut sections[section_index].categories;

        let category_index = match categories
            .iter()
            .position(|c| c.name == transaction.category)
        {
            Some(index) => index,
            None => {
                categories.push(CategoryGroup {
                    name: transaction.category.clone(),
                    total: 0.0,
                    transactions: Vec::new(),
                });
                categories.len() - 1
            }
        };
        let category = &mut categories[category_index];

        category.total += transaction.amount;
        category.transactions.push(transaction.clone());
    }

    for section in &mut sections {
        section.total = section.categories.iter().map(|c| c.total).sum();
    }

    sections
}

/// Sum the income and the expenses of `transactions`.
///
/// Zero amounts count towards neither. Expenses are reported as a positive magnitude.
pub fn compute_totals(transactions: &[Transaction]) -> MonthlyTotals {
    let mut totals = MonthlyTotals::default();

    for transaction in transactions {
        if transaction.amount > 0.0 {
            totals.income += transaction.amount;
        } else if transaction.amount < 0.0 {
            totals.expenses += transaction.amount.abs();
        }
    }

    totals
}

/// Sum the signed amounts of `transactions` per category name.
///
/// Only categories with at least one transaction appear. The amounts are not
/// filtered by sign, callers that want expenses only must filter first.
pub fn compute_totals_by_category(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions {
        *totals.entry(transaction.category.clone()).or_insert(0.0) += transaction.amount;
    }

    totals
}

/// Compute [MonthlyTotals] for every month in `transactions_by_month`.
///
/// Every input month is kept, a month with no transactions gets zero totals.
/// Months missing from the input are not added.
pub fn build_history(
    transactions_by_month: &BTreeMap<MonthKey, Vec<Transaction>>,
) -> BTreeMap<MonthKey, MonthlyTotals> {
    transactions_by_month
        .iter()
        .map(|(month, transactions)| (*month, compute_totals(transactions)))
        .collect()
}


#[cfg(test)]
mod totals_tests {
    use std::collections::BTreeMap;

    use time::{Month, macros::date};

    use crate::{
        aggregation::{MonthlyTotals, build_history, compute_totals, compute_totals_by_category},
        month::MonthKey,
        transaction::Transaction,
    };

    fn transaction(amount: f64, category: &str) -> Transaction {
        Transaction {
            id: 1,
            date: date!(2024 - 01 - 15),
            description: String::new(),
            amount,
            category: category.to_owned(),
        }
    }

    #[test]
    fn totals_split_income_and_expenses() {
        let transactions = vec![
            transaction(-50.0, "Rent"),
            transaction(-20.0, "Rent"),
            transaction(1000.0, "Salary"),
        ];

        let totals = compute_totals(&transactions);

        assert_eq!(
            totals,
            MonthlyTotals {
                income: 1000.0,
                expenses: 70.0
            }
        );
    }

    #[test]
    fn totals_of_nothing_are_zero() {
        assert_eq!(
            compute_totals(&[]),
            MonthlyTotals {
                income: 0.0,
                expenses: 0.0
            }
        );
    }

    #[test]
    fn zero_amounts_count_for_neither() {
        assert_eq!(
            compute_totals(&[transaction(0.0, "Rent")]),
            MonthlyTotals::default()
        );
    }

    #[test]
    fn income_minus_expenses_is_net_amount() {
        let transactions = vec![
            transaction(-12.5, "Cafes"),
            transaction(250.0, "Salary"),
            transaction(-99.99, "Rent"),
            transaction(3.25, "Refunds"),
        ];

        let totals = compute_totals(&transactions);

        let net: f64 = transactions.iter().map(|t| t.amount).sum();
        assert!((totals.income - totals.expenses - net).abs() < 1e-9);
        assert!(totals.expenses >= 0.0);
    }

    #[test]
    fn totals_by_category_only_includes_present_categories() {
        let transactions = vec![
            transaction(-50.0, "Rent"),
            transaction(-4.5, "Cafes"),
            transaction(-20.0, "Rent"),
        ];

        let totals = compute_totals_by_category(&transactions);

        assert_eq!(
            totals,
            BTreeMap::from([("Cafes".to_owned(), -4.5), ("Rent".to_owned(), -70.0)])
        );
    }

    #[test]
    fn totals_by_category_keeps_signs() {
        let totals =
            compute_totals_by_category(&[transaction(10.0, "Refunds"), transaction(-4.0, "Refunds")]);

        assert_eq!(totals["Refunds"], 6.0);
    }

    #[test]
    fn totals_by_category_of_nothing_is_empty() {
        assert!(compute_totals_by_category(&[]).is_empty());
    }

    #[test]
    fn history_keeps_empty_months() {
        let january = MonthKey::new(2024, Month::January);
        let february = MonthKey::new(2024, Month::February);
        let transactions_by_month = BTreeMap::from([
            (
                january,
                vec![transaction(1000.0, "Salary"), transaction(-70.0, "Rent")],
            ),
            (february, vec![]),
        ]);

        let history = build_history(&transactions_by_month);

        assert_eq!(history.len(), 2);
        assert_eq!(
            history[&january],
            MonthlyTotals {
                income: 1000.0,
                expenses: 70.0
            }
        );
        assert_eq!(history[&february], MonthlyTotals::default());
    }

    #[test]
    fn history_does_not_add_missing_months() {
        let january = MonthKey::new(2024, Month::January);
        let march = MonthKey::new(2024, Month::March);
        let transactions_by_month = BTreeMap::from([
            (january, vec![transaction(1.0, "Salary")]),
            (march, vec![transaction(-1.0, "Rent")]),
        ]);

        let history = build_history(&transactions_by_month);

        assert_eq!(history.keys().copied().collect::<Vec<_>>(), vec![january, march]);
    }

    #[test]
    fn history_serializes_with_month_keys() {
        let history = build_history(&BTreeMap::from([(
            MonthKey::new(2024, Month::February),
            vec![],
        )]));

        let json = serde_json::to_string(&history).unwrap();

        assert_eq!(json, r#"{"2024-02":{"income":0.0,"expenses":0.0}}"#);
    }
}

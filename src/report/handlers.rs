//! Report HTTP handlers.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    aggregation::{
        GroupedTransaction, MonthlyTotals, build_history, compute_totals,
        compute_totals_by_category, group_by_section,
    },
    category::get_taxonomy,
    month::MonthKey,
    report::MAX_HISTORY_MONTHS,
    transaction::{Transaction, get_transaction_months, get_transactions_in_range},
    user::UserId,
};

/// Expenses in this category move money between accounts and are left out of expense reports.
const TRANSFER_CATEGORY: &str = "Transfer";

/// The state needed for the report handlers.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The default length of the history report in months.
    pub history_months: u32,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            history_months: state.report_config.history_months,
        }
    }
}

/// Query parameters for the history report.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// How many months to include, ending with the latest month that has transactions.
    pub months: Option<u32>,
}

/// Get the user's transactions for the month in the request path, oldest first.
fn get_month_transactions(
    user_id: &UserId,
    (year, month): (i32, u8),
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let month = MonthKey::from_numbers(year, month)?;

    get_transactions_in_range(user_id, month.first_day()?, month.last_day()?, connection)
}

/// A route handler that returns the transactions in a month.
pub async fn get_month_transactions_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Path(year_month): Path<(i32, u8)>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_month_transactions(&user_id, year_month, &connection).map(Json)
}

/// A route handler that returns a month's transactions grouped by section and category.
pub async fn get_grouped_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Path(year_month): Path<(i32, u8)>,
) -> Result<Json<Vec<GroupedTransaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_month_transactions(&user_id, year_month, &connection)?;
    let taxonomy = get_taxonomy(&user_id, &connection)?;

    Ok(Json(group_by_section(&transactions, &taxonomy)))
}

/// A route handler that returns a month's total income and expenses.
pub async fn get_totals_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Path(year_month): Path<(i32, u8)>,
) -> Result<Json<MonthlyTotals>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_month_transactions(&user_id, year_month, &connection)?;

    Ok(Json(compute_totals(&transactions)))
}

/// A route handler that returns a month's expenses per category as positive amounts.
///
/// Income and transfers are left out.
pub async fn get_expenses_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Path(year_month): Path<(i32, u8)>,
) -> Result<Json<BTreeMap<String, f64>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses: Vec<Transaction> = get_month_transactions(&user_id, year_month, &connection)?
        .into_iter()
        .filter(|transaction| transaction.amount < 0.0 && transaction.category != TRANSFER_CATEGORY)
        .collect();

    let totals = compute_totals_by_category(&expenses)
        .into_iter()
        .map(|(category, total)| (category, total.abs()))
        .collect();

    Ok(Json(totals))
}

/// A route handler that returns income and expenses for each month in a window
/// ending with the latest month that has transactions.
///
/// Months in the window without transactions are reported with zero totals.
/// The window is at most [MAX_HISTORY_MONTHS] long.
/// The response is empty when the user has no transactions.
pub async fn get_history_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<BTreeMap<MonthKey, MonthlyTotals>>, Error> {
    let month_count = query
        .months
        .filter(|&months| months > 0)
        .unwrap_or(state.history_months)
        .clamp(1, MAX_HISTORY_MONTHS);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let Some(latest) = get_transaction_months(&user_id, &connection)?.first().copied() else {
        return Ok(Json(BTreeMap::new()));
    };

    let window = latest.window_ending_here(month_count);
    let mut transactions_by_month: BTreeMap<MonthKey, Vec<Transaction>> =
        window.iter().map(|&month| (month, Vec::new())).collect();

    let start = window.first().map_or(latest, |&month| month).first_day()?;
    let end = latest.last_day()?;
    for transaction in get_transactions_in_range(&user_id, start, end, &connection)? {
        transactions_by_month
            .entry(MonthKey::of(transaction.date))
            .or_default()
            .push(transaction);
    }

    Ok(Json(build_history(&transactions_by_month)))
}

/// A route handler that returns the months that have transactions, newest first.
pub async fn get_range_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<MonthKey>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction_months(&user_id, &connection).map(Json)
}

//! Defines the endpoint for listing transactions.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    transaction::{
        Transaction, TransactionState,
        core::{get_transactions, get_transactions_in_range},
    },
    user::UserId,
};

/// Optional inclusive date bounds for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    /// The earliest date to include.
    pub start: Option<Date>,
    /// The latest date to include.
    pub end: Option<Date>,
}

/// A route handler that lists the user's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = match range {
        DateRangeQuery {
            start: None,
            end: None,
        } => get_transactions(&user_id, &connection)?,
        DateRangeQuery { start, end } => {
            let mut transactions = get_transactions_in_range(
                &user_id,
                start.unwrap_or(Date::MIN),
                end.unwrap_or(Date::MAX),
                &connection,
            )?;
            transactions.reverse();
            transactions
        }
    };

    Ok(Json(transactions))
}

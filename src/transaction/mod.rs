//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for creating, listing, re-categorizing and deleting transactions

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod list_transactions_endpoint;
mod update_transaction_endpoint;

pub use self::core::{
    Transaction, TransactionBuilder, TransactionKind, create_transaction,
    create_transaction_table, get_transaction_months, get_transactions_in_range,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use list_transactions_endpoint::list_transactions_endpoint;
pub use update_transaction_endpoint::update_transaction_endpoint;

#[cfg(test)]
pub use self::core::{
    count_transactions, get_transaction, get_transactions, soft_delete_transaction,
    update_transaction_category,
};

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

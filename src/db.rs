//! Creates the database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, category::create_category_tables, rule::create_rule_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the tables for the domain models if they do not exist.
///
/// The tables are created in a single exclusive transaction, so a partially
/// created schema is never left behind.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_tables(&transaction)?;
    create_transaction_table(&transaction)?;
    create_rule_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

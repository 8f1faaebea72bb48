//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    aggregation::UNCATEGORIZED,
    database_id::TransactionId,
    month::{MonthKey, check_year},
    user::UserId,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// The name of the category the transaction belongs to.
    pub category: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            category: UNCATEGORIZED.to_owned(),
            is_imported: false,
        }
    }
}

/// Whether the user entered a transaction as money spent or money earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money spent, stored as a negative amount.
    Expense,
    /// Money earned, stored as a positive amount.
    Income,
}

impl TransactionKind {
    /// Give `amount` the sign that matches this kind.
    pub fn normalize(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Expense => -amount.abs(),
            TransactionKind::Income => amount.abs(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Transaction, TransactionKind};
///
/// let transaction = Transaction::build(45.99, date!(2025-01-15), "Coffee shop purchase")
///     .kind(TransactionKind::Expense)
///     .category("Cafes");
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income/credits, negative values represent
    /// expenses/debits.
    ///
    /// # Examples
    /// - `150.00` - Salary deposit
    /// - `-45.99` - Coffee shop purchase
    /// - `-1200.00` - Rent payment
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    ///
    /// For imported transactions, this typically comes from the bank's description field.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Public Transport", "Rent".
    ///
    /// Defaults to "Uncategorized".
    pub category: String,

    /// Whether the transaction came from an uploaded file rather than being entered by hand.
    pub is_imported: bool,
}

impl TransactionBuilder {
    /// Set the category name for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    /// Normalize the sign of the amount to match `kind`.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.amount = kind.normalize(self.amount);
        self
    }

    /// Mark the transaction as imported from a file.
    pub fn imported(mut self) -> Self {
        self.is_imported = true;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "id, date, description, amount, category";

/// Create a new transaction for the user in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::YearOutOfRange] if the date's year cannot be written as `YYYY`,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    user_id: &UserId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    // Month keys are read back from the first seven characters of the stored date.
    check_year(builder.date.year())?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, date, description, amount, category, is_manual, is_imported, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_str(),
                builder.date,
                builder.description,
                builder.amount,
                builder.category,
                !builder.is_imported,
                builder.is_imported,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction the user has not deleted,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: &UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\"
            WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0"
        ))?
        .query_row((id, user_id.as_str()), map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all of the user's transactions, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\"
            WHERE user_id = :user_id AND is_deleted = 0
            ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_str())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's transactions dated from `start` to `end` (inclusive), oldest first.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDateRange] if `start` is after `end`,
/// - or [Error::SqlError] there is some SQL error.
pub fn get_transactions_in_range(
    user_id: &UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    if start > end {
        return Err(Error::InvalidDateRange);
    }

    connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM \"transaction\"
            WHERE user_id = ?1 AND is_deleted = 0 AND date BETWEEN ?2 AND ?3
            ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id.as_str(), start, end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// The months in which the user has transactions, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transaction_months(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<MonthKey>, Error> {
    let raw_months = connection
        .prepare(
            "SELECT DISTINCT substr(date, 1, 7) AS month FROM \"transaction\"
            WHERE user_id = :user_id AND is_deleted = 0
            ORDER BY month DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_str())], |row| {
            row.get::<_, String>(0)
        })?
        .collect::<Result<Vec<String>, rusqlite::Error>>()?;

    raw_months.iter().map(|month| month.parse()).collect()
}

/// Change the category of one of the user's transactions and record the correction.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the transaction does not exist or was deleted,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction_category(
    user_id: &UserId,
    id: TransactionId,
    category: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old_category: String = sql_transaction
        .query_row(
            "SELECT category FROM \"transaction\"
            WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0",
            (id, user_id.as_str()),
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::UpdateMissingTransaction)?;

    sql_transaction.execute(
        "UPDATE \"transaction\" SET category = ?1 WHERE id = ?2",
        (category, id),
    )?;

    if old_category != category {
        sql_transaction.execute(
            "INSERT INTO category_correction
                (user_id, transaction_id, old_category, new_category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                user_id.as_str(),
                id,
                &old_category,
                category,
                OffsetDateTime::now_utc(),
            ),
        )?;
    }

    let transaction = get_transaction(user_id, id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transaction)
}

/// Mark one of the user's transactions as deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the transaction does not exist or was already deleted,
/// - or [Error::SqlError] there is some other SQL error.
pub fn soft_delete_transaction(
    user_id: &UserId,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET is_deleted = 1
        WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0",
        (id, user_id.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the number of the user's transactions that have not been deleted.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(user_id: &UserId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1 AND is_deleted = 0;",
            [user_id.as_str()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the transaction and category correction tables in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                is_manual INTEGER NOT NULL DEFAULT 0,
                is_imported INTEGER NOT NULL DEFAULT 0,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Every query is scoped to a user and most filter on date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS category_correction (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                transaction_id INTEGER NOT NULL,
                old_category TEXT NOT NULL,
                new_category TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Expects the columns `id, date, description, amount, category` in that order.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let date = row.get(1)?;
    let description = row.get(2)?;
    let amount = row.get(3)?;
    let category = row.get(4)?;

    Ok(Transaction {
        id,
        date,
        description,
        amount,
        category,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{Date, Month, macros::date};

    use crate::{
        Error,
        db::initialize,
        month::MonthKey,
        transaction::{
            Transaction, TransactionKind, count_transactions, create_transaction,
            get_transaction, get_transaction_months, get_transactions,
            get_transactions_in_range, soft_delete_transaction, update_transaction_category,
        },
        user::UserId,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn create_rejects_years_outside_four_digits() {
        let conn = get_test_connection();

        let date = Date::from_calendar_date(-1, Month::January, 1).unwrap();

        let result = create_transaction(&alice(), Transaction::build(-1.0, date, "Pay"), &conn);

        assert_eq!(result, Err(Error::YearOutOfRange(-1)));
        assert_eq!(get_transaction_months(&alice(), &conn), Ok(vec![]));
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            &alice(),
            Transaction::build(amount, date!(2025 - 10 - 05), "Pay").category("Salary"),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.category, "Salary");
                assert_eq!(transaction.date, date!(2025 - 10 - 05));
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn builder_defaults_to_uncategorized() {
        let builder = Transaction::build(1.0, date!(2025 - 10 - 05), "");

        assert_eq!(builder.category, "Uncategorized");
    }

    #[test]
    fn kind_normalizes_sign() {
        let day = date!(2025 - 10 - 05);

        assert_eq!(
            Transaction::build(50.0, day, "")
                .kind(TransactionKind::Expense)
                .amount,
            -50.0
        );
        assert_eq!(
            Transaction::build(-50.0, day, "")
                .kind(TransactionKind::Income)
                .amount,
            50.0
        );
        assert_eq!(
            Transaction::build(-50.0, day, "")
                .kind(TransactionKind::Expense)
                .amount,
            -50.0
        );
    }

    #[test]
    fn get_transaction_is_scoped_to_user() {
        let conn = get_test_connection();
        let created =
            create_transaction(&alice(), Transaction::build(1.0, date!(2025 - 10 - 05), ""), &conn)
                .unwrap();

        let result = get_transaction(&UserId::new("bob"), created.id, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_transactions_newest_first() {
        let conn = get_test_connection();
        for day in [date!(2025 - 01 - 02), date!(2025 - 03 - 01), date!(2025 - 02 - 10)] {
            create_transaction(&alice(), Transaction::build(1.0, day, ""), &conn).unwrap();
        }

        let transactions = get_transactions(&alice(), &conn).unwrap();

        let dates: Vec<_> = transactions.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date!(2025 - 03 - 01), date!(2025 - 02 - 10), date!(2025 - 01 - 02)]
        );
    }

    #[test]
    fn get_transactions_in_range_is_inclusive() {
        let conn = get_test_connection();
        for day in [
            date!(2025 - 01 - 31),
            date!(2025 - 02 - 01),
            date!(2025 - 02 - 28),
            date!(2025 - 03 - 01),
        ] {
            create_transaction(&alice(), Transaction::build(1.0, day, ""), &conn).unwrap();
        }

        let transactions =
            get_transactions_in_range(&alice(), date!(2025 - 02 - 01), date!(2025 - 02 - 28), &conn)
                .unwrap();

        let dates: Vec<_> = transactions.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date!(2025 - 02 - 01), date!(2025 - 02 - 28)]);
    }

    #[test]
    fn get_transactions_in_range_rejects_reversed_range() {
        let conn = get_test_connection();

        let result =
            get_transactions_in_range(&alice(), date!(2025 - 02 - 02), date!(2025 - 02 - 01), &conn);

        assert_eq!(result, Err(Error::InvalidDateRange));
    }

    #[test]
    fn transaction_months_are_distinct_and_newest_first() {
        let conn = get_test_connection();
        for day in [date!(2024 - 12 - 02), date!(2025 - 02 - 01), date!(2025 - 02 - 20)] {
            create_transaction(&alice(), Transaction::build(1.0, day, ""), &conn).unwrap();
        }

        let months = get_transaction_months(&alice(), &conn).unwrap();

        assert_eq!(
            months,
            vec![
                MonthKey::new(2025, Month::February),
                MonthKey::new(2024, Month::December),
            ]
        );
    }

    #[test]
    fn update_category_records_correction() {
        let conn = get_test_connection();
        let created =
            create_transaction(&alice(), Transaction::build(-4.5, date!(2025 - 10 - 05), ""), &conn)
                .unwrap();

        let updated = update_transaction_category(&alice(), created.id, "Cafes", &conn).unwrap();

        assert_eq!(updated.category, "Cafes");
        let (old, new): (String, String) = conn
            .query_row(
                "SELECT old_category, new_category FROM category_correction WHERE transaction_id = ?1",
                [created.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(old, "Uncategorized");
        assert_eq!(new, "Cafes");
    }

    #[test]
    fn update_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = update_transaction_category(&alice(), 42, "Cafes", &conn);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn soft_delete_hides_transaction() {
        let conn = get_test_connection();
        let created =
            create_transaction(&alice(), Transaction::build(1.0, date!(2025 - 10 - 05), ""), &conn)
                .unwrap();

        soft_delete_transaction(&alice(), created.id, &conn).unwrap();

        assert_eq!(count_transactions(&alice(), &conn), Ok(0));
        assert_eq!(
            get_transaction(&alice(), created.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            soft_delete_transaction(&alice(), created.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }
}

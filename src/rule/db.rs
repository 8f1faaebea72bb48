use rusqlite::{Connection, Row};

use crate::{
    Error,
    rule::models::{Rule, RuleId},
    user::UserId,
};

/// Create a rule in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_rule(
    user_id: &UserId,
    pattern: &str,
    category: &str,
    connection: &Connection,
) -> Result<Rule, Error> {
    connection.execute(
        "INSERT INTO categorization_rule (user_id, pattern, category) VALUES (?1, ?2, ?3);",
        (user_id.as_str(), pattern, category),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Rule {
        id,
        pattern: pattern.to_string(),
        category: category.to_string(),
    })
}

/// Retrieve the user's rules in the order they should be tried.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_rules(user_id: &UserId, connection: &Connection) -> Result<Vec<Rule>, Error> {
    connection
        // Sort by descending length to ensure that ambiguous patterns (e.g, uber, uber eats)
        // always match the more specific (longer) pattern first
        .prepare(
            "SELECT id, pattern, category FROM categorization_rule
            WHERE user_id = :user_id
            ORDER BY LENGTH(pattern) DESC, id ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_str())], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the user's rules.
///
/// # Errors
/// This function will return an error if there is an SQL error or if the rule doesn't exist.
pub(super) fn delete_rule(
    user_id: &UserId,
    rule_id: RuleId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM categorization_rule WHERE id = ?1 AND user_id = ?2",
        (rule_id, user_id.as_str()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    Ok(())
}

/// Initialize the rule table.
pub fn create_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS categorization_rule (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            pattern TEXT NOT NULL,
            category TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_categorization_rule_user ON categorization_rule(user_id);",
    )?;

    Ok(())
}

fn map_rule_row(row: &Row) -> Result<Rule, rusqlite::Error> {
    Ok(Rule {
        id: row.get(0)?,
        pattern: row.get(1)?,
        category: row.get(2)?,
    })
}

//! Local user records keyed by the identity provider's subject.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Claims, Error, category::seed_default_taxonomy, rule::seed_default_rules};

/// A newtype wrapper for the subject identifier issued by the identity provider.
///
/// This helps disambiguate user IDs from other strings, leading to better compile time
/// errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The identity provider's subject for the user.
    pub id: UserId,
    /// The user's email address, if the identity provider shared it.
    pub email: Option<String>,
    /// The user's display name, if the identity provider shared it.
    pub name: Option<String>,
    /// When the user record was first created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT,
                name TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert the user if they do not exist yet, otherwise refresh their email and name.
///
/// A newly created user gets the default categories and categorization rules.
/// Returns the user and whether the record was created by this call.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn upsert_user(
    id: &UserId,
    email: Option<&str>,
    name: Option<&str>,
    connection: &Connection,
) -> Result<(User, bool), Error> {
    let transaction = connection.unchecked_transaction()?;

    let exists = transaction
        .query_row("SELECT 1 FROM user WHERE id = ?1", [id.as_str()], |_| Ok(()))
        .optional()?
        .is_some();

    let created = if exists {
        transaction.execute(
            "UPDATE user SET email = COALESCE(?1, email), name = COALESCE(?2, name)
            WHERE id = ?3",
            (email, name, id.as_str()),
        )?;
        false
    } else {
        transaction.execute(
            "INSERT INTO user (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            (id.as_str(), email, name, OffsetDateTime::now_utc()),
        )?;
        seed_default_taxonomy(id, &transaction)?;
        seed_default_rules(id, &transaction)?;
        tracing::info!("Created user {id} with the default categories and rules");
        true
    };

    let user = get_user(id, &transaction)?;
    transaction.commit()?;

    Ok((user, created))
}

/// Get the user with the ID `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a known user ([Error::UserNotFound]).
/// - there was an error trying to access the store.
pub fn get_user(user_id: &UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_str())], map_user_row)
        .optional()?
        .ok_or(Error::UserNotFound)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id: String = row.get(0)?;

    Ok(User {
        id: UserId(raw_id),
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// The state needed by the user endpoints.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that creates or refreshes the caller's user record from their token.
///
/// Responds with 201 when the user was created and 200 when they already existed.
pub async fn upsert_user_endpoint(
    State(state): State<UserState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user_id = UserId::new(&claims.sub);
    let (user, created) = upsert_user(
        &user_id,
        claims.email.as_deref(),
        claims.name.as_deref(),
        &connection,
    )?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(user)).into_response())
}

/// A route handler that returns the caller's user record.
pub async fn get_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<User>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_user(&user_id, &connection).map(Json)
}

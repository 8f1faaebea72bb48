//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, auth::AuthConfig, db::initialize, report::ReportConfig};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// How bearer tokens are verified.
    pub auth_config: Arc<AuthConfig>,

    /// The config for the report endpoints.
    pub report_config: ReportConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        auth_config: AuthConfig,
        report_config: ReportConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            auth_config: Arc::new(auth_config),
            report_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

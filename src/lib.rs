//! A JSON API for a personal budget.
//!
//! Authenticated users record income and expense transactions, sort them into
//! categories grouped by section, and read aggregated views of their data:
//! monthly totals, per-category expense breakdowns and a rolling monthly
//! history.
//!
//! Authentication is delegated to an external identity provider. This library
//! only verifies the bearer tokens it issues, see [AuthConfig].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod aggregation;
mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod import;
mod logging;
mod month;
mod report;
mod routing;
mod rule;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{AuthConfig, Claims};
pub use category::{Section, Taxonomy, seed_default_taxonomy};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use month::MonthKey;
pub use report::ReportConfig;
pub use routing::build_router;
pub use rule::seed_default_rules;
pub use transaction::{Transaction, TransactionBuilder, create_transaction};
pub use user::{UserId, upsert_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a bearer token in the `Authorization` header.
    #[error("missing bearer token")]
    MissingToken,

    /// The bearer token could not be verified, e.g. a bad signature, the
    /// wrong audience or issuer, or it has expired.
    ///
    /// The string holds the reason and should only be logged on the server.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The key used to verify bearer tokens could not be loaded.
    #[error("invalid token verification key: {0}")]
    InvalidVerificationKey(String),

    /// No user record exists for the authenticated subject.
    #[error("User not found")]
    UserNotFound,

    /// The month in a request path was not between 1 and 12.
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// A year fell outside the range that month keys and stored dates support.
    #[error("{0} is not a supported year, expected a year from 0 to 9999")]
    YearOutOfRange(i32),

    /// A month key string was not in the `YYYY-MM` format.
    #[error("could not parse \"{0}\" as a month, expected the format YYYY-MM")]
    InvalidMonthKey(String),

    /// The start of a date range was after its end.
    #[error("the start date must not be after the end date")]
    InvalidDateRange,

    /// An empty string was used as a section name.
    #[error("Section name cannot be empty")]
    EmptySectionName,

    /// An empty string was used as a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The category already exists in the section.
    #[error("the category \"{0}\" already exists in this section")]
    DuplicateCategory(String),

    /// The category is not part of the user's taxonomy.
    #[error("Category not found.")]
    CategoryNotFound(String),

    /// A description is needed to predict a category.
    #[error("Description is required.")]
    EmptyDescription,

    /// An empty string was used as a rule pattern.
    #[error("Rule pattern cannot be empty")]
    EmptyRulePattern,

    /// Tried to delete a rule that does not exist.
    #[error("Rule not found.")]
    DeleteMissingRule,

    /// Tried to update a transaction that does not exist or has been deleted.
    #[error("Transaction not found.")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist or has been deleted.
    #[error("Transaction not found.")]
    DeleteMissingTransaction,

    /// The multipart form could not be read.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// An uploaded file was not a CSV file.
    #[error("Unsupported file format. Please upload a CSV file.")]
    UnsupportedFileFormat,

    /// The uploaded CSV lacked one or more of the required columns.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingToken | Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Error::UserNotFound
            | Error::CategoryNotFound(_)
            | Error::DeleteMissingRule
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateCategory(_) => StatusCode::CONFLICT,
            Error::InvalidMonth(_)
            | Error::YearOutOfRange(_)
            | Error::InvalidMonthKey(_)
            | Error::InvalidDateRange
            | Error::EmptySectionName
            | Error::EmptyCategoryName
            | Error::EmptyDescription
            | Error::EmptyRulePattern
            | Error::MultipartError(_)
            | Error::UnsupportedFileFormat
            | Error::MissingColumns(_)
            | Error::InvalidCSV(_) => StatusCode::BAD_REQUEST,
            Error::InvalidVerificationKey(_) | Error::SqlError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match self {
            // The reason a token was rejected is not for the client.
            Error::InvalidToken(reason) => {
                tracing::warn!("Rejected bearer token: {reason}");
                "Invalid token".to_owned()
            }
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn not_found_errors_map_to_404() {
        for error in [
            Error::NotFound,
            Error::UserNotFound,
            Error::DeleteMissingTransaction,
            Error::CategoryNotFound("Rent".to_owned()),
        ] {
            assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn token_errors_map_to_401() {
        assert_eq!(
            Error::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::InvalidToken("expired".to_owned())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn missing_columns_lists_columns() {
        let error = Error::MissingColumns(vec!["date".to_owned(), "amount".to_owned()]);

        assert_eq!(error.to_string(), "Missing required columns: date, amount");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn no_rows_becomes_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    AppState, Error,
    category::{Taxonomy, get_taxonomy},
    import::csv::{ImportRow, parse_csv},
    rule::{Rule, choose_category, get_rules},
    transaction::{Transaction, create_transaction},
    user::UserId,
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body for a finished import.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    /// A message for the user.
    pub detail: String,
    /// The number of new transactions.
    pub imported: usize,
    /// The number of rows that were already stored.
    pub skipped: usize,
}

/// Route handler for importing transactions from uploaded CSV files.
///
/// Every file is parsed before anything is written, so a bad file imports nothing.
pub async fn import_transactions_endpoint(
    State(state): State<ImportState>,
    Extension(user_id): Extension<UserId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportSummary>), Error> {
    let start_time = std::time::Instant::now();
    let mut rows = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        let csv_data = parse_multipart_field(field).await?;
        rows.extend(
            parse_csv(&csv_data)
                .inspect_err(|error| tracing::debug!("Failed to parse CSV: {error}"))?,
        );
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let taxonomy = get_taxonomy(&user_id, &connection)?;
    let rules = get_rules(&user_id, &connection)?;

    let tx = connection
        .unchecked_transaction()
        .inspect_err(|error| tracing::error!("could not start transaction: {error}"))?;
    let (imported, skipped) = import_rows(&user_id, rows, &taxonomy, &rules, &tx)?;
    tx.commit()
        .inspect_err(|error| tracing::error!("could not commit transaction: {error}"))?;

    tracing::info!(
        "Imported {} transactions and skipped {skipped} duplicates for user {user_id} in {}ms",
        imported.len(),
        start_time.elapsed().as_millis()
    );

    Ok((
        StatusCode::CREATED,
        Json(ImportSummary {
            detail: format!("Successfully imported {} transactions", imported.len()),
            imported: imported.len(),
            skipped,
        }),
    ))
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let is_csv = file_name.to_lowercase().ends_with(".csv")
        || field.content_type() == Some("text/csv");

    if !is_csv {
        tracing::debug!(
            "Rejected upload '{file_name}' with content type {:?}",
            field.content_type()
        );
        return Err(Error::UnsupportedFileFormat);
    }

    let data = field.text().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

/// Identifies rows that describe the same transaction.
type DuplicateKey = (String, Date, u64, String);

/// Insert `rows` for the user, skipping rows that are already stored.
///
/// A file may legitimately contain identical rows, e.g. two coffees on the same
/// day, so a row only counts as a duplicate while the number of identical rows
/// seen so far does not exceed the number already stored.
///
/// Returns the inserted transactions and the number of skipped rows.
///
/// **Note**: If you want transactional integrity (all or nothing), pass in a
/// transaction for `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
fn import_rows(
    user_id: &UserId,
    rows: Vec<ImportRow>,
    taxonomy: &Taxonomy,
    rules: &[Rule],
    connection: &Connection,
) -> Result<(Vec<Transaction>, usize), Error> {
    let mut count_statement = connection.prepare(
        "SELECT COUNT(*) FROM \"transaction\"
         WHERE user_id = ?1 AND description = ?2 AND date = ?3 AND amount = ?4
            AND category = ?5 AND is_deleted = 0",
    )?;

    let mut stored_counts: HashMap<DuplicateKey, usize> = HashMap::new();
    let mut seen_counts: HashMap<DuplicateKey, usize> = HashMap::new();
    let mut imported = Vec::new();
    let mut skipped = 0;

    for row in rows {
        let category = choose_category(row.category.as_deref(), &row.description, rules, taxonomy);
        let key = (
            row.description.clone(),
            row.date,
            row.amount.to_bits(),
            category.clone(),
        );

        let stored = match stored_counts.get(&key) {
            Some(&count) => count,
            None => {
                let count: i64 = count_statement.query_row(
                    (user_id.as_str(), &row.description, row.date, row.amount, &category),
                    |sql_row| sql_row.get(0),
                )?;
                let count = usize::try_from(count)
                    .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count))?;
                stored_counts.insert(key.clone(), count);
                count
            }
        };

        let seen = seen_counts.entry(key).or_default();
        *seen += 1;

        if *seen <= stored {
            tracing::debug!(
                "Skipping duplicate row \"{}\" on {} for {}",
                row.description,
                row.date,
                row.amount
            );
            skipped += 1;
            continue;
        }

        let builder = Transaction::build(row.amount, row.date, &row.description)
            .category(&category)
            .imported();
        imported.push(create_transaction(user_id, builder, connection)?);
    }

    Ok((imported, skipped))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use serde_json::{Value, json};

    use crate::test_utils::get_test_server_with_user;

    const STATEMENT: &str = "Date,Description,Amount,Category\n\
        2024-01-05,Corner Store,-12.50,groceries\n\
        2024-01-06,ACME PAYROLL,2000,\n\
        2024-01-07,Starbucks,-4.50,\n\
        2024-01-07,Starbucks,-4.50,\n\
        2024-01-08,Mystery,-1.00,\n";

    fn csv_form(text: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::text(text.to_owned())
                .file_name("statement.csv")
                .mime_type("text/csv"),
        )
    }

    async fn get_categories(server: &TestServer, token: &str) -> Vec<(String, String)> {
        server
            .get("/transactions")
            .authorization_bearer(token)
            .await
            .json::<Vec<Value>>()
            .into_iter()
            .map(|transaction| {
                (
                    transaction["description"].as_str().unwrap().to_owned(),
                    transaction["category"].as_str().unwrap().to_owned(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn imports_csv_and_categorizes_rows() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form(STATEMENT))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["imported"], 5);
        assert_eq!(body["skipped"], 0);

        let categories = get_categories(&server, &token).await;
        assert!(categories.contains(&("Corner Store".to_owned(), "Groceries".to_owned())));
        assert!(categories.contains(&("ACME PAYROLL".to_owned(), "Salary".to_owned())));
        assert!(categories.contains(&("Starbucks".to_owned(), "Cafes".to_owned())));
        assert!(categories.contains(&("Mystery".to_owned(), "Uncategorized".to_owned())));
    }

    #[tokio::test]
    async fn reimport_skips_existing_rows() {
        let (server, token) = get_test_server_with_user("alice");
        server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form(STATEMENT))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form(STATEMENT))
            .await;

        let body = response.json::<Value>();
        assert_eq!(body["imported"], 0);
        assert_eq!(body["skipped"], 5);
    }

    #[tokio::test]
    async fn extra_identical_rows_are_imported() {
        let (server, token) = get_test_server_with_user("alice");
        server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form(
                "Date,Description,Amount\n2024-01-07,Starbucks,-4.50\n",
            ))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form(STATEMENT))
            .await;

        let body = response.json::<Value>();
        assert_eq!(body["imported"], 4);
        assert_eq!(body["skipped"], 1);
    }

    #[tokio::test]
    async fn accepts_multiple_files() {
        let (server, token) = get_test_server_with_user("alice");
        let form = MultipartForm::new()
            .add_part(
                "files",
                Part::text("Date,Description,Amount\n2024-01-01,Rent,-900\n")
                    .file_name("january.CSV"),
            )
            .add_part(
                "files",
                Part::text("Date,Description,Amount\n2024-02-01,Rent,-900\n")
                    .file_name("february.csv"),
            );

        let response = server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        assert_eq!(response.json::<Value>()["imported"], 2);
    }

    #[tokio::test]
    async fn rejects_spreadsheets() {
        let (server, token) = get_test_server_with_user("alice");
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(vec![0x50, 0x4b, 0x03, 0x04])
                .file_name("statement.xlsx")
                .mime_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        );

        let response = server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "detail": "Unsupported file format. Please upload a CSV file."
        }));
    }

    #[tokio::test]
    async fn missing_columns_import_nothing() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form("Date,Memo\n2024-01-01,Coffee\n"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "detail": "Missing required columns: description, amount"
        }));
        assert!(get_categories(&server, &token).await.is_empty());
    }

    #[tokio::test]
    async fn non_finite_amounts_are_rejected() {
        let (server, token) = get_test_server_with_user("alice");

        for amount in ["NaN", "inf", "-infinity"] {
            let text = format!("Date,Description,Amount\n2024-01-01,Coffee,{amount}\n");

            let response = server
                .post("/transactions/import")
                .authorization_bearer(&token)
                .multipart(csv_form(&text))
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let detail = response.json::<Value>()["detail"].as_str().unwrap().to_owned();
            assert!(detail.contains("line 2"), "got {detail:?} for {amount:?}");
        }

        assert!(get_categories(&server, &token).await.is_empty());
        server
            .get("/transactions/totals/2024/1")
            .authorization_bearer(&token)
            .await
            .assert_json(&json!({"income": 0.0, "expenses": 0.0}));
    }

    #[tokio::test]
    async fn dates_before_year_zero_are_rejected() {
        let (server, token) = get_test_server_with_user("alice");

        server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(csv_form("Date,Description,Amount\n-0001-01-01,Coffee,-4\n"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .get("/transactions/range")
            .authorization_bearer(&token)
            .await
            .assert_json(&json!([]));
    }

    #[tokio::test]
    async fn bad_file_rolls_back_whole_upload() {
        let (server, token) = get_test_server_with_user("alice");
        let form = csv_form(STATEMENT).add_part(
            "file",
            Part::text("Date,Description,Amount\nyesterday,Coffee,-4\n").file_name("bad.csv"),
        );

        server
            .post("/transactions/import")
            .authorization_bearer(&token)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert!(get_categories(&server, &token).await.is_empty());
    }
}

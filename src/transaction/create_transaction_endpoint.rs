//! Defines the endpoint for creating a new transaction.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    category::get_taxonomy,
    rule::{choose_category, get_rules},
    transaction::{Transaction, TransactionKind, TransactionState, core::create_transaction},
    user::UserId,
};

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionData {
    /// The value of the transaction in dollars.
    pub amount: f64,
    /// The date when the transaction ocurred.
    pub date: Date,
    /// Text detailing the transaction.
    pub description: String,
    /// The category name. Predicted from the description when absent or unknown.
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the amount is money spent or earned. The amount is stored as given when absent.
    #[serde(default)]
    pub kind: Option<TransactionKind>,
}

/// A route handler for creating a new transaction, responds with the created transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Json(data): Json<TransactionData>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let description = data.description.trim();
    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let taxonomy = get_taxonomy(&user_id, &connection)?;
    let rules = get_rules(&user_id, &connection)?;
    let category = choose_category(data.category.as_deref(), description, &rules, &taxonomy);

    let mut builder = Transaction::build(data.amount, data.date, description).category(&category);
    if let Some(kind) = data.kind {
        builder = builder.kind(kind);
    }

    let transaction = create_transaction(&user_id, builder, &connection)?;
    tracing::info!(
        "Created transaction {} in category \"{}\" for user {user_id}",
        transaction.id,
        transaction.category
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::test_utils::get_test_server_with_user;

    #[tokio::test]
    async fn can_create_transaction() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "date": "2025-10-05",
                "description": "test transaction",
                "amount": 12.3,
                "category": "Salary"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["amount"], 12.3);
        assert_eq!(body["date"], "2025-10-05");
        assert_eq!(body["category"], "Salary");
        assert!(body["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn expense_kind_makes_amount_negative() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "date": "2025-10-05",
                "description": "Weekly shop",
                "amount": 80.0,
                "category": "groceries",
                "kind": "expense"
            }))
            .await;

        let body = response.json::<Value>();
        assert_eq!(body["amount"], -80.0);
        assert_eq!(body["category"], "Groceries");
    }

    #[tokio::test]
    async fn unknown_category_is_predicted() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "date": "2025-10-05",
                "description": "SPOTIFY P1234",
                "amount": -11.99,
                "category": "Music"
            }))
            .await;

        assert_eq!(response.json::<Value>()["category"], "Streaming Services");
    }

    #[tokio::test]
    async fn unpredictable_category_is_uncategorized() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "date": "2025-10-05",
                "description": "Mystery",
                "amount": -1.0
            }))
            .await;

        assert_eq!(response.json::<Value>()["category"], "Uncategorized");
    }

    #[tokio::test]
    async fn empty_description_returns_400() {
        let (server, token) = get_test_server_with_user("alice");

        server
            .post("/transactions")
            .authorization_bearer(&token)
            .json(&json!({"date": "2025-10-05", "description": " ", "amount": 1.0}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn year_before_zero_returns_400_and_reports_still_work() {
        let (server, token) = get_test_server_with_user("alice");

        let response = server
            .post("/transactions")
            .authorization_bearer(&token)
            .json(&json!({"date": "-0001-01-01", "description": "Pay", "amount": 1.0}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "detail": "-1 is not a supported year, expected a year from 0 to 9999"
        }));
        server
            .get("/transactions/range")
            .authorization_bearer(&token)
            .await
            .assert_json(&json!([]));
        server
            .get("/transactions/history")
            .authorization_bearer(&token)
            .await
            .assert_json(&json!({}));
    }
}

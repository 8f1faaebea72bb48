use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    rule::{
        db::delete_rule,
        models::{RuleId, RuleState},
    },
    user::UserId,
};

/// A route handler for deleting a rule.
pub async fn delete_rule_endpoint(
    Path(rule_id): Path<RuleId>,
    State(state): State<RuleState>,
    Extension(user_id): Extension<UserId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_rule(&user_id, rule_id, &connection) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(Error::DeleteMissingRule) => Err(Error::DeleteMissingRule),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting rule {rule_id}: {error}");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::test_utils::{bearer_token, get_test_server};

    #[tokio::test]
    async fn delete_rule_succeeds() {
        let server = get_test_server();
        let token = bearer_token("alice");
        let rule = server
            .post("/rules")
            .authorization_bearer(&token)
            .json(&json!({"pattern": "corner cafe", "category": "Cafes"}))
            .await
            .json::<Value>();

        let response = server
            .delete(&format!("/rules/{}", rule["id"]))
            .authorization_bearer(&token)
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn delete_missing_rule_returns_404() {
        let server = get_test_server();

        let response = server
            .delete("/rules/999")
            .authorization_bearer(bearer_token("alice"))
            .await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["detail"], "Rule not found.");
    }
}

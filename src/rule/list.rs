use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    rule::{
        db::get_rules,
        models::{Rule, RuleState},
    },
    user::UserId,
};

/// Route handler for listing the user's rules in the order they are tried.
pub async fn get_rules_endpoint(
    State(state): State<RuleState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<Rule>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_rules(&user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve rules: {error}"))?;

    Ok(Json(rules))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::test_utils::{bearer_token, get_test_server};

    #[tokio::test]
    async fn lists_only_own_rules() {
        let server = get_test_server();
        server
            .post("/rules")
            .authorization_bearer(bearer_token("alice"))
            .json(&json!({"pattern": "corner cafe", "category": "Cafes"}))
            .await
            .assert_status_success();

        let alice = server
            .get("/rules")
            .authorization_bearer(bearer_token("alice"))
            .await
            .json::<Vec<Value>>();
        let bob = server
            .get("/rules")
            .authorization_bearer(bearer_token("bob"))
            .await
            .json::<Vec<Value>>();

        assert_eq!(alice.len(), 1);
        assert!(bob.is_empty());
    }
}

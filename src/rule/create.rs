use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    Error,
    rule::{
        db::create_rule,
        models::{Rule, RuleFormData, RuleState},
    },
    user::UserId,
};

/// A route handler for creating a new rule.
pub async fn create_rule_endpoint(
    State(state): State<RuleState>,
    Extension(user_id): Extension<UserId>,
    Json(new_rule): Json<RuleFormData>,
) -> Result<(StatusCode, Json<Rule>), Error> {
    let pattern = new_rule.pattern.trim();
    if pattern.is_empty() {
        return Err(Error::EmptyRulePattern);
    }

    let category = new_rule.category.trim();
    if category.is_empty() {
        return Err(Error::EmptyCategoryName);
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = create_rule(&user_id, pattern, category, &connection).inspect_err(|error| {
        tracing::error!("An unexpected error occurred while creating a rule: {error}")
    })?;

    tracing::info!("Created rule {} for user {user_id}", rule.id);

    Ok((StatusCode::CREATED, Json(rule)))
}

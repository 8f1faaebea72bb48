use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, database_id::DatabaseId};

/// Database identifier for a categorization rule.
pub type RuleId = DatabaseId;

/// A rule that assigns a category to transactions whose descriptions contain a pattern.
/// Pattern matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Rule {
    pub id: RuleId,

    /// The text that transaction descriptions must contain (case-insensitive).
    pub pattern: String,

    /// The name of the category to predict when this rule matches.
    pub category: String,
}

/// Unified state for all rule-related operations.
#[derive(Debug, Clone)]
pub struct RuleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Request body for creating rules.
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleFormData {
    /// The text that transaction descriptions must contain (case-insensitive).
    pub pattern: String,
    /// The name of the category to predict.
    pub category: String,
}

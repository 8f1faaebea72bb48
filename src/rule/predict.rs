//! Category prediction from transaction descriptions.

use serde::Serialize;

use crate::{aggregation::UNCATEGORIZED, category::Taxonomy, rule::models::Rule};

/// The outcome of predicting a transaction's category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The category name, spelled as in the user's taxonomy, or "Uncategorized".
    pub predicted_category: String,
    /// 1.0 when a rule matched, 0.0 otherwise.
    pub confidence: f64,
    /// Whether the caller should ask the user to confirm the category.
    pub is_uncertain: bool,
}

impl Prediction {
    fn uncategorized() -> Self {
        Self {
            predicted_category: UNCATEGORIZED.to_owned(),
            confidence: 0.0,
            is_uncertain: true,
        }
    }
}

/// Predict the category for `description` with the first rule that matches.
///
/// `rules` must already be in the order they should be tried, see
/// [get_rules](crate::rule::get_rules).
/// The prediction falls back to "Uncategorized" when no rule matches or the
/// matching rule names a category that is not in `taxonomy`.
pub fn predict_category(description: &str, rules: &[Rule], taxonomy: &Taxonomy) -> Prediction {
    let Some(rule) = rules
        .iter()
        .find(|rule| matches_rule_pattern(description, &rule.pattern))
    else {
        return Prediction::uncategorized();
    };

    match taxonomy.find_category(&rule.category) {
        Some(category) => Prediction {
            predicted_category: category.to_owned(),
            confidence: 1.0,
            is_uncertain: false,
        },
        None => {
            tracing::debug!(
                "Rule {} matched \"{description}\" but its category \"{}\" is not in the taxonomy",
                rule.id,
                rule.category
            );
            Prediction::uncategorized()
        }
    }
}

/// Pick the category to store for a new transaction.
///
/// A `requested` category is kept when it is in `taxonomy`, using the taxonomy's spelling.
/// Otherwise the category is predicted from `description`.
pub fn choose_category(
    requested: Option<&str>,
    description: &str,
    rules: &[Rule],
    taxonomy: &Taxonomy,
) -> String {
    match requested.and_then(|category| taxonomy.find_category(category)) {
        Some(category) => category.to_owned(),
        None => predict_category(description, rules, taxonomy).predicted_category,
    }
}

/// Check if a transaction description contains a rule pattern (case-insensitive).
#[inline]
fn matches_rule_pattern(description: &str, pattern: &str) -> bool {
    description
        .to_lowercase()
        .contains(&pattern.to_lowercase())
}

//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/rules/{rule_id}', use [format_endpoint].

/// The route for checking that the server is up.
pub const PING: &str = "/ping";
/// The route for the caller's user record.
pub const USERS: &str = "/users";
/// The route to access the caller's taxonomy.
pub const CATEGORIES: &str = "/categories";
/// The route to predict the category of a description.
pub const PREDICT_CATEGORY: &str = "/categories/predict";
/// The route to access categorization rules.
pub const RULES: &str = "/rules";
/// The route to delete a rule.
pub const RULE: &str = "/rules/{rule_id}";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to change the category of a transaction.
pub const UPDATE_TRANSACTION: &str = "/transactions/update";
/// The route to upload CSV files for importing transactions.
pub const IMPORT: &str = "/transactions/import";
/// The route to delete a transaction, `key` is the transaction ID.
// The router needs a single name for the segment after '/transactions/'.
pub const TRANSACTION: &str = "/transactions/{key}";
/// The route for a month's transactions, `key` is the year.
pub const MONTH_TRANSACTIONS: &str = "/transactions/{key}/{month}";
/// The route for a month's transactions grouped by section.
pub const GROUPED: &str = "/transactions/grouped/{year}/{month}";
/// The route for a month's income and expense totals.
pub const TOTALS: &str = "/transactions/totals/{year}/{month}";
/// The route for a month's expenses per category.
pub const EXPENSES: &str = "/transactions/expenses/{year}/{month}";
/// The route for monthly totals over a window of months.
pub const HISTORY: &str = "/transactions/history";
/// The route for the months that have transactions.
pub const RANGE: &str = "/transactions/range";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/rules/{rule_id}', '{rule_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::PING);
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::PREDICT_CATEGORY);
        assert_endpoint_is_valid_uri(endpoints::RULES);
        assert_endpoint_is_valid_uri(endpoints::RULE);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::UPDATE_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::IMPORT);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::MONTH_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::GROUPED);
        assert_endpoint_is_valid_uri(endpoints::TOTALS);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES);
        assert_endpoint_is_valid_uri(endpoints::HISTORY);
        assert_endpoint_is_valid_uri(endpoints::RANGE);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn only_first_parameter_is_replaced() {
        assert_eq!(format_endpoint(endpoints::MONTH_TRANSACTIONS, 2024), "/transactions/2024/{month}");
    }
}

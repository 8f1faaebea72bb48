//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    auth::auth_guard,
    category::{create_category_endpoint, get_categories_endpoint, predict_category_endpoint},
    endpoints,
    import::import_transactions_endpoint,
    report::{
        get_expenses_endpoint, get_grouped_endpoint, get_history_endpoint,
        get_month_transactions_endpoint, get_range_endpoint, get_totals_endpoint,
    },
    rule::{create_rule_endpoint, delete_rule_endpoint, get_rules_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
        update_transaction_endpoint,
    },
    user::{get_user_endpoint, upsert_user_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::PING, get(get_ping));

    let protected_routes = Router::new()
        .route(
            endpoints::USERS,
            get(get_user_endpoint).post(upsert_user_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::PREDICT_CATEGORY,
            post(predict_category_endpoint),
        )
        .route(
            endpoints::RULES,
            get(get_rules_endpoint).post(create_rule_endpoint),
        )
        .route(endpoints::RULE, delete(delete_rule_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::UPDATE_TRANSACTION,
            post(update_transaction_endpoint),
        )
        .route(endpoints::IMPORT, post(import_transactions_endpoint))
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::MONTH_TRANSACTIONS,
            get(get_month_transactions_endpoint),
        )
        .route(endpoints::GROUPED, get(get_grouped_endpoint))
        .route(endpoints::TOTALS, get(get_totals_endpoint))
        .route(endpoints::EXPENSES, get(get_expenses_endpoint))
        .route(endpoints::HISTORY, get(get_history_endpoint))
        .route(endpoints::RANGE, get(get_range_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Check that the server is up.
async fn get_ping() -> Json<Value> {
    Json(json!({"ping": "pong!"}))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

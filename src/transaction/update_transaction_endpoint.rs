//! Defines the endpoint for re-categorizing a transaction.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use crate::{
    Error,
    category::get_taxonomy,
    database_id::TransactionId,
    transaction::{Transaction, TransactionState, core::update_transaction_category},
    user::UserId,
};

/// The request body for changing a transaction's category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryData {
    /// The transaction to update.
    pub transaction_id: TransactionId,
    /// The new category name, which must be in the user's taxonomy.
    pub category: String,
}

/// A route handler for changing the category of a transaction.
///
/// The change is recorded as a category correction. Responds with the updated transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Json(data): Json<UpdateCategoryData>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let taxonomy = get_taxonomy(&user_id, &connection)?;
    let category = taxonomy
        .find_category(&data.category)
        .ok_or_else(|| Error::CategoryNotFound(data.category.clone()))?;

    let transaction =
        update_transaction_category(&user_id, data.transaction_id, category, &connection)?;
    tracing::info!(
        "Moved transaction {} to category \"{category}\" for user {user_id}",
        transaction.id
    );

    Ok(Json(transaction))
}

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionState,
        core::{get_transactions, soft_delete_transaction},
    },
    user::UserId,
};

/// A route handler for deleting a transaction, responds with the user's remaining transactions.
///
/// Deleted transactions are kept in the database but hidden from every query.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match soft_delete_transaction(&user_id, transaction_id, &connection) {
        Ok(()) => tracing::info!("Deleted transaction {transaction_id} for user {user_id}"),
        Err(Error::DeleteMissingTransaction) => return Err(Error::DeleteMissingTransaction),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            return Err(error);
        }
    }

    get_transactions(&user_id, &connection).map(Json)
}

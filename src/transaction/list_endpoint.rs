//! Defines the endpoint for listing the latest transactions.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    transaction::{
        Transaction, TransactionState,
        query::{SortOrder, TransactionFilter, query_transactions},
    },
};

/// The most transactions returned by [get_transactions].
pub const LATEST_TRANSACTIONS_LIMIT: u32 = 30;

/// Get the logged-in user's latest transactions, newest first.
pub async fn get_transactions(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    query_transactions(
        user_id,
        &TransactionFilter::default(),
        SortOrder::Descending,
        Some(LATEST_TRANSACTIONS_LIMIT),
        &connection,
    )
    .map(Json)
}

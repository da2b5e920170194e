//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    amount::AmountInput,
    month::parse_request_date,
    transaction::{Transaction, TransactionType, core::create_transaction},
};

/// The state needed to list or create transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a transaction.
///
/// Every field is optional here so that a missing field gets a specific
/// error message rather than a generic parse error.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionData {
    /// A positive amount, as a number or numeric string.
    pub amount: Option<AmountInput>,
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The category, e.g. "Groceries".
    pub category: Option<String>,
    /// An optional description.
    pub description: Option<String>,
    /// "YYYY-MM-DD" or an RFC 3339 date-time.
    pub date: Option<String>,
}

/// A route handler for creating a new transaction for the logged-in user.
///
/// Returns the created transaction.
///
/// # Errors
///
/// Returns a 400 error naming the first invalid field: the amount, the
/// type, the category and then the date.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Json(data), _): WithRejection<Json<TransactionData>, Error>,
) -> Result<Json<Transaction>, Error> {
    let amount = data
        .amount
        .as_ref()
        .and_then(AmountInput::positive)
        .ok_or(Error::InvalidAmount)?;

    let transaction_type: TransactionType = data
        .transaction_type
        .as_deref()
        .and_then(|raw_type| raw_type.parse().ok())
        .ok_or(Error::MissingTransactionType)?;

    let category = data
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .ok_or(Error::MissingCategory)?;

    let date = data
        .date
        .as_deref()
        .and_then(parse_request_date)
        .ok_or(Error::MissingDate)?;

    let builder =
        Transaction::build(amount, transaction_type, category, date).description(data.description);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(user_id, builder, &connection)
        .map(Json)
        .inspect_err(|error| tracing::error!("Could not create transaction: {error}"))
}

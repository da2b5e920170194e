//! Defines the endpoint for the expense totals per category in a month.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    Error, MonthYear, UserID,
    transaction::{
        TransactionState, TransactionType,
        query::{TransactionFilter, sum_by_category},
    },
};

/// The query string for [get_spent_amounts].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentAmountsQuery {
    /// The month as "YYYY-MM".
    pub month_year: Option<String>,
}

/// Get the total spent per category in a month as `{category: amount}`.
///
/// Categories without expenses that month are omitted.
///
/// # Errors
///
/// Returns [Error::InvalidMonthYear] if `monthYear` is missing or not "YYYY-MM".
pub async fn get_spent_amounts(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<SpentAmountsQuery>, Error>,
) -> Result<Json<BTreeMap<String, f64>>, Error> {
    let month: MonthYear = query.month_year.unwrap_or_default().parse()?;
    let filter = TransactionFilter::in_month(month).of_type(TransactionType::Expense);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let spent = sum_by_category(user_id, &filter, &connection)?;

    Ok(Json(spent.into_iter().collect()))
}

//! Dashboard HTTP handlers.
//!
//! This module contains:
//! - The route handler for the dashboard summary of a month
//! - The route handler for the six month income/expense overview
//! - The state and query types used by the handlers

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, MonthYear, UserID,
    budget::total_budgeted,
    dashboard::aggregation::{MonthlyTotals, bucket_by_month, budget_status, percentage_change},
    month::{current_month, trailing_month_windows},
    transaction::{
        Transaction, TransactionType,
        query::{SortOrder, TransactionFilter, query_transactions, sum_transactions},
    },
};

/// Number of months shown in the overview series.
const OVERVIEW_MONTHS: u32 = 6;
/// Number of decimal places the overview series is rounded to.
const OVERVIEW_DECIMALS: i32 = 2;
/// Number of transactions shown in the recent transactions list.
const RECENT_TRANSACTIONS_LIMIT: u32 = 5;

/// The state needed for the dashboard.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string for the dashboard routes.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// The month to summarise as "YYYY-MM", defaults to the current month.
    pub month: Option<String>,
}

impl DashboardQuery {
    fn month_or_current(&self, local_timezone: &str) -> Result<MonthYear, Error> {
        match &self.month {
            Some(raw_month) => raw_month.parse(),
            None => current_month(local_timezone),
        }
    }
}

/// The figures shown on the dashboard for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Income minus expenses for the month.
    pub total_balance: f64,
    /// Total income for the month.
    pub monthly_income: f64,
    /// Total expenses for the month.
    pub monthly_expenses: f64,
    /// Percentage change in income from the previous month.
    pub income_change: f64,
    /// Percentage change in expenses from the previous month.
    pub expense_change: f64,
    /// Expenses as a percentage of the month's budgets.
    pub budget_status: f64,
    /// Income and expenses for the six months ending with this month.
    pub overview: Vec<MonthlyTotals>,
    /// The newest transactions of the month.
    pub recent_transactions: Vec<Transaction>,
}

/// Get the dashboard summary for the logged-in user.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<DashboardQuery>, Error>,
) -> Result<Json<DashboardSummary>, Error> {
    let month = query.month_or_current(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_dashboard_summary(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not build dashboard for {month}: {error}"))
        .map(Json)
}

/// Get the income and expenses of the six months ending with the selected month.
pub async fn get_dashboard_overview(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<DashboardQuery>, Error>,
) -> Result<Json<Vec<MonthlyTotals>>, Error> {
    let month = query.month_or_current(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_overview(user_id, month, &connection).map(Json)
}

fn build_dashboard_summary(
    user_id: UserID,
    month: MonthYear,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let this_month = TransactionFilter::in_month(month);
    let last_month = TransactionFilter::in_month(month.previous());

    let monthly_income = sum_transactions(
        user_id,
        &this_month.of_type(TransactionType::Income),
        connection,
    )?;
    let monthly_expenses = sum_transactions(
        user_id,
        &this_month.of_type(TransactionType::Expense),
        connection,
    )?;
    let previous_income = sum_transactions(
        user_id,
        &last_month.of_type(TransactionType::Income),
        connection,
    )?;
    let previous_expenses = sum_transactions(
        user_id,
        &last_month.of_type(TransactionType::Expense),
        connection,
    )?;
    let total_budget = total_budgeted(user_id, month, connection)?;

    let recent_transactions = query_transactions(
        user_id,
        &this_month,
        SortOrder::Descending,
        Some(RECENT_TRANSACTIONS_LIMIT),
        connection,
    )?;

    Ok(DashboardSummary {
        total_balance: monthly_income - monthly_expenses,
        monthly_income,
        monthly_expenses,
        income_change: percentage_change(monthly_income, previous_income),
        expense_change: percentage_change(monthly_expenses, previous_expenses),
        budget_status: budget_status(monthly_expenses, total_budget),
        overview: get_overview(user_id, month, connection)?,
        recent_transactions,
    })
}

fn get_overview(
    user_id: UserID,
    month: MonthYear,
    connection: &Connection,
) -> Result<Vec<MonthlyTotals>, Error> {
    let windows = trailing_month_windows(month, OVERVIEW_MONTHS);
    let filter = TransactionFilter::between(
        month.minus_months(OVERVIEW_MONTHS - 1).first_day(),
        month.last_day(),
    );
    let transactions =
        query_transactions(user_id, &filter, SortOrder::Ascending, None, connection)?;

    Ok(bucket_by_month(&transactions, &windows)
        .into_iter()
        .map(|totals| totals.rounded(OVERVIEW_DECIMALS))
        .collect())
}

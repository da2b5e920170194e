//! Route handlers for the reports over a date range.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    AppState, Error, MonthYear, UserID,
    dashboard::{round_to, savings_rate},
    month::subtract_months,
    report::range::{DateRangeQuery, TransactionsReportQuery, TrendsQuery},
    timezone::local_today,
    transaction::{
        Transaction, TransactionType,
        query::{
            SortOrder, TransactionFilter, count_transactions, query_transactions, sum_by_category,
            sum_by_month, sum_transactions,
        },
    },
};

/// The state needed for the reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Totals for the summary report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Total income in the range.
    pub total_income: f64,
    /// Total expenses in the range.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_savings: f64,
    /// Net savings as a percentage of income, to one decimal place.
    pub savings_rate: f64,
}

/// The expenses of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category name.
    pub name: String,
    /// The summed expenses.
    pub value: f64,
}

/// Income and expenses of one month in the monthly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReportEntry {
    /// The first day of the month.
    pub month: Date,
    /// Total income.
    pub income: f64,
    /// Total expenses.
    pub expenses: f64,
}

/// Income and expenses of one month in the trends report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendEntry {
    /// The abbreviated month name, e.g. "Jan".
    pub name: String,
    /// The month as "YYYY-MM".
    pub month_year: MonthYear,
    /// Total income.
    pub income: f64,
    /// Total expenses.
    pub expenses: f64,
}

/// The totals that accompany the transactions report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTotals {
    /// Total income in the range, regardless of the type filter.
    pub total_income: f64,
    /// Total expenses in the range, regardless of the type filter.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_amount: f64,
    /// The number of transactions that match the type filter.
    pub total_count: i64,
}

/// The transactions report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionsReport {
    /// The matching transactions, newest first.
    pub transactions: Vec<Transaction>,
    /// Totals over the range.
    pub totals: TransactionTotals,
}

/// Get the total income, expenses and savings over a date range.
pub async fn get_summary_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<DateRangeQuery>, Error>,
) -> Result<Json<ReportSummary>, Error> {
    let (start, end) = query.resolve(&state.local_timezone)?;
    let range = TransactionFilter::between(start, end);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let total_income = sum_transactions(
        user_id,
        &range.of_type(TransactionType::Income),
        &connection,
    )?;
    let total_expenses = sum_transactions(
        user_id,
        &range.of_type(TransactionType::Expense),
        &connection,
    )?;
    let net_savings = total_income - total_expenses;

    Ok(Json(ReportSummary {
        total_income,
        total_expenses,
        net_savings,
        savings_rate: round_to(savings_rate(total_income, net_savings), 1),
    }))
}

/// Get the expenses per category over a date range.
pub async fn get_category_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<DateRangeQuery>, Error>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let (start, end) = query.resolve(&state.local_timezone)?;
    let expenses = TransactionFilter::between(start, end).of_type(TransactionType::Expense);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let totals = sum_by_category(user_id, &expenses, &connection)?
        .into_iter()
        .map(|(name, value)| CategoryTotal { name, value })
        .collect();

    Ok(Json(totals))
}

/// Get the income and expenses of each month in a date range, oldest first.
///
/// Months without transactions are left out.
pub async fn get_monthly_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<DateRangeQuery>, Error>,
) -> Result<Json<Vec<MonthlyReportEntry>>, Error> {
    let (start, end) = query.resolve(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = sum_by_month(user_id, &TransactionFilter::between(start, end), &connection)?
        .into_iter()
        .map(|sums| MonthlyReportEntry {
            month: sums.month_year.first_day(),
            income: sums.income,
            expenses: sums.expenses,
        })
        .collect();

    Ok(Json(entries))
}

/// Get the income and expenses of each month since the start of the period, newest first.
pub async fn get_trends_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<TrendsQuery>, Error>,
) -> Result<Json<Vec<TrendEntry>>, Error> {
    let months = query.months()?;
    let today = local_today(&state.local_timezone)?;
    let since = TransactionFilter {
        from: Some(subtract_months(today, months)),
        ..TransactionFilter::default()
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = sum_by_month(user_id, &since, &connection)?
        .into_iter()
        .rev()
        .map(|sums| TrendEntry {
            name: sums.month_year.month_name(),
            month_year: sums.month_year,
            income: sums.income,
            expenses: sums.expenses,
        })
        .collect();

    Ok(Json(entries))
}

/// Get the transactions in a date range, newest first, along with their totals.
pub async fn get_transactions_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<TransactionsReportQuery>, Error>,
) -> Result<Json<TransactionsReport>, Error> {
    let transaction_type: Option<TransactionType> = match query.transaction_type.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(raw.parse()?),
    };
    let (start, end) = query.range.resolve(&state.local_timezone)?;
    let range = TransactionFilter::between(start, end);
    let filter = TransactionFilter {
        transaction_type,
        ..range
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions =
        query_transactions(user_id, &filter, SortOrder::Descending, None, &connection)?;
    let total_count = count_transactions(user_id, &filter, &connection)?;
    let total_income = sum_transactions(
        user_id,
        &range.of_type(TransactionType::Income),
        &connection,
    )?;
    let total_expenses = sum_transactions(
        user_id,
        &range.of_type(TransactionType::Expense),
        &connection,
    )?;

    Ok(Json(TransactionsReport {
        transactions,
        totals: TransactionTotals {
            total_income,
            total_expenses,
            net_amount: total_income - total_expenses,
            total_count,
        },
    }))
}

//! Database query helpers for listing and summing a user's transactions.

use rusqlite::{Connection, named_params};
use time::Date;

use crate::{Error, MonthYear, UserID};

use super::core::{TRANSACTION_COLUMNS, Transaction, TransactionType, map_transaction_row};

/// The order to sort transactions in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// Restricts which of a user's transactions a query sees.
///
/// The default filter matches every transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct TransactionFilter {
    /// The earliest date to include.
    pub from: Option<Date>,
    /// The latest date to include.
    pub until: Option<Date>,
    /// Only include transactions of this type.
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    /// Match transactions dated within `from` and `until`, inclusive.
    pub fn between(from: Date, until: Date) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
            transaction_type: None,
        }
    }

    /// Match transactions dated within `month`.
    pub fn in_month(month: MonthYear) -> Self {
        Self::between(month.first_day(), month.last_day())
    }

    /// Only match transactions of `transaction_type`.
    pub fn of_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }
}

const FILTER_CLAUSE: &str = "user_id = :user_id \
    AND (:from IS NULL OR date >= :from) \
    AND (:until IS NULL OR date <= :until) \
    AND (:type IS NULL OR type = :type)";

/// Get the user's transactions that match `filter`, sorted by date and then ID.
///
/// At most `limit` transactions are returned if it is set.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub(crate) fn query_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    sort_order: SortOrder,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let order_clause = match sort_order {
        SortOrder::Ascending => "ORDER BY date ASC, id ASC",
        SortOrder::Descending => "ORDER BY date DESC, id DESC",
    };
    // A negative limit means no limit in SQLite.
    let limit = limit.map_or(-1, i64::from);

    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {FILTER_CLAUSE} \
        {order_clause} LIMIT :limit"
    );

    connection
        .prepare(&query)?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":until": filter.until,
                ":type": filter.transaction_type,
                ":limit": limit,
            },
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Sum the amounts of the user's transactions that match `filter`.
///
/// Returns zero if no transactions match.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn sum_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<f64, Error> {
    let query =
        format!("SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" WHERE {FILTER_CLAUSE}");

    connection
        .prepare(&query)?
        .query_one(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":until": filter.until,
                ":type": filter.transaction_type,
            },
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Count the user's transactions that match `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<i64, Error> {
    let query = format!("SELECT COUNT(id) FROM \"transaction\" WHERE {FILTER_CLAUSE}");

    connection
        .prepare(&query)?
        .query_one(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":until": filter.until,
                ":type": filter.transaction_type,
            },
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Sum the amounts of the user's transactions that match `filter`, per category.
///
/// Categories are returned in alphabetical order.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn sum_by_category(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<(String, f64)>, Error> {
    let query = format!(
        "SELECT category, SUM(amount) FROM \"transaction\" WHERE {FILTER_CLAUSE} \
        GROUP BY category ORDER BY category ASC"
    );

    connection
        .prepare(&query)?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":until": filter.until,
                ":type": filter.transaction_type,
            },
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}

/// Income and expense totals of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MonthlySums {
    /// The month the totals are for.
    pub month_year: MonthYear,
    /// Total income.
    pub income: f64,
    /// Total expenses.
    pub expenses: f64,
}

/// Sum the user's income and expenses that match `filter`, per calendar month.
///
/// Only months that have at least one matching transaction are returned, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn sum_by_month(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<MonthlySums>, Error> {
    // Dates are stored as "YYYY-MM-DD", so the first seven characters are the month.
    let query = format!(
        "SELECT substr(date, 1, 7) AS month_year, \
            COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0), \
            COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0) \
        FROM \"transaction\" WHERE {FILTER_CLAUSE} \
        GROUP BY month_year ORDER BY month_year ASC"
    );

    connection
        .prepare(&query)?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":until": filter.until,
                ":type": filter.transaction_type,
            },
            |row| {
                Ok(MonthlySums {
                    month_year: row.get(0)?,
                    income: row.get(1)?,
                    expenses: row.get(2)?,
                })
            },
        )?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}

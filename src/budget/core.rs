//! Defines the budget model and its database queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, MonthYear, UserID, database_id::BudgetId};

/// How often a budget's amount is meant to apply.
///
/// This is a label only: every budget is compared against the expenses of
/// the single month it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// Once a week.
    Weekly,
    /// Once a month.
    Monthly,
    /// Once a year.
    Yearly,
}

impl BudgetPeriod {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            _ => Err(Error::InvalidBudgetPeriod),
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A spending limit for one expense category in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// The expense category the budget applies to.
    pub category: String,
    /// The most the user intends to spend.
    pub amount: f64,
    /// How often the amount applies.
    pub period: BudgetPeriod,
    /// The month the budget belongs to.
    pub month_year: MonthYear,
}

/// The user-editable fields of a [Budget].
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetFields {
    /// The expense category, not blank.
    pub category: String,
    /// The amount, greater than zero.
    pub amount: f64,
    /// How often the amount applies.
    pub period: BudgetPeriod,
}

const BUDGET_COLUMNS: &str = "id, user_id, category, amount, period, month_year";

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                period TEXT NOT NULL CHECK (period IN ('weekly', 'monthly', 'yearly')),
                month_year TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // At most one budget per category per month for each user.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_budget_user_category_month
            ON budget(user_id, category, month_year);",
        (),
    )?;

    Ok(())
}

/// Create a budget for `user_id` in `month_year`.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateBudget] if the user already has a budget for the category that month,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    month_year: MonthYear,
    fields: BudgetFields,
    connection: &Connection,
) -> Result<Budget, Error> {
    if find_budget_id(user_id, &fields.category, month_year, connection)?.is_some() {
        return Err(Error::DuplicateBudget);
    }

    connection
        .prepare(&format!(
            "INSERT INTO budget (user_id, category, amount, period, month_year)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                fields.category,
                fields.amount,
                fields.period,
                month_year,
            ),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Retrieve the user's budget with `budget_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::BudgetNotFound] if `budget_id` does not refer to one of the user's budgets,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &budget_id), (":user_id", &user_id.as_i64())],
            map_budget_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::BudgetNotFound,
            error => error,
        })
}

/// Get the user's budgets for `month_year`, ordered by category.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_budgets(
    user_id: UserID,
    month_year: MonthYear,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
             WHERE user_id = ?1 AND month_year = ?2
             ORDER BY category ASC"
        ))?
        .query_map((user_id.as_i64(), month_year), map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::SqlError))
        .collect()
}

/// Replace the category, amount and period of the user's budget with `budget_id`.
///
/// The budget keeps its month.
///
/// # Errors
/// This function will return a:
/// - [Error::BudgetNotFound] if `budget_id` does not refer to one of the user's budgets,
/// - [Error::DuplicateBudget] if another of the user's budgets that month has the new category,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget(
    user_id: UserID,
    budget_id: BudgetId,
    fields: BudgetFields,
    connection: &Connection,
) -> Result<Budget, Error> {
    let existing = get_budget(user_id, budget_id, connection)?;

    match find_budget_id(user_id, &fields.category, existing.month_year, connection)? {
        Some(other_id) if other_id != budget_id => return Err(Error::DuplicateBudget),
        _ => {}
    }

    connection
        .prepare(&format!(
            "UPDATE budget SET category = ?1, amount = ?2, period = ?3
             WHERE id = ?4 AND user_id = ?5
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                fields.category,
                fields.amount,
                fields.period,
                budget_id,
                user_id.as_i64(),
            ),
            map_budget_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::BudgetNotFound,
            error => error,
        })
}

/// Delete the user's budget with `budget_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::BudgetNotFound] if `budget_id` does not refer to one of the user's budgets,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::BudgetNotFound);
    }

    Ok(())
}

/// Sum the amounts of the user's budgets for `month_year`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn total_budgeted(
    user_id: UserID,
    month_year: MonthYear,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM budget WHERE user_id = ?1 AND month_year = ?2",
            (user_id.as_i64(), month_year),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

fn find_budget_id(
    user_id: UserID,
    category: &str,
    month_year: MonthYear,
    connection: &Connection,
) -> Result<Option<BudgetId>, Error> {
    connection
        .query_row(
            "SELECT id FROM budget WHERE user_id = ?1 AND category = ?2 AND month_year = ?3",
            (user_id.as_i64(), category, month_year),
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        amount: row.get(3)?,
        period: row.get(4)?,
        month_year: row.get(5)?,
    })
}

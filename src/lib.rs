//! Pocket Ledger is a web service for tracking personal income, expenses and
//! monthly budgets.
//!
//! This library provides a JSON API backed by SQLite. Users register, log in
//! with an encrypted session cookie, record transactions, set a budget per
//! expense category per month, and read aggregate reports such as the
//! dashboard, monthly totals and category breakdowns.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod amount;
mod app_state;
mod auth;
mod budget;
mod dashboard;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
mod month;
mod report;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, create_user, get_user_by_email, update_password};
pub use budget::{BudgetFields, BudgetPeriod, create_budget};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use month::MonthYear;
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{Transaction, TransactionType, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Every variant maps to an HTTP status and a `{"error": "..."}` body via
/// [IntoResponse]. Server-side variants are logged and replaced with a
/// generic message so that no internal detail reaches the client.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid session cookie.
    #[error("the request is not authenticated")]
    Unauthorized,

    /// The email and password did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// One or more required fields were missing or blank.
    #[error("all fields are required")]
    MissingFields,

    /// A transaction amount was missing, not a number, or not positive.
    #[error("the transaction amount must be a positive number")]
    InvalidAmount,

    /// A budget amount was missing, not a number, or not positive.
    #[error("the budget amount must be greater than zero")]
    InvalidBudgetAmount,

    /// The transaction type was missing when creating a transaction.
    #[error("the transaction type is required")]
    MissingTransactionType,

    /// A transaction type filter was not one of "all", "income" or "expense".
    #[error("invalid transaction type \"{0}\"")]
    InvalidTransactionType(String),

    /// The category was missing or blank.
    #[error("the category is required")]
    MissingCategory,

    /// The transaction date was missing or could not be parsed.
    #[error("the date is required")]
    MissingDate,

    /// The budget period was not one of "weekly", "monthly" or "yearly".
    #[error("invalid budget period")]
    InvalidBudgetPeriod,

    /// A month string was not in the format "YYYY-MM".
    #[error("invalid month \"{0}\", expected the format YYYY-MM")]
    InvalidMonthYear(String),

    /// A report date range parameter could not be parsed.
    #[error("invalid date range")]
    InvalidDateRange,

    /// A trends period could not be parsed, e.g. "3months".
    #[error("invalid period \"{0}\"")]
    InvalidPeriod(String),

    /// The request body, query string or path could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The email used to register already belongs to a user.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// The user already has a budget for this category in the same month.
    #[error("a budget for this category already exists for this month")]
    DuplicateBudget,

    /// The budget does not exist or belongs to another user.
    #[error("the budget could not be found")]
    BudgetNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The configured timezone is not a valid, canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The session token could not be serialized or its expiry computed.
    #[error("could not create the auth cookie: {0}")]
    CookieError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("budget.") =>
            {
                Error::DuplicateBudget
            }
            // Foreign keys only reference the user table.
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                tracing::warn!("write for a user that does not exist");
                Error::Unauthorized
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

/// The message shown to clients for any error that happened on the server.
pub const INTERNAL_SERVER_ERROR_MSG: &str = "Internal server error";

impl Error {
    /// The status code and client-facing message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials. Please try again.".to_owned(),
            ),
            Error::MissingFields => (
                StatusCode::BAD_REQUEST,
                "All fields are required".to_owned(),
            ),
            Error::InvalidAmount => (
                StatusCode::BAD_REQUEST,
                "Amount must be a positive number".to_owned(),
            ),
            Error::InvalidBudgetAmount => (
                StatusCode::BAD_REQUEST,
                "Amount must be greater than 0".to_owned(),
            ),
            Error::MissingTransactionType => {
                (StatusCode::BAD_REQUEST, "Type is required".to_owned())
            }
            Error::InvalidTransactionType(_) => (
                StatusCode::BAD_REQUEST,
                "Invalid transaction type".to_owned(),
            ),
            Error::MissingCategory => (StatusCode::BAD_REQUEST, "Category is required".to_owned()),
            Error::MissingDate => (StatusCode::BAD_REQUEST, "Date is required".to_owned()),
            Error::InvalidBudgetPeriod => {
                (StatusCode::BAD_REQUEST, "Please select a period".to_owned())
            }
            Error::InvalidMonthYear(_) => (StatusCode::BAD_REQUEST, "Invalid monthYear".to_owned()),
            Error::InvalidDateRange => (StatusCode::BAD_REQUEST, "Invalid date range".to_owned()),
            Error::InvalidPeriod(_) => (StatusCode::BAD_REQUEST, "Invalid period".to_owned()),
            Error::InvalidRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            Error::DuplicateEmail => (StatusCode::BAD_REQUEST, "User already exists".to_owned()),
            Error::DuplicateBudget => (
                StatusCode::BAD_REQUEST,
                "Budget for this category already exists".to_owned(),
            ),
            Error::BudgetNotFound => (StatusCode::NOT_FOUND, "Budget not found".to_owned()),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            // Any errors that are not handled above are not intended to be shown to the client.
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::CookieError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_SERVER_ERROR_MSG.to_owned(),
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

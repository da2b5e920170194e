//! Dashboard module
//!
//! Provides a summary of one month of income, expenses and budget usage,
//! and a six month income/expense overview.

mod aggregation;
mod handlers;

pub(crate) use aggregation::{round_to, savings_rate};
pub use handlers::{get_dashboard, get_dashboard_overview};

//! Monthly spending limits per expense category.

mod core;
mod endpoints;

pub use core::{BudgetFields, BudgetPeriod, create_budget, create_budget_table, total_budgeted};
pub use endpoints::{
    create_budget_endpoint, delete_budget_endpoint, get_budgets_endpoint, update_budget_endpoint,
};

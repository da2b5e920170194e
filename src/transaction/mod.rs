//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying and summing transactions
//! - Route handlers for listing and creating transactions

mod core;
mod create_endpoint;
mod list_endpoint;
pub(crate) mod query;
mod spent_amounts;

pub use core::{Transaction, TransactionType, create_transaction, create_transaction_table};
pub use create_endpoint::{TransactionState, create_transaction_endpoint};
pub use list_endpoint::get_transactions;
pub use spent_amounts::get_spent_amounts;

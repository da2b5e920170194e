//! Reports of income and expenses over a date range: a summary, a breakdown
//! by category, monthly totals, recent trends and a transaction listing.

mod handlers;
mod range;

pub use handlers::{
    get_category_report, get_monthly_report, get_summary_report, get_trends_report,
    get_transactions_report,
};

//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/budgets/{budget_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for logging out.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route for getting the logged-in user.
pub const SESSION: &str = "/api/auth/session";

/// The route for listing and creating transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for the per-category expense totals of a month.
pub const SPENT_AMOUNTS: &str = "/api/transactions/spent-amounts";

/// The route for listing and creating budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route for updating or deleting a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// The route for the dashboard figures.
pub const DASHBOARD: &str = "/api/dashboard";
/// The route for the six-month income and expense series.
pub const DASHBOARD_OVERVIEW: &str = "/api/dashboard/overview";

/// The route for income, expenses and savings over a date range.
pub const REPORT_SUMMARY: &str = "/api/reports/summary";
/// The route for expenses per category over a date range.
pub const REPORT_CATEGORIES: &str = "/api/reports/categories";
/// The route for income and expenses per month over a date range.
pub const REPORT_MONTHLY: &str = "/api/reports/monthly";
/// The route for recent monthly income and expense trends.
pub const REPORT_TRENDS: &str = "/api/reports/trends";
/// The route for the filtered transaction list with totals.
pub const REPORT_TRANSACTIONS: &str = "/api/reports/transactions";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// Parameters are written in braces, e.g. `/api/budgets/{budget_id}`.
/// Paths without a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

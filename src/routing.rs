//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, get_session, post_log_in, post_log_out, register_user},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_endpoint,
        update_budget_endpoint,
    },
    dashboard::{get_dashboard, get_dashboard_overview},
    endpoints,
    report::{
        get_category_report, get_monthly_report, get_summary_report, get_trends_report,
        get_transactions_report,
    },
    transaction::{create_transaction_endpoint, get_spent_amounts, get_transactions},
};

/// Return a router with all the app's routes.
///
/// Every route except registering, logging in and logging out requires a
/// valid auth cookie. Unknown routes get a JSON 404 response.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(endpoints::SESSION, get(get_session))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions).post(create_transaction_endpoint),
        )
        .route(endpoints::SPENT_AMOUNTS, get(get_spent_amounts))
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            put(update_budget_endpoint).delete(delete_budget_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::DASHBOARD_OVERVIEW, get(get_dashboard_overview))
        .route(endpoints::REPORT_SUMMARY, get(get_summary_report))
        .route(endpoints::REPORT_CATEGORIES, get(get_category_report))
        .route(endpoints::REPORT_MONTHLY, get(get_monthly_report))
        .route(endpoints::REPORT_TRENDS, get(get_trends_report))
        .route(endpoints::REPORT_TRANSACTIONS, get(get_transactions_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

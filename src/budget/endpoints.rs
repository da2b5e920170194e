//! Route handlers for listing, creating, updating and deleting budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error, MonthYear, UserID,
    amount::AmountInput,
    budget::core::{
        Budget, BudgetFields, create_budget, delete_budget, get_budgets, update_budget,
    },
    database_id::BudgetId,
    month::current_month,
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating or updating a budget.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetData {
    /// The expense category.
    pub category: Option<String>,
    /// A positive amount, as a number or numeric string.
    pub amount: Option<AmountInput>,
    /// "weekly", "monthly" or "yearly".
    pub period: Option<String>,
}

impl TryFrom<BudgetData> for BudgetFields {
    type Error = Error;

    fn try_from(data: BudgetData) -> Result<Self, Self::Error> {
        let category = data
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .ok_or(Error::MissingCategory)?
            .to_owned();

        let amount = data
            .amount
            .as_ref()
            .and_then(AmountInput::positive)
            .ok_or(Error::InvalidBudgetAmount)?;

        let period = data
            .period
            .as_deref()
            .ok_or(Error::InvalidBudgetPeriod)?
            .parse()?;

        Ok(BudgetFields {
            category,
            amount,
            period,
        })
    }
}

/// The query string for [get_budgets_endpoint].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetsQuery {
    /// The month as "YYYY-MM", defaults to the current month.
    pub month_year: Option<String>,
}

/// Get the logged-in user's budgets for a month, ordered by category.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Query(query), _): WithRejection<Query<BudgetsQuery>, Error>,
) -> Result<Json<Vec<Budget>>, Error> {
    let month_year: MonthYear = match query.month_year {
        Some(raw_month_year) => raw_month_year.parse()?,
        None => current_month(&state.local_timezone)?,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budgets(user_id, month_year, &connection).map(Json)
}

/// Create a budget for the current month.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Json(data), _): WithRejection<Json<BudgetData>, Error>,
) -> Result<Json<Budget>, Error> {
    let fields = BudgetFields::try_from(data)?;
    let month_year = current_month(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_budget(user_id, month_year, fields, &connection).map(Json)
}

/// Update the category, amount and period of a budget.
pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Path(budget_id), _): WithRejection<Path<BudgetId>, Error>,
    WithRejection(Json(data), _): WithRejection<Json<BudgetData>, Error>,
) -> Result<Json<Budget>, Error> {
    let fields = BudgetFields::try_from(data)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_budget(user_id, budget_id, fields, &connection).map(Json)
}

/// Delete a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Path(budget_id), _): WithRejection<Path<BudgetId>, Error>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget(user_id, budget_id, &connection)?;

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod budget_endpoint_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        month::current_month,
        test_utils::{assert_error, get_test_server, log_in_test_user},
    };

    async fn create_food_budget(server: &TestServer, cookie: &Cookie<'static>) -> Value {
        let response = server
            .post(endpoints::BUDGETS)
            .add_cookie(cookie.clone())
            .json(&json!({ "category": "Food", "amount": 300, "period": "monthly" }))
            .await;

        response.assert_status_ok();
        response.json()
    }

    #[tokio::test]
    async fn creates_budget_for_current_month() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;

        let budget = create_food_budget(&server, &cookie).await;

        assert!(budget["id"].as_i64().unwrap() > 0);
        assert_eq!(budget["category"], "Food");
        assert_eq!(budget["amount"], 300.0);
        assert_eq!(budget["period"], "monthly");
        assert_eq!(
            budget["monthYear"],
            current_month("Etc/UTC").unwrap().to_string()
        );
    }

    #[tokio::test]
    async fn second_budget_for_same_category_is_rejected() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;
        create_food_budget(&server, &cookie).await;

        let response = server
            .post(endpoints::BUDGETS)
            .add_cookie(cookie)
            .json(&json!({ "category": "Food", "amount": "150", "period": "weekly" }))
            .await;

        assert_error(
            &response,
            StatusCode::BAD_REQUEST,
            "Budget for this category already exists",
        );
    }

    #[tokio::test]
    async fn rejects_invalid_fields() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;

        let cases = [
            (
                json!({ "category": "", "amount": 1, "period": "monthly" }),
                "Category is required",
            ),
            (
                json!({ "category": "Food", "amount": 0, "period": "monthly" }),
                "Amount must be greater than 0",
            ),
            (
                json!({ "category": "Food", "amount": "lots", "period": "monthly" }),
                "Amount must be greater than 0",
            ),
            (
                json!({ "category": "Food", "amount": 1, "period": "daily" }),
                "Please select a period",
            ),
            (
                json!({ "category": "Food", "amount": 1 }),
                "Please select a period",
            ),
        ];

        for (body, message) in cases {
            let response = server
                .post(endpoints::BUDGETS)
                .add_cookie(cookie.clone())
                .json(&body)
                .await;

            assert_error(&response, StatusCode::BAD_REQUEST, message);
        }
    }

    #[tokio::test]
    async fn lists_budgets_by_category() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;
        for category in ["Transport", "Food", "Rent"] {
            server
                .post(endpoints::BUDGETS)
                .add_cookie(cookie.clone())
                .json(&json!({ "category": category, "amount": 10, "period": "monthly" }))
                .await
                .assert_status_ok();
        }

        let response = server.get(endpoints::BUDGETS).add_cookie(cookie.clone()).await;

        response.assert_status_ok();
        let budgets: Vec<Value> = response.json();
        let categories: Vec<_> = budgets
            .iter()
            .map(|budget| budget["category"].as_str().unwrap())
            .collect();
        assert_eq!(categories, ["Food", "Rent", "Transport"]);

        let response = server
            .get(endpoints::BUDGETS)
            .add_query_param("monthYear", "1999-01")
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!([]));

        let response = server
            .get(endpoints::BUDGETS)
            .add_query_param("monthYear", "not-a-month")
            .add_cookie(cookie)
            .await;
        assert_error(&response, StatusCode::BAD_REQUEST, "Invalid monthYear");
    }

    #[tokio::test]
    async fn updates_budget() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;
        let budget = create_food_budget(&server, &cookie).await;
        let budget_id = budget["id"].as_i64().unwrap();

        let response = server
            .put(&format_endpoint(endpoints::BUDGET, budget_id))
            .add_cookie(cookie)
            .json(&json!({ "category": "Groceries", "amount": 250.5, "period": "weekly" }))
            .await;

        response.assert_status_ok();
        let updated: Value = response.json();
        assert_eq!(updated["id"], budget_id);
        assert_eq!(updated["category"], "Groceries");
        assert_eq!(updated["amount"], 250.5);
        assert_eq!(updated["period"], "weekly");
        assert_eq!(updated["monthYear"], budget["monthYear"]);
    }

    #[tokio::test]
    async fn update_onto_existing_category_is_rejected() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;
        create_food_budget(&server, &cookie).await;
        let response = server
            .post(endpoints::BUDGETS)
            .add_cookie(cookie.clone())
            .json(&json!({ "category": "Rent", "amount": 900, "period": "monthly" }))
            .await;
        let rent_id = response.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .put(&format_endpoint(endpoints::BUDGET, rent_id))
            .add_cookie(cookie)
            .json(&json!({ "category": "Food", "amount": 900, "period": "monthly" }))
            .await;

        assert_error(
            &response,
            StatusCode::BAD_REQUEST,
            "Budget for this category already exists",
        );
    }

    #[tokio::test]
    async fn deletes_budget() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;
        let budget = create_food_budget(&server, &cookie).await;
        let path = format_endpoint(endpoints::BUDGET, budget["id"].as_i64().unwrap());

        let response = server.delete(&path).add_cookie(cookie.clone()).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "success": true }));

        let response = server.delete(&path).add_cookie(cookie).await;
        assert_error(&response, StatusCode::NOT_FOUND, "Budget not found");
    }

    #[tokio::test]
    async fn cannot_touch_other_users_budgets() {
        let server = get_test_server();
        let alice_cookie = log_in_test_user(&server, "alice@example.com").await;
        let bob_cookie = log_in_test_user(&server, "bob@example.com").await;
        let budget = create_food_budget(&server, &alice_cookie).await;
        let path = format_endpoint(endpoints::BUDGET, budget["id"].as_i64().unwrap());

        let response = server
            .put(&path)
            .add_cookie(bob_cookie.clone())
            .json(&json!({ "category": "Food", "amount": 1, "period": "monthly" }))
            .await;
        assert_error(&response, StatusCode::NOT_FOUND, "Budget not found");

        let response = server.delete(&path).add_cookie(bob_cookie.clone()).await;
        assert_error(&response, StatusCode::NOT_FOUND, "Budget not found");

        let response = server.get(endpoints::BUDGETS).add_cookie(bob_cookie).await;
        response.assert_json(&json!([]));

        let response = server.get(endpoints::BUDGETS).add_cookie(alice_cookie).await;
        let budgets: Vec<Value> = response.json();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0]["amount"], 300.0);
    }

    #[tokio::test]
    async fn non_numeric_id_is_bad_request() {
        let server = get_test_server();
        let cookie = log_in_test_user(&server, "alice@example.com").await;

        let response = server.delete("/api/budgets/abc").add_cookie(cookie).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

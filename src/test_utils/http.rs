use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, auth::COOKIE_TOKEN, build_router, endpoints};

pub(crate) const TEST_PASSWORD: &str = "hunter2";
/// The cheapest cost bcrypt accepts, to keep the tests fast.
const TEST_PASSWORD_HASH_COST: u32 = 4;

pub(crate) fn get_test_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory SQLite database"),
        "42",
        "Etc/UTC",
    )
    .expect("Could not create app state")
    .with_password_hash_cost(TEST_PASSWORD_HASH_COST)
}

pub(crate) fn get_test_server() -> TestServer {
    get_test_server_with_state(get_test_state()).0
}

pub(crate) fn get_test_server_with_state(state: AppState) -> (TestServer, AppState) {
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server");

    (server, state)
}

/// Register a user named after `email` with [TEST_PASSWORD] and return the user JSON.
pub(crate) async fn register_test_user(server: &TestServer, email: &str) -> Value {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({ "name": email, "email": email, "password": TEST_PASSWORD }))
        .await;

    response.assert_status_ok();
    response.json()
}

/// Register and log in a user, returning their auth cookie.
pub(crate) async fn log_in_test_user(server: &TestServer, email: &str) -> Cookie<'static> {
    register_test_user(server, email).await;

    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;

    response.assert_status_ok();
    response.cookie(COOKIE_TOKEN)
}

#[track_caller]
pub(crate) fn assert_error(response: &TestResponse, status: StatusCode, message: &str) {
    response.assert_status(status);
    response.assert_json(&json!({ "error": message }));
}

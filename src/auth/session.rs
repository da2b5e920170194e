//! Returns the user behind the current session.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{User, UserID, get_user_by_id},
};

/// The state needed to look up the session's user.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the logged-in user.
///
/// A valid cookie for a user that no longer exists is treated as unauthorized.
pub async fn get_session(
    State(state): State<SessionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Ok(Json(user)),
        Err(Error::NotFound) => Err(Error::Unauthorized),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod session_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{get_test_server_with_state, get_test_state, log_in_test_user},
    };

    #[tokio::test]
    async fn session_returns_logged_in_user() {
        let (server, _) = get_test_server_with_state(get_test_state());
        let cookie = log_in_test_user(&server, "alice@example.com").await;

        let response = server.get(endpoints::SESSION).add_cookie(cookie).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn session_without_cookie_is_unauthorized() {
        let (server, _) = get_test_server_with_state(get_test_state());

        let response = server.get(endpoints::SESSION).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn session_for_deleted_user_is_unauthorized() {
        let (server, state) = get_test_server_with_state(get_test_state());
        let cookie = log_in_test_user(&server, "alice@example.com").await;
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DELETE FROM user", ())
            .unwrap();

        let response = server.get(endpoints::SESSION).add_cookie(cookie).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

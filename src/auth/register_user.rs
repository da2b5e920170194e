//! Handles requests to register a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash,
    auth::{User, create_user, get_user_by_email},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used to hash the new password.
    pub password_hash_cost: u32,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The details sent by the client to register.
#[derive(Clone, Deserialize)]
pub struct RegisterData {
    /// The user's display name.
    #[serde(default)]
    pub name: String,
    /// The email the user will log in with.
    #[serde(default)]
    pub email: String,
    /// The new password.
    #[serde(default)]
    pub password: String,
}

/// Create a new user and return it without the password.
///
/// Registering does not log the user in.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingFields] if any of the name, email or password are blank,
/// - [Error::DuplicateEmail] if the email is already registered,
/// - a server error if the password could not be hashed or the user could not be stored.
pub async fn register_user(
    State(state): State<RegistrationState>,
    WithRejection(Json(user_data), _): WithRejection<Json<RegisterData>, Error>,
) -> Result<Json<User>, Error> {
    let name = user_data.name.trim();
    let email = user_data.email.trim();

    if name.is_empty() || email.is_empty() || user_data.password.is_empty() {
        return Err(Error::MissingFields);
    }

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(email, &connection) {
            Ok(_) => return Err(Error::DuplicateEmail),
            Err(Error::NotFound) => {}
            Err(error) => return Err(error),
        }
    }

    let password_hash = PasswordHash::new(&user_data.password, state.password_hash_cost)
        .inspect_err(|error| tracing::error!("Could not hash password: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(name, email, password_hash, &connection).map(Json)
}

#[cfg(test)]
mod register_user_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn register_returns_user_without_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD
            }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert!(body["id"].as_i64().unwrap() > 0);
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(body["createdAt"].is_string());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let server = get_test_server();
        register_test_user(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Another Alice",
                "email": "alice@example.com",
                "password": "something else"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "User already exists" }));
    }

    #[tokio::test]
    async fn register_fails_with_missing_fields() {
        let server = get_test_server();

        for body in [
            json!({ "email": "alice@example.com", "password": TEST_PASSWORD }),
            json!({ "name": "Alice", "email": " ", "password": TEST_PASSWORD }),
            json!({ "name": "Alice", "email": "alice@example.com", "password": "" }),
        ] {
            let response = server.post(endpoints::REGISTER).json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({ "error": "All fields are required" }));
        }
    }
}

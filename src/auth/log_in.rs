//! Handles log-in requests.
//! The cookie module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, WithRejection, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{User, get_user_by_email, set_auth_cookie},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub(crate) const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// Whether auth cookies are marked `Secure`.
    pub secure_cookies: bool,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            secure_cookies: state.secure_cookies,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
///
/// The password is kept as a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInData {
    /// The email the user registered with.
    #[serde(default)]
    pub email: String,
    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,
    /// Whether to extend the initial auth cookie duration to one week.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the user is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is blank.
/// - The email is not registered or the password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    WithRejection(Json(credentials), _): WithRejection<Json<LogInData>, Error>,
) -> Result<(PrivateCookieJar, Json<User>), Error> {
    let email = credentials.email.trim();

    if email.is_empty() || credentials.password.is_empty() {
        return Err(Error::MissingFields);
    }

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_email(email, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::warn!("Log-in attempt for unregistered email");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        tracing::warn!("Incorrect password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if credentials.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration, state.secure_cookies)
        .inspect_err(|error| tracing::error!("Error setting auth cookie: {error}"))?;

    Ok((jar, Json(user)))
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::{DEFAULT_COOKIE_DURATION, cookie::COOKIE_TOKEN},
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server, register_test_user},
    };

    use super::REMEMBER_ME_COOKIE_DURATION;

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(5),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();
        register_test_user(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "alice@example.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["email"], "alice@example.com");
        assert!(body.get("password").is_none());

        let token_cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(token_cookie.http_only(), Some(true));
        assert_date_time_close(
            token_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie() {
        let server = get_test_server();
        register_test_user(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
                "rememberMe": true
            }))
            .await;

        response.assert_status_ok();
        assert_date_time_close(
            response.cookie(COOKIE_TOKEN).expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION,
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let server = get_test_server();
        register_test_user(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "alice@example.com", "password": "wrongpassword" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "Invalid credentials. Please try again." }));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "Invalid credentials. Please try again." }));
    }

    #[tokio::test]
    async fn log_in_fails_with_blank_fields() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "  ", "password": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "All fields are required" }));
    }

    #[tokio::test]
    async fn log_in_fails_with_malformed_json() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .bytes("{not json".into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["error"].is_string());
    }
}

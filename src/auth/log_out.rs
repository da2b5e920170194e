//! Handles log-out requests.

use axum::{Json, extract::State};
use axum_extra::extract::PrivateCookieJar;
use serde_json::{Value, json};

use crate::auth::{invalidate_auth_cookie, middleware::AuthState};

/// Invalidate the auth cookie, logging the user out.
///
/// Always succeeds, even if the client was not logged in.
pub async fn post_log_out(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Json<Value>) {
    (
        invalidate_auth_cookie(jar, state.secure_cookies),
        Json(json!({ "success": true })),
    )
}

// Session handlers: username/password login and logout.
//
// Login answers with the caller's bearer token and also sets it as an
// http-only cookie, so both SPA fetches and plain browser navigation
// authenticate the same way.

use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    app::AppState,
    services::AccountService,
    utils::{service_error::ServiceError, trim_and_validate_field},
};

const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Verify credentials and start a session.
/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let username =
        trim_and_validate_field(&request.username, "username").map_err(ServiceError::ValidationError)?;

    let account_service = AccountService::new(&state);
    let (user, token) = account_service.login(&username, &request.password).await?;

    let mut cookie = Cookie::new(AUTH_COOKIE, token.key.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.is_production());

    info!("Login for {}", user.username);
    Ok((
        jar.add(cookie),
        Json(json!({
            "token": token.key,
            "user": user.to_response(),
        })),
    ))
}

/// End the session by clearing the auth cookie.
/// POST /api/logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");

    (jar.remove(cookie), Json(json!({ "detail": "logged out" })))
}

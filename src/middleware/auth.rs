// Authentication middleware.
//
// Resolves the caller's opaque bearer token (Authorization header, or the
// http-only cookie set by the login endpoint) to an Actor and stores it in
// request extensions. Authentication is optional at this layer: public
// endpoints (link reads, event creation) proceed without an actor, and each
// handler demands one via RequireActor where the access policy needs it.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::{
    app::AppState,
    models::auth_token::AuthToken,
    models::user::User,
    services::access_policy::Actor,
};

const AUTH_COOKIE: &str = "auth_token";

/// Middleware that resolves a bearer token to an Actor when one is present.
/// Invalid tokens are rejected outright; absent tokens pass through.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header_token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = header_token.or_else(|| jar.get(AUTH_COOKIE).map(|c| c.value().to_string()));

    if let Some(token) = token {
        match resolve_actor(&state, &token).await {
            Ok(Some(actor)) => {
                request.extensions_mut().insert(actor);
            }
            Ok(None) => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "Invalid token",
                        "status": 401
                    })),
                )
                    .into_response();
            }
            Err(response) => return response,
        }
    }

    next.run(request).await
}

async fn resolve_actor(state: &AppState, token: &str) -> Result<Option<Actor>, Response> {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Connection pool error during auth: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "details": "server failure" })),
            )
                .into_response());
        }
    };

    let auth_token = match AuthToken::find_by_key(&mut conn, token).await {
        Ok(t) => t,
        Err(diesel::result::Error::NotFound) => return Ok(None),
        Err(e) => {
            tracing::error!("Token lookup failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "details": "server failure" })),
            )
                .into_response());
        }
    };

    match User::find_by_id(&mut conn, auth_token.user_id).await {
        Ok(user) if user.is_active => Ok(Some(Actor {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        })),
        Ok(_) => Ok(None),
        Err(e) => {
            tracing::warn!("Token references missing user: {}", e);
            Ok(None)
        }
    }
}

/// Extractor for an optional caller
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

impl FromRequestParts<AppState> for MaybeActor {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(parts.extensions.get::<Actor>().cloned()))
    }
}

/// Extractor that rejects unauthenticated requests with 401
#[derive(Debug, Clone)]
pub struct RequireActor(pub Actor);

impl FromRequestParts<AppState> for RequireActor {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(RequireActor)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "Authentication required",
                        "status": 401
                    })),
                )
            })
    }
}

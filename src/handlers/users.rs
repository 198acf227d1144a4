// User account handlers: registration, profile lookup and update, and the
// Instagram OAuth callback.
//
// Registration is public and atomic (user + preference + token). The
// optional Instagram token and profile image from signup are stored
// best-effort after the account exists; a provider hiccup never fails the
// registration itself.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::RequireActor,
    models::user::{CreateAccountRequest, UpdateUserRequest, User},
    services::access_policy::{allow, Action, Resource},
    services::{AccountService, InstagramService},
    utils::{service_error::ServiceError, trim_optional_field},
};

/// Register a new account. Public.
/// POST /api/users/create_account
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account_service = AccountService::new(&state);
    let (user, token) = account_service.create_account(&request).await?;

    // Signup extras are best-effort once the account exists
    let instagram = InstagramService::new(&state);
    if let Some(ig_token) = &request.token {
        if let Err(e) = instagram.store_token(user.id, ig_token).await {
            warn!("Could not store Instagram token for {}: {}", user.username, e);
        }
    }
    if let Some(image_url) = &request.profile_img {
        if let Err(e) = instagram.import_profile_image(user.id, image_url).await {
            warn!(
                "Could not import profile image for {}: {}",
                user.username, e
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user.to_response(),
            "token": token.key,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UserLookupParams {
    pub username: Option<String>,
}

/// Fetch a profile. Defaults to the caller's own; `?username=` needs admin
/// rights unless it names the caller.
/// GET /api/users
pub async fn get_user(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<UserLookupParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let username = params.username.as_deref().unwrap_or(&actor.username);
    let user = User::find_by_username(&mut conn, username)
        .await
        .map_err(|_| ServiceError::ValidationError("Unknown user".to_string()))?;

    if !allow(Some(&actor), Action::Read, &Resource::User { id: user.id }) {
        return Err(ServiceError::Forbidden);
    }

    Ok(Json(user.to_response()))
}

/// Update profile fields. Self or admin only. Saving also touches the
/// user's preference row.
/// PATCH /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    if !allow(Some(&actor), Action::Update, &Resource::User { id }) {
        return Err(ServiceError::Forbidden);
    }

    // Whitespace-only fields mean "leave unchanged"
    let request = UpdateUserRequest {
        first_name: trim_optional_field(request.first_name.as_deref()),
        last_name: trim_optional_field(request.last_name.as_deref()),
        email: trim_optional_field(request.email.as_deref()),
    };

    let account_service = AccountService::new(&state);
    let user = if request.is_empty() {
        // Nothing to change; answer with the current row
        let mut conn = state
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
        User::find_by_id(&mut conn, id).await?
    } else {
        account_service.update_profile(id, &request).await?
    };

    Ok(Json(user.to_response()))
}

#[derive(Debug, Deserialize)]
pub struct IgCallbackParams {
    pub code: String,
}

/// Instagram OAuth callback: exchange the authorization code for an access
/// token and store it for the caller. A failed exchange answers 400 with
/// whatever the provider said.
/// GET /api/users/igauth
pub async fn igauth(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<IgCallbackParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let instagram = InstagramService::new(&state);
    let exchange = instagram.exchange_code(&params.code).await?;

    if !exchange.is_success() {
        return Ok((StatusCode::BAD_REQUEST, Json(exchange.body)));
    }

    if let Some(access_token) = exchange.access_token() {
        instagram.store_token(actor.id, &access_token).await?;
    }

    Ok((StatusCode::OK, Json(exchange.body)))
}

/// Diagnostic passthrough of the code exchange: the provider's status and
/// body come back unchanged, nothing is stored.
/// GET /api/users/ig_response
pub async fn ig_response(
    State(state): State<AppState>,
    RequireActor(_actor): RequireActor,
    Query(params): Query<IgCallbackParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let instagram = InstagramService::new(&state);
    let exchange = instagram.exchange_code(&params.code).await?;
    let status = StatusCode::from_u16(exchange.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(exchange.body)))
}

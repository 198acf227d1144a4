// Preference handlers: per-user page imagery.
//
// A preference row is created with the account and never by hand; the API
// only reads and updates it. Self-service plus admin override.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::RequireActor,
    models::preference::{Preference, UpdatePreferenceRequest},
    models::user::User,
    schema::preferences,
    services::access_policy::{allow, Action, Resource},
    utils::service_error::ServiceError,
};

#[derive(Debug, Deserialize)]
pub struct PreferenceLookupParams {
    pub username: Option<String>,
}

/// Fetch a preference row. Defaults to the caller's own; `?username=` needs
/// admin rights unless it names the caller. Unknown usernames are a 400.
/// GET /api/preferences
pub async fn get_preference(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<PreferenceLookupParams>,
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

    if !allow(
        Some(&actor),
        Action::Read,
        &Resource::Preference { user_id: user.id },
    ) {
        return Err(ServiceError::Forbidden);
    }

    let preference = Preference::find_by_user(&mut conn, user.id).await?;
    Ok(Json(preference.to_response(&state.config.media)))
}

/// Update image fields. Owner or admin only.
/// PATCH /api/preferences/{id}
pub async fn update_preference(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePreferenceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let preference = Preference::find_by_id(&mut conn, id).await?;
    if !allow(
        Some(&actor),
        Action::Update,
        &Resource::Preference {
            user_id: preference.user_id,
        },
    ) {
        return Err(ServiceError::Forbidden);
    }

    let updated = diesel::update(preferences::table.find(id))
        .set((
            request
                .background_img
                .as_deref()
                .map(|v| preferences::background_img.eq(v)),
            request
                .profile_img
                .as_deref()
                .map(|v| preferences::profile_img.eq(v)),
            preferences::updated_at.eq(Utc::now()),
        ))
        .get_result::<Preference>(&mut conn)
        .await?;

    Ok(Json(updated.to_response(&state.config.media)))
}

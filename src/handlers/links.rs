// Link CRUD handlers.
//
// Reads are public; writes require the authenticated creator (or an admin).
// Deleting a link first scrubs its events per the configured behavior, then
// removes the row, all in one transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::RequireActor,
    models::link::{CreateLinkRequest, Link, LinkListParams, NewLink, UpdateLinkRequest},
    models::user::User,
    schema::links,
    services::access_policy::{allow, Action, Resource},
    services::EventService,
    utils::service_error::ServiceError,
};

/// List links, publicly. `?username=` narrows to one user's links (the
/// data behind a public page); an unknown username is a 400.
/// GET /api/links
pub async fn list_links(
    State(state): State<AppState>,
    Query(params): Query<LinkListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let mut query = links::table
        .order((links::display_order.asc(), links::created_at.asc()))
        .into_boxed();

    if let Some(username) = &params.username {
        let creator = User::find_by_username(&mut conn, username)
            .await
            .map_err(|_| ServiceError::ValidationError("Unknown user".to_string()))?;
        query = query.filter(links::creator_id.eq(creator.id));
    }

    let rows = query.load::<Link>(&mut conn).await?;

    let media = &state.config.media;
    let response: Vec<_> = rows.iter().map(|l| l.to_response(media)).collect();
    Ok(Json(response))
}

/// Create a link owned by the caller
/// POST /api/links
pub async fn create_link(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Json(request): Json<CreateLinkRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let new_link = NewLink {
        id: Uuid::new_v4(),
        creator_id: actor.id,
        url: request.url,
        text: request.text,
        image: request.image,
        display_order: request.display_order,
        created_at: Utc::now(),
    };

    let link = diesel::insert_into(links::table)
        .values(&new_link)
        .get_result::<Link>(&mut conn)
        .await?;

    info!("Created link {} for {}", link.id, actor.username);
    Ok((
        StatusCode::CREATED,
        Json(link.to_response(&state.config.media)),
    ))
}

/// Fetch a single link. Public.
/// GET /api/links/{id}
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let link = Link::find_by_id(&mut conn, id).await?;
    Ok(Json(link.to_response(&state.config.media)))
}

/// Update a link's fields. Creator or admin only.
/// PUT/PATCH /api/links/{id}
pub async fn update_link(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLinkRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let link = Link::find_by_id(&mut conn, id).await?;
    if !allow(
        Some(&actor),
        Action::Update,
        &Resource::Link {
            creator_id: link.creator_id,
        },
    ) {
        return Err(ServiceError::Forbidden);
    }

    let changes = request.into_changeset();
    if changes.url.is_none()
        && changes.text.is_none()
        && changes.image.is_none()
        && changes.display_order.is_none()
    {
        // Nothing to change; answer with the current row
        return Ok(Json(link.to_response(&state.config.media)));
    }

    let updated = diesel::update(links::table.find(id))
        .set(&changes)
        .get_result::<Link>(&mut conn)
        .await?;

    Ok(Json(updated.to_response(&state.config.media)))
}

/// Delete a link and scrub its events. Creator or admin only.
/// DELETE /api/links/{id}
pub async fn delete_link(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let link = Link::find_by_id(&mut conn, id).await?;
    if !allow(
        Some(&actor),
        Action::Delete,
        &Resource::Link {
            creator_id: link.creator_id,
        },
    ) {
        return Err(ServiceError::Forbidden);
    }

    let event_service = EventService::new(&state);
    conn.transaction::<_, ServiceError, _>(|conn| {
        async move {
            event_service.scrub_events_for_link(conn, id).await?;
            diesel::delete(links::table.find(id)).execute(conn).await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    info!("Deleted link {} for {}", id, actor.username);
    Ok(StatusCode::NO_CONTENT)
}

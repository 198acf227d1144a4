// Event handlers: recording, listing, and aggregated stats.
//
// Creation is public (visitors record their own clicks). Listing and stats
// require authentication; the filter pipeline scopes non-admin results to
// the caller's own links. Recorded events are immutable, so the item routes
// answer 405 for every mutation verb.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::{MaybeActor, RequireActor},
    models::event::{CreateEventRequest, Event, EventLinkInfo, EventQueryParams, EventResponse},
    models::link::Link,
    services::access_policy::{allow, allow_event_list, Action, Resource},
    services::aggregation::{
        bucket_events, densify_daily, generate_csv, DailySeriesSpec, Granularity, StatsResponse,
    },
    services::time_window::{parse_date, resolve_window, WindowParams},
    services::EventService,
    utils::service_error::ServiceError,
};

/// List events matching the identity and time filters, ascending by
/// occurrence time. `?method=count` returns just the tally.
/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Query(params): Query<EventQueryParams>,
) -> Result<impl IntoResponse, ServiceError> {
    if !allow_event_list(actor.as_ref()) {
        return Err(ServiceError::Unauthorized);
    }
    let actor = actor.ok_or(ServiceError::Unauthorized)?;

    let service = EventService::new(&state);
    let keyword = EventService::list_keyword(&params);
    let records = service
        .filter_events(&actor, &params, keyword, Utc::now())
        .await?;

    if params.wants_count() {
        return Ok(Json(json!({ "count": records.len() })).into_response());
    }

    let response: Vec<EventResponse> = records.iter().map(|r| r.to_response()).collect();
    Ok(Json(response).into_response())
}

/// Aggregated stats. The `time` parameter selects the bucketing granularity
/// (daily/weekly/monthly/yearly); the window keyword rides in `limit`, or in
/// `time` itself when it is not a granularity name. A non-granularity `time`
/// degrades to the plain filtered list (honoring `method=count`). Daily
/// series are densified so charts never see a missing day; CSV export of
/// the filtered rows rides alongside.
/// GET /api/events/stats
pub async fn event_stats(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Query(params): Query<EventQueryParams>,
) -> Result<impl IntoResponse, ServiceError> {
    if !allow_event_list(actor.as_ref()) {
        return Err(ServiceError::Unauthorized);
    }
    let actor = actor.ok_or(ServiceError::Unauthorized)?;

    let now = Utc::now();
    let service = EventService::new(&state);

    let granularity = match Granularity::from_param(params.time.as_deref()) {
        Some(granularity) => granularity,
        None => {
            // Not an aggregation request; answer like the list endpoint
            let keyword = if params.time.is_some() {
                params.limit.as_deref().or(params.time.as_deref())
            } else {
                None
            };
            let records = service.filter_events(&actor, &params, keyword, now).await?;
            if params.wants_count() {
                return Ok(Json(json!({ "count": records.len() })).into_response());
            }
            let response: Vec<EventResponse> = records.iter().map(|r| r.to_response()).collect();
            return Ok(Json(response).into_response());
        }
    };

    let keyword = params.limit.as_deref();
    let records = service.filter_events(&actor, &params, keyword, now).await?;

    let mut data = bucket_events(&records, granularity);
    if granularity == Granularity::Daily {
        let window = resolve_window(
            &WindowParams {
                keyword,
                month: params.month.as_deref(),
                year: params.year.as_deref(),
                start: params.start.as_deref(),
                end: params.end.as_deref(),
            },
            now,
        );
        let spec = DailySeriesSpec::from_window(
            &window,
            parse_date(params.start.as_deref()),
            parse_date(params.end.as_deref()),
        );
        data = densify_daily(data, &spec, now);
    }

    let (raw_csv, raw) = generate_csv(&records);
    Ok(Json(StatsResponse { data, raw_csv, raw }).into_response())
}

/// Record a click or visit against a link. Public.
/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    Json(request): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = EventService::new(&state);
    let event = service.create_event(actor.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Fetch a single event. Only the parent link's creator (or an admin) may
/// read it.
/// GET /api/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    use crate::schema::events;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let event = events::table.find(id).first::<Event>(&mut conn).await?;

    let link = match event.link_id {
        Some(link_id) => Link::find_by_id(&mut conn, link_id).await.ok(),
        None => None,
    };

    if !allow(
        Some(&actor),
        Action::Read,
        &Resource::Event {
            link_creator_id: link.as_ref().map(|l| l.creator_id),
        },
    ) {
        return Err(ServiceError::Forbidden);
    }

    Ok(Json(EventResponse {
        id: event.id,
        occurred_at: event.occurred_at,
        link: link.map(|l| EventLinkInfo {
            id: l.id,
            url: l.url,
            order: l.display_order,
            text: l.text,
        }),
    }))
}

/// Recorded events are immutable: every mutation verb on the item route
/// answers 405.
/// PUT/PATCH/DELETE /api/events/{id}
pub async fn event_mutation_not_allowed() -> ServiceError {
    ServiceError::MethodNotAllowed
}

// Event filter pipeline: narrows the event collection by identity, then by
// the resolved time window, and loads each event joined with its parent link.
//
// Identity filtering is applied first to keep query cost down. Non-admin
// callers are always intersected with their own links, so asking for another
// user's events yields an empty result rather than an error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app::AppState,
    app_config::EventDeleteBehavior,
    db::DieselPool,
    models::event::{CreateEventRequest, Event, EventLinkInfo, EventQueryParams, EventRecord, NewEvent},
    models::link::Link,
    schema::{events, links, users},
    services::access_policy::Actor,
    services::time_window::{
        parse_date, resolve_window, ResolvedWindow, TimeWindow, UpperBound, WindowParams,
    },
    utils::service_error::ServiceError,
};

/// Row shape loaded by the pipeline: event columns plus the nullable parent
/// link columns from the left join.
type EventRow = (Uuid, DateTime<Utc>, Option<(Uuid, String, Option<i32>, Option<String>)>);

pub struct EventService {
    diesel_pool: DieselPool,
    event_delete_behavior: EventDeleteBehavior,
}

impl EventService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            event_delete_behavior: state.config.event_delete_behavior,
        }
    }

    /// Resolve the window keyword for a list query: `time` wins, `limit` is
    /// the historical alias.
    pub fn list_keyword<'a>(params: &'a EventQueryParams) -> Option<&'a str> {
        params.time.as_deref().or(params.limit.as_deref())
    }

    /// Run the full pipeline: identity filter, then time filter, ordered by
    /// occurrence time ascending. Unmatched ids yield empty results.
    #[instrument(skip(self, actor, params))]
    pub async fn filter_events(
        &self,
        actor: &Actor,
        params: &EventQueryParams,
        keyword: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, ServiceError> {
        let link_id = params
            .link_id()
            .map_err(|_| ServiceError::ValidationError("Invalid link id".to_string()))?;

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

        self.run_query(actor, link_id, params.username.as_deref(), window, now)
            .await
    }

    async fn run_query(
        &self,
        actor: &Actor,
        link_id: Option<Uuid>,
        username: Option<&str>,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, ServiceError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        let mut query = events::table
            .left_join(links::table)
            .select((
                events::id,
                events::occurred_at,
                (links::id, links::url, links::display_order, links::text).nullable(),
            ))
            .order((events::occurred_at.asc(), events::created_at.asc()))
            .into_boxed();

        // Identity filter first
        if let Some(link_id) = link_id {
            query = query.filter(events::link_id.eq(link_id));
        } else if let Some(username) = username {
            match self.resolve_username(&mut conn, username).await? {
                Some(creator_id) => {
                    query = query.filter(links::creator_id.eq(creator_id));
                }
                // Unknown username matches nothing rather than erroring
                None => return Ok(Vec::new()),
            }
        }

        // Non-admin results are always scoped to the caller's own links, so
        // cross-user identity filters deny by coming back empty.
        if !actor.is_admin {
            query = query.filter(links::creator_id.eq(actor.id));
        }

        // Time filter second
        let mut latest_only = false;
        match window.resolve(now) {
            ResolvedWindow::All => {}
            ResolvedWindow::Latest => {
                query = query
                    .order((events::occurred_at.desc(), events::created_at.desc()))
                    .limit(1);
                latest_only = true;
            }
            ResolvedWindow::Bounds(bounds) => {
                if let Some(start) = bounds.start {
                    query = query.filter(events::occurred_at.ge(start));
                }
                match bounds.end {
                    Some(UpperBound::Inclusive(end)) => {
                        query = query.filter(events::occurred_at.le(end));
                    }
                    Some(UpperBound::Exclusive(end)) => {
                        query = query.filter(events::occurred_at.lt(end));
                    }
                    None => {}
                }
            }
        }

        let rows: Vec<EventRow> = query
            .load(&mut conn)
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        let mut records: Vec<EventRecord> = rows
            .into_iter()
            .map(|(id, occurred_at, link)| EventRecord {
                id,
                occurred_at,
                link: link.map(|(id, url, order, text)| EventLinkInfo {
                    id,
                    url,
                    order,
                    text,
                }),
            })
            .collect();

        // `latest` selects the newest row; present it in ascending order
        // like every other result.
        if latest_only {
            records.reverse();
        }

        Ok(records)
    }

    async fn resolve_username(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        username: &str,
    ) -> Result<Option<Uuid>, ServiceError> {
        let user_id = users::table
            .filter(users::username.eq(username))
            .select(users::id)
            .first::<Uuid>(conn)
            .await
            .optional()
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
        Ok(user_id)
    }

    /// Record an event against a link. Public: no actor required. An admin
    /// caller may override the occurrence timestamp; the override is parsed
    /// fail-open and silently ignored for everyone else.
    #[instrument(skip(self, actor, request))]
    pub async fn create_event(
        &self,
        actor: Option<&Actor>,
        request: &CreateEventRequest,
    ) -> Result<Event, ServiceError> {
        let link_id = request
            .link
            .ok_or_else(|| ServiceError::ValidationError("link is required".to_string()))?;

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        // Unknown link is a validation error on create, unlike filtering
        Link::find_by_id(&mut conn, link_id)
            .await
            .map_err(|_| ServiceError::ValidationError("Unknown link".to_string()))?;

        let is_admin = actor.map(|a| a.is_admin).unwrap_or(false);
        let occurred_at = if is_admin {
            parse_date(request.time.as_deref())
        } else {
            None
        };

        let new_event = NewEvent::for_link(link_id, occurred_at);
        let event = diesel::insert_into(events::table)
            .values(&new_event)
            .get_result::<Event>(&mut conn)
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        info!("Recorded event {} for link {}", event.id, link_id);
        Ok(event)
    }

    /// Detach or delete a link's events ahead of the link row's deletion,
    /// per the configured behavior.
    pub async fn scrub_events_for_link(
        &self,
        conn: &mut diesel_async::AsyncPgConnection,
        link_id: Uuid,
    ) -> Result<(), ServiceError> {
        match self.event_delete_behavior {
            EventDeleteBehavior::Cascade => {
                diesel::delete(events::table.filter(events::link_id.eq(link_id)))
                    .execute(conn)
                    .await
                    .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
            }
            EventDeleteBehavior::SetNull => {
                diesel::update(events::table.filter(events::link_id.eq(link_id)))
                    .set(events::link_id.eq(None::<Uuid>))
                    .execute(conn)
                    .await
                    .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
            }
        }
        Ok(())
    }
}

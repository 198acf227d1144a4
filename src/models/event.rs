// Event model: a timestamped visit/click record against one link

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::events;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Event {
    pub id: Uuid,
    pub link_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub id: Uuid,
    pub link_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn for_link(link_id: Uuid, occurred_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            link_id: Some(link_id),
            occurred_at: occurred_at.unwrap_or(now),
            created_at: now,
        }
    }
}

/// Request to record an event (POST /api/events)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub link: Option<Uuid>,
    /// Admin-only override for the event timestamp; ignored for other callers
    pub time: Option<String>,
}

/// Parent link fields flattened into event responses and CSV rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLinkInfo {
    pub id: Uuid,
    pub url: String,
    pub order: Option<i32>,
    pub text: Option<String>,
}

/// Serialized event with its parent link embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub link: Option<EventLinkInfo>,
}

/// An event joined with its parent link, as produced by the filter pipeline.
/// This is the record the aggregation engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub link: Option<EventLinkInfo>,
}

impl EventRecord {
    pub fn to_response(&self) -> EventResponse {
        EventResponse {
            id: self.id,
            occurred_at: self.occurred_at,
            link: self.link.clone(),
        }
    }
}

/// Query parameters for GET /api/events and /api/events/stats.
/// Every field is optional; malformed values are handled fail-open by the
/// time-window resolver rather than rejected here, so they stay strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQueryParams {
    pub link: Option<String>,
    pub username: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub time: Option<String>,
    pub limit: Option<String>,
    pub method: Option<String>,
}

impl EventQueryParams {
    /// The link id filter, if present. Unlike the date parameters, a
    /// malformed id is a validation error (400), not a fail-open absence.
    pub fn link_id(&self) -> Result<Option<Uuid>, uuid::Error> {
        self.link.as_deref().map(Uuid::parse_str).transpose()
    }

    pub fn wants_count(&self) -> bool {
        self.method
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case("count"))
            .unwrap_or(false)
    }
}

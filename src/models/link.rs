// Link model: a creator-owned outbound URL shown on the creator's page

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app_config::MediaConfig;
use crate::schema::links;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Link {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub url: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub display_order: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = links)]
pub struct NewLink {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub url: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub display_order: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Update link fields; the creator is immutable after creation
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = links)]
pub struct UpdateLink {
    pub url: Option<String>,
    pub text: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub display_order: Option<Option<i32>>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to create a new link
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 8192, message = "URL must be less than 8192 characters"))]
    pub url: String,

    #[validate(length(max = 500, message = "Text must be less than 500 characters"))]
    pub text: Option<String>,

    pub image: Option<String>,

    pub display_order: Option<i32>,
}

/// Request to update an existing link
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 8192, message = "URL must be less than 8192 characters"))]
    pub url: Option<String>,

    #[validate(length(max = 500, message = "Text must be less than 500 characters"))]
    pub text: Option<Option<String>>,

    pub image: Option<Option<String>>,

    pub display_order: Option<Option<i32>>,
}

impl UpdateLinkRequest {
    pub fn into_changeset(self) -> UpdateLink {
        UpdateLink {
            url: self.url,
            text: self.text,
            image: self.image,
            display_order: self.display_order,
        }
    }
}

/// Link response for API
#[derive(Debug, Clone, Serialize)]
pub struct LinkResponse {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub url: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub display_order: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Link {
    pub fn to_response(&self, media: &MediaConfig) -> LinkResponse {
        LinkResponse {
            id: self.id,
            creator_id: self.creator_id,
            url: self.url.clone(),
            text: self.text.clone(),
            image: self.image.as_deref().map(|p| media.url_for(p)),
            display_order: self.display_order,
            created_at: self.created_at,
        }
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        link_id: Uuid,
    ) -> Result<Link, diesel::result::Error> {
        links::table.find(link_id).first::<Link>(conn).await
    }
}

/// Query parameters for GET /api/links
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkListParams {
    pub username: Option<String>,
}

// Preference model: one row per user, holds optional background/profile images

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_config::MediaConfig;
use crate::schema::preferences;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = preferences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Preference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub background_img: Option<String>,
    pub profile_img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = preferences)]
pub struct NewPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub background_img: Option<String>,
    pub profile_img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewPreference {
    /// Empty preference row created alongside a new user
    pub fn for_user(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            background_img: None,
            profile_img: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Image update fields (PATCH /api/preferences/{id})
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePreferenceRequest {
    pub background_img: Option<String>,
    pub profile_img: Option<String>,
}

/// Preference response with public media URLs resolved
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub background_img: Option<String>,
    pub profile_img: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Preference {
    pub fn to_response(&self, media: &MediaConfig) -> PreferenceResponse {
        PreferenceResponse {
            id: self.id,
            user_id: self.user_id,
            background_img: self.background_img.as_deref().map(|p| media.url_for(p)),
            profile_img: self.profile_img.as_deref().map(|p| media.url_for(p)),
            updated_at: self.updated_at,
        }
    }

    pub async fn find_by_user(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<Preference, diesel::result::Error> {
        preferences::table
            .filter(preferences::user_id.eq(user_id))
            .first::<Preference>(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        id: Uuid,
    ) -> Result<Preference, diesel::result::Error> {
        preferences::table.find(id).first::<Preference>(conn).await
    }
}

// Instagram access token storage, written only by the OAuth exchange flow

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::ig_tokens;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = ig_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IgToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ig_tokens)]
pub struct NewIgToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewIgToken {
    pub fn for_user(user_id: Uuid, access_token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            access_token,
            created_at: now,
            updated_at: now,
        }
    }
}

impl IgToken {
    pub async fn find_by_user(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<IgToken, diesel::result::Error> {
        ig_tokens::table
            .filter(ig_tokens::user_id.eq(user_id))
            .first::<IgToken>(conn)
            .await
    }
}

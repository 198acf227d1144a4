// Opaque bearer token, one per user, issued at account creation

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::auth_tokens;

const TOKEN_KEY_BYTES: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = auth_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = auth_tokens)]
pub struct NewAuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

impl NewAuthToken {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            key: generate_token_key(),
            created_at: Utc::now(),
        }
    }
}

impl AuthToken {
    pub async fn find_by_key(
        conn: &mut AsyncPgConnection,
        key: &str,
    ) -> Result<AuthToken, diesel::result::Error> {
        auth_tokens::table
            .filter(auth_tokens::key.eq(key))
            .first::<AuthToken>(conn)
            .await
    }

    pub async fn find_by_user(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<AuthToken, diesel::result::Error> {
        auth_tokens::table
            .filter(auth_tokens::user_id.eq(user_id))
            .first::<AuthToken>(conn)
            .await
    }
}

/// 40-character hex token key
pub fn generate_token_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; TOKEN_KEY_BYTES] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key_shape() {
        let key = generate_token_key();
        assert_eq!(key.len(), TOKEN_KEY_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_keys_differ() {
        assert_ne!(generate_token_key(), generate_token_key());
    }
}

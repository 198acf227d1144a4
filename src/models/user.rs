// User database model and profile DTOs

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::schema::users;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").unwrap();
}

/// User database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile update fields
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Registration request (POST /api/users/create_account)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    #[validate(regex(
        path = "USERNAME_REGEX",
        message = "Username can only contain letters, numbers, dots, hyphens, and underscores"
    ))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Display name; split into first/last on a best-effort basis
    #[validate(length(max = 300, message = "Name must be less than 300 characters"))]
    pub name: Option<String>,

    /// Optional Instagram access token captured during signup
    pub token: Option<String>,

    /// Optional profile image URL to download and store
    #[validate(url(message = "Invalid profile image URL"))]
    pub profile_img: Option<String>,
}

impl CreateAccountRequest {
    /// Split the display name into (first, last), mirroring signup behavior:
    /// first word is the first name, last word is the last name.
    pub fn split_name(&self) -> (String, String) {
        let name = self.name.as_deref().unwrap_or("").trim();
        let parts: Vec<&str> = name.split_whitespace().collect();
        match parts.as_slice() {
            [] => (String::new(), String::new()),
            [first] => (first.to_string(), String::new()),
            [first, .., last] => (first.to_string(), last.to_string()),
        }
    }
}

/// Profile update request (PATCH /api/users/{id})
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 150, message = "First name must be less than 150 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Last name must be less than 150 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 320, message = "Email must be less than 320 characters"))]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}

/// User response for API (never exposes the password hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<User, diesel::result::Error> {
        users::table.find(user_id).first::<User>(conn).await
    }

    pub async fn find_by_username(
        conn: &mut AsyncPgConnection,
        name: &str,
    ) -> Result<User, diesel::result::Error> {
        users::table
            .filter(users::username.eq(name))
            .first::<User>(conn)
            .await
    }

    /// Does a user with this username exist?
    pub async fn exists(
        conn: &mut AsyncPgConnection,
        name: &str,
    ) -> Result<bool, diesel::result::Error> {
        let count: i64 = users::table
            .filter(users::username.eq(name))
            .count()
            .get_result(conn)
            .await?;
        Ok(count == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_regex() {
        for name in ["alice", "shop.your.links", "a-b_c", "User99"] {
            assert!(USERNAME_REGEX.is_match(name), "should accept {}", name);
        }
        for name in [".leading-dot", "has space", "oops@domain", ""] {
            assert!(!USERNAME_REGEX.is_match(name), "should reject {}", name);
        }
    }

    #[test]
    fn test_split_name() {
        let req = |name: Option<&str>| CreateAccountRequest {
            username: "u".into(),
            password: "password123".into(),
            name: name.map(String::from),
            token: None,
            profile_img: None,
        };

        assert_eq!(
            req(Some("Ada Lovelace")).split_name(),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            req(Some("Prince")).split_name(),
            ("Prince".to_string(), String::new())
        );
        assert_eq!(
            req(Some("Anna Maria van Schurman")).split_name(),
            ("Anna".to_string(), "Schurman".to_string())
        );
        assert_eq!(req(None).split_name(), (String::new(), String::new()));
    }
}

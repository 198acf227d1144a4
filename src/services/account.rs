// Account service: registration, login, and profile updates.
//
// A new account is three rows (user, preference, auth token) written in one
// transaction, so there is no window where a user exists without its
// preference or token.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::auth_token::{AuthToken, NewAuthToken},
    models::preference::{NewPreference, Preference},
    models::user::{CreateAccountRequest, NewUser, UpdateUser, UpdateUserRequest, User},
    schema::{auth_tokens, preferences, users},
    utils::service_error::ServiceError,
};

pub struct AccountService {
    diesel_pool: DieselPool,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            bcrypt_cost: state.config.bcrypt_cost,
        }
    }

    /// Create a user with its preference row and bearer token atomically.
    #[instrument(skip(self, request))]
    pub async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<(User, AuthToken), ServiceError> {
        request.validate()?;

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        if User::exists(&mut conn, &request.username).await? {
            return Err(ServiceError::ValidationError(
                "User already exists".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&request.password, self.bcrypt_cost)?;
        let (first_name, last_name) = request.split_name();
        let now = Utc::now();
        let new_user = NewUser {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            password_hash,
            first_name,
            last_name,
            email: String::new(),
            is_admin: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let new_preference = NewPreference::for_user(new_user.id);
        let new_token = NewAuthToken::for_user(new_user.id);

        let (user, token) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let user = diesel::insert_into(users::table)
                        .values(&new_user)
                        .get_result::<User>(conn)
                        .await?;
                    diesel::insert_into(preferences::table)
                        .values(&new_preference)
                        .execute(conn)
                        .await?;
                    let token = diesel::insert_into(auth_tokens::table)
                        .values(&new_token)
                        .get_result::<AuthToken>(conn)
                        .await?;
                    Ok((user, token))
                }
                .scope_boxed()
            })
            .await?;

        info!("Created account for {}", user.username);
        Ok((user, token))
    }

    /// Update profile fields. Saving the user also touches the preference
    /// row in the same transaction (propagation rule).
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: &UpdateUserRequest,
    ) -> Result<User, ServiceError> {
        request.validate()?;

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        let changes = UpdateUser {
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            updated_at: Utc::now(),
        };

        let user = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let user = diesel::update(users::table.find(user_id))
                        .set(&changes)
                        .get_result::<User>(conn)
                        .await?;
                    diesel::update(preferences::table.filter(preferences::user_id.eq(user_id)))
                        .set(preferences::updated_at.eq(Utc::now()))
                        .execute(conn)
                        .await?;
                    Ok(user)
                }
                .scope_boxed()
            })
            .await?;

        Ok(user)
    }

    /// Verify a username/password pair and return the user with its token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, AuthToken), ServiceError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        let user = User::find_by_username(&mut conn, username)
            .await
            .map_err(|_| ServiceError::Unauthorized)?;

        if !user.is_active || !bcrypt::verify(password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized);
        }

        let token = AuthToken::find_by_user(&mut conn, user.id).await?;
        Ok((user, token))
    }

    pub async fn preference_for_user(&self, user_id: Uuid) -> Result<Preference, ServiceError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
        Preference::find_by_user(&mut conn, user_id)
            .await
            .map_err(ServiceError::from)
    }
}

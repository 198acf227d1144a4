// Instagram OAuth collaborator: code-for-token exchange, token storage, and
// profile image import. One outbound call per operation, no retries; a
// provider failure surfaces directly as a client-visible error.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app::AppState,
    app_config::{InstagramConfig, MediaConfig},
    db::DieselPool,
    models::ig_token::{IgToken, NewIgToken},
    schema::{ig_tokens, preferences},
    utils::service_error::ServiceError,
};

// Shared HTTP client for the OAuth exchange and image downloads
static OAUTH_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent("ShopYourLinks/1.0")
        .build()
        .expect("Failed to create HTTP client for OAuth exchange")
});

/// Result of the code exchange: upstream status plus its JSON body,
/// passed through to the caller. The status rides as a bare u16 so
/// handlers can rebuild it in their own http types.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ExchangeResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// The access token field of a successful exchange
    pub fn access_token(&self) -> Option<String> {
        self.body
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(String::from)
    }
}

pub struct InstagramService {
    diesel_pool: DieselPool,
    instagram: InstagramConfig,
    media: MediaConfig,
}

impl InstagramService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            instagram: state.config.instagram.clone(),
            media: state.config.media.clone(),
        }
    }

    /// Exchange an OAuth authorization code for an access token.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<ExchangeResponse, ServiceError> {
        let params = [
            ("client_id", self.instagram.client_id.as_str()),
            ("client_secret", self.instagram.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.instagram.redirect_uri.as_str()),
            ("code", code),
        ];

        let response = OAUTH_HTTP_CLIENT
            .post(&self.instagram.access_token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or_else(|_| serde_json::json!({}));

        if status != 200 {
            warn!("Instagram token exchange failed with status {}", status);
        }

        Ok(ExchangeResponse { status, body })
    }

    /// Store (or replace) the user's Instagram access token.
    pub async fn store_token(&self, user_id: Uuid, access_token: &str) -> Result<(), ServiceError> {
        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        match IgToken::find_by_user(&mut conn, user_id).await {
            Ok(existing) => {
                diesel::update(ig_tokens::table.find(existing.id))
                    .set((
                        ig_tokens::access_token.eq(access_token),
                        ig_tokens::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)
                    .await
                    .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
            }
            Err(diesel::result::Error::NotFound) => {
                diesel::insert_into(ig_tokens::table)
                    .values(&NewIgToken::for_user(user_id, access_token.to_string()))
                    .execute(&mut conn)
                    .await
                    .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
            }
            Err(e) => return Err(ServiceError::DatabaseError(e.to_string())),
        }

        info!("Stored Instagram token for user {}", user_id);
        Ok(())
    }

    /// Download a profile image and record it on the user's preference.
    #[instrument(skip(self, image_url))]
    pub async fn import_profile_image(
        &self,
        user_id: Uuid,
        image_url: &str,
    ) -> Result<String, ServiceError> {
        let response = OAUTH_HTTP_CLIENT.get(image_url).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::UpstreamError(format!(
                "Image download failed with status {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;

        let stored_path = format!("profiles/{}.jpg", user_id);
        let target = self.media.root.join(&stored_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::InternalError(format!("Media write failed: {}", e)))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| ServiceError::InternalError(format!("Media write failed: {}", e)))?;

        let mut conn = self
            .diesel_pool
            .get()
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;
        diesel::update(preferences::table.filter(preferences::user_id.eq(user_id)))
            .set((
                preferences::profile_img.eq(&stored_path),
                preferences::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        info!("Imported profile image for user {}", user_id);
        Ok(stored_path)
    }
}

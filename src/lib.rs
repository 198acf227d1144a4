// Library exports for the ShopYourLinks backend

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use app::AppState;
pub use app_config::{AppConfig, ConfigError};
pub use db::DieselPool;
pub use middleware::{auth_middleware, MaybeActor, RequireActor};
pub use services::{AccountService, EventService, InstagramService};
pub use utils::service_error::ServiceError;

/// Assemble the full application router: the /api surface behind token
/// authentication, static media, and the health probe.
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/links", handlers::link_routes())
        .nest("/events", handlers::event_routes())
        .nest("/users", handlers::user_routes())
        .nest("/preferences", handlers::preference_routes())
        .merge(handlers::session_routes());

    let mut router = Router::new()
        .nest("/api", api)
        .route("/health", get(health_check));

    // Serve uploads directly only when media is configured as a local path;
    // an absolute base URL means a CDN owns it.
    if state.config.media.base_url.starts_with('/') {
        let media_path = format!("/{}", state.config.media.base_url.trim_matches('/'));
        router = router.nest_service(&media_path, ServeDir::new(&state.config.media.root));
    }

    router
        .fallback(handlers::fallback_404)
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health probe: verifies a database connection can be checked out.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match db::check_diesel_health(&state.diesel_pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "service": "shopyourlinks-backend",
                "timestamp": timestamp,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unhealthy",
                "service": "shopyourlinks-backend",
                "timestamp": timestamp,
                "error": format!("Database connection failed: {}", e),
            })),
        ),
    }
}

// HTTP handlers and route builders

pub mod auth;
pub mod events;
pub mod links;
pub mod preferences;
pub mod users;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

use crate::app::AppState;

pub fn link_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(links::list_links).post(links::create_link))
        .route(
            "/{id}",
            get(links::get_link)
                .put(links::update_link)
                .patch(links::update_link)
                .delete(links::delete_link),
        )
}

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/stats", get(events::event_stats))
        .route(
            "/{id}",
            get(events::get_event)
                .put(events::event_mutation_not_allowed)
                .patch(events::event_mutation_not_allowed)
                .delete(events::event_mutation_not_allowed),
        )
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::get_user))
        .route("/create_account", post(users::create_account))
        .route("/igauth", get(users::igauth))
        .route("/ig_response", get(users::ig_response))
        .route("/{id}", patch(users::update_user))
}

pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(preferences::get_preference))
        .route("/{id}", patch(preferences::update_preference))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Catch-all for unknown routes
pub async fn fallback_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "details": "invalid URL - check OPTION /api" })),
    )
}

// HTTP middleware: token authentication and CORS

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, MaybeActor, RequireActor};
pub use cors::cors_layer;

// Database models and request/response DTOs

pub mod auth_token;
pub mod event;
pub mod ig_token;
pub mod link;
pub mod preference;
pub mod user;

pub use auth_token::AuthToken;
pub use event::{Event, EventResponse, NewEvent};
pub use ig_token::IgToken;
pub use link::{Link, LinkResponse, NewLink};
pub use preference::{NewPreference, Preference, PreferenceResponse};
pub use user::{NewUser, User, UserResponse};

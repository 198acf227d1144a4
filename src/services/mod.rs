// Services module for the ShopYourLinks backend
// Business logic layer for the application

pub mod access_policy;
pub mod account;
pub mod aggregation;
pub mod events;
pub mod instagram;
pub mod time_window;

// Re-export commonly used services and core types
pub use access_policy::{allow, allow_event_list, Action, Actor, Resource};
pub use account::AccountService;
pub use aggregation::{bucket_events, densify_daily, generate_csv, Bucket, DailySeriesSpec, Granularity, StatsResponse};
pub use events::EventService;
pub use instagram::InstagramService;
pub use time_window::{resolve_window, ResolvedWindow, TimeBounds, TimeWindow, WindowParams};

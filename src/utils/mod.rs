// Utility modules for the ShopYourLinks backend

pub mod service_error;
pub mod validation;

pub use service_error::ServiceError;
pub use validation::{trim_and_validate_field, trim_optional_field};

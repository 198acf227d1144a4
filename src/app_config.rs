// Centralized configuration for the ShopYourLinks backend.
// All environment variables are read once at startup; the resulting struct
// is passed into AppState and from there into the components that need it.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What happens to a link's events when the link is deleted.
/// Historical schema versions disagreed, so this is a deployment choice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventDeleteBehavior {
    Cascade,
    SetNull,
}

impl EventDeleteBehavior {
    fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "cascade" => Ok(EventDeleteBehavior::Cascade),
            "set_null" | "setnull" | "set-null" => Ok(EventDeleteBehavior::SetNull),
            other => Err(ConfigError::InvalidValue(
                "EVENT_DELETE_BEHAVIOR".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// Instagram OAuth collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub access_token_url: String,
}

/// Media (uploaded image) storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Filesystem directory uploaded images are written to
    pub root: PathBuf,
    /// Public URL prefix images are served under
    pub base_url: String,
}

impl MediaConfig {
    /// Build the public URL for a stored media path
    pub fn url_for(&self, stored_path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            stored_path.trim_start_matches('/')
        )
    }
}

/// Complete application configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Server
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connect_timeout: u64,
    pub database_idle_timeout: u64,
    pub database_max_lifetime: u64,
    pub disable_embedded_migrations: bool,

    // Security
    pub bcrypt_cost: u32,
    pub cors_allowed_origins: Vec<String>,

    // Feature behavior
    pub event_delete_behavior: EventDeleteBehavior,

    // Collaborators
    pub media: MediaConfig,
    pub instagram: InstagramConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: get_var_or("BIND_ADDRESS", "0.0.0.0"),
            port: parse_var_or("PORT", 8080)?,
            environment: Environment::from(get_var_or("ENVIRONMENT", "development")),

            database_url: require_var("DATABASE_URL")?,
            database_max_connections: parse_var_or("DATABASE_MAX_CONNECTIONS", 20)?,
            database_min_connections: parse_var_or("DATABASE_MIN_CONNECTIONS", 2)?,
            database_connect_timeout: parse_var_or("DATABASE_CONNECT_TIMEOUT", 10)?,
            database_idle_timeout: parse_var_or("DATABASE_IDLE_TIMEOUT", 600)?,
            database_max_lifetime: parse_var_or("DATABASE_MAX_LIFETIME", 1800)?,
            disable_embedded_migrations: parse_var_or("DISABLE_EMBEDDED_MIGRATIONS", false)?,

            bcrypt_cost: parse_var_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_allowed_origins: get_var_or("CORS_ALLOWED_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            event_delete_behavior: EventDeleteBehavior::parse(&get_var_or(
                "EVENT_DELETE_BEHAVIOR",
                "cascade",
            ))?,

            media: MediaConfig {
                root: PathBuf::from(get_var_or("MEDIA_ROOT", "./media")),
                base_url: get_var_or("MEDIA_BASE_URL", "/media"),
            },
            instagram: InstagramConfig {
                client_id: get_var_or("IG_CLIENT_ID", ""),
                client_secret: get_var_or("IG_CLIENT_SECRET", ""),
                redirect_uri: get_var_or("IG_REDIRECT_URI", ""),
                access_token_url: get_var_or(
                    "IG_ACCESS_TOKEN_URL",
                    "https://api.instagram.com/oauth/access_token",
                ),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn get_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_delete_behavior_parsing() {
        assert_eq!(
            EventDeleteBehavior::parse("cascade").unwrap(),
            EventDeleteBehavior::Cascade
        );
        assert_eq!(
            EventDeleteBehavior::parse("SET_NULL").unwrap(),
            EventDeleteBehavior::SetNull
        );
        assert!(EventDeleteBehavior::parse("drop").is_err());
    }

    #[test]
    fn test_media_url_construction() {
        let media = MediaConfig {
            root: PathBuf::from("/var/media"),
            base_url: "https://cdn.example.com/media/".to_string(),
        };
        assert_eq!(
            media.url_for("profiles/abc.jpg"),
            "https://cdn.example.com/media/profiles/abc.jpg"
        );
        assert_eq!(
            media.url_for("/profiles/abc.jpg"),
            "https://cdn.example.com/media/profiles/abc.jpg"
        );
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(
            Environment::from("prod".to_string()),
            Environment::Production
        );
        assert_eq!(
            Environment::from("unknown".to_string()),
            Environment::Development
        );
    }
}

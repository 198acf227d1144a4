// Application state shared across handlers
use std::sync::Arc;

use crate::{app_config::AppConfig, db::DieselPool};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
}

impl AppState {
    pub fn new(config: AppConfig, diesel_pool: DieselPool) -> Self {
        Self {
            config: Arc::new(config),
            diesel_pool,
        }
    }
}

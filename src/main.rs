use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopyourlinks_backend::{
    app::AppState,
    app_config::AppConfig,
    create_app, db, migrations,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopyourlinks_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Configuration error: {}", e),
            ));
        }
    };

    let bind_address = config.server_address();
    info!("Starting ShopYourLinks backend on {}", bind_address);
    info!(
        "Database: {}",
        db::mask_connection_string(&config.database_url)
    );

    let db_config = db::DieselDatabaseConfig::from_app_config(&config);
    let diesel_pool = match db::create_diesel_pool(db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database pool: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Database initialization failed: {}", e),
            ));
        }
    };

    if !config.disable_embedded_migrations {
        if let Err(e) = migrations::run_migrations(&config.database_url).await {
            error!("Migration failed: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Migration failed: {}", e),
            ));
        }
    }

    let state = AppState::new(config, diesel_pool);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);
    axum::serve(listener, app).await
}

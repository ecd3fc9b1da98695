use tower_http::cors::CorsLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ngo_dashboard::{AppState, ApiClient, app, config::Config, constants::*};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load and validate configuration
    let config = Config::from_env().map_err(|e| format!("Configuration error: {}", e))?;

    let api = ApiClient::new(config.api_base_url.clone(), config.upstream_timeout)
        .map_err(|e| format!("Failed to create API client: {}", e))?;
    let app_state = AppState {
        api,
        upload_max_bytes: config.upload_max_bytes,
    };

    // Sessions only hold the selected role and flash messages, so the
    // in-memory store is enough.
    let mut app = app::with_session(app::router(app_state), &config.session_secret, config.production)?;

    // Cross-origin access is only needed when another frontend embeds the pages
    if let Some(frontend_origin) = &config.frontend_origin {
        let frontend_origin_header = frontend_origin
            .parse::<axum::http::HeaderValue>()
            .map_err(|e| format!("Invalid FRONTEND_ORIGIN '{}': {}", frontend_origin, e))?;

        let cors = CorsLayer::new()
            .allow_origin(frontend_origin_header)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
                axum::http::header::COOKIE,
            ])
            .allow_credentials(true);
        app = app.layer(cors);
    }

    // Create TCP listener with proper error handling
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_address, e))?;

    tracing::info!(
        address = %bind_address,
        backend = %config.api_base_url,
        upload_max_bytes = config.upload_max_bytes,
        "dashboard running"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}

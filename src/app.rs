use axum::{
    Router,
    routing::{get, post},
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use crate::constants::*;
use crate::{AppState, files, navigation, receipt, resources};

async fn healthz() -> &'static str {
    "ok"
}

/// Every page of the dashboard, without the session layer.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(navigation::home))
        .route("/healthz", get(healthz))
        .route("/roles/reset", post(navigation::reset_role))
        .route("/roles/{role}", get(navigation::select_role))
        .merge(resources::routes())
        .merge(receipt::routes())
        .merge(files::routes(app_state.upload_max_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Wraps the router with signed-cookie sessions held in memory.
pub fn with_session(router: Router, session_secret: &str, secure: bool) -> Result<Router, String> {
    let session_key = Key::try_from(session_secret.as_bytes())
        .map_err(|e| format!("Invalid session secret: {}", e))?;

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    Ok(router.layer(session_layer))
}

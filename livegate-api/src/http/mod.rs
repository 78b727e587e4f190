// Module: http
// HTTP control surface: relay control, room keys, live stats, static files

pub mod control;
pub mod error;
pub mod form;
pub mod middleware;
pub mod response;
pub mod stats;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use livegate_core::auth::{AuthError, JwtVerifier};
use livegate_core::engine::StreamProvider;
use livegate_core::room_keys::RoomKeyStore;
use livegate_core::{Config, RelaySessionRegistry, StatsProjector};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};
pub use response::{ApiResponse, Envelope};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relays: Arc<RelaySessionRegistry>,
    pub stats: StatsProjector,
    /// Engine stream registry; `None` when no engine is attached
    pub streams: Option<Arc<dyn StreamProvider>>,
    pub room_keys: Arc<dyn RoomKeyStore>,
    pub api_key: Arc<str>,
    pub jwt: Option<JwtVerifier>,
    pub statics_dir: PathBuf,
}

impl AppState {
    /// Assemble the state from configuration and the engine collaborators
    pub fn new(
        config: &Config,
        relays: Arc<RelaySessionRegistry>,
        streams: Option<Arc<dyn StreamProvider>>,
        room_keys: Arc<dyn RoomKeyStore>,
    ) -> Result<Self, AuthError> {
        let stats = streams
            .clone()
            .map_or_else(StatsProjector::detached, StatsProjector::new);

        Ok(Self {
            relays,
            stats,
            streams,
            room_keys,
            api_key: Arc::from(config.auth.api_key.as_str()),
            jwt: JwtVerifier::from_config(&config.jwt)?,
            statics_dir: PathBuf::from(&config.statics.dir),
        })
    }
}

/// Create the HTTP router with all routes
///
/// `/control/*` and `/stats/*` require the static API key; the bearer-token
/// check, when configured, covers every route including `/statics`.
pub fn create_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/control/push", get(control::push).post(control::push))
        .route("/control/pull", get(control::pull).post(control::pull))
        .route("/control/reset", get(control::reset).post(control::reset))
        .route("/control/get", get(control::get).post(control::get))
        .route("/control/delete", get(control::delete).post(control::delete))
        .route("/stats/livestats", get(stats::livestats))
        .route("/stats/livestat", get(stats::livestat))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    gated
        .nest_service("/statics", ServeDir::new(&state.statics_dir))
        .fallback(|| async { AppError::not_found("Not Found") })
        .layer(from_fn_with_state(state.clone(), middleware::require_jwt))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

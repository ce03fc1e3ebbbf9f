//! Parqués Server - HTTP transport for live matches
//!
//! This crate provides the multiplayer backend:
//! - Session directory keyed by 6-character match codes
//! - Per-turn timeout timers
//! - Broadcast fan-out of match events
//! - REST API for match creation, actions, and snapshots

pub mod directory;
pub mod events;
mod routes;
mod state;
pub mod timers;

use axum::{
    routing::{get, post},
    Router,
};
use parques_core::MatchConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use directory::{DirectoryError, SessionDirectory};
pub use events::{BroadcastObserver, LogResultsSink, MatchEvent};
pub use state::{ServerState, DEFAULT_EVENT_CAPACITY};
pub use timers::TurnTimers;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub match_config: MatchConfig,
    /// Overrides `match_config.turn_timeout_ms` when set
    pub turn_timeout_ms: Option<u64>,
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8002,
            match_config: MatchConfig::default(),
            turn_timeout_ms: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Match config with the timeout override applied
    pub fn effective_match_config(&self) -> MatchConfig {
        let mut config = self.match_config.clone();
        if let Some(timeout_ms) = self.turn_timeout_ms {
            config.turn_timeout_ms = timeout_ms;
        }
        config
    }
}

/// Create the router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Board geometry
        .route("/api/board/:variant", get(routes::board::get_board))
        // Matches
        .route(
            "/api/matches",
            get(routes::matches::list_matches).post(routes::matches::create_match),
        )
        .route(
            "/api/matches/:code",
            get(routes::matches::get_match).delete(routes::matches::cancel_match),
        )
        .route(
            "/api/matches/:code/actions",
            post(routes::matches::submit_action),
        )
        // Shared state
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    config.match_config.validate()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(ServerState::new(
        config.effective_match_config(),
        config.event_capacity,
    ));
    let router = create_router(state);

    tracing::info!("Parqués server starting on http://0.0.0.0:{}", config.port);
    tracing::info!(
        "Board: {:?}, turn timeout: {} ms",
        config.match_config.variant,
        config.effective_match_config().turn_timeout_ms
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

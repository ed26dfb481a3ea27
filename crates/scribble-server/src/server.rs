//! HTTP and WebSocket surface.

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::connection::handle_socket;
use crate::error::ServerError;
use crate::registry::RoomRegistry;
use crate::room::RoomSummary;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub rooms: RoomRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let rooms = RoomRegistry::new(config.default_room.clone());
        Self { config, rooms }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Room to join; the default room when absent
    pub room: Option<String>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/rooms", get(rooms));

    // Serve the drawing client when one is configured
    let router = match &state.config.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.route("/", get(index)),
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process stops.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_on(listener, config).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    info!("Scribble server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Index page
async fn index() -> &'static str {
    "Scribble Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Per-room counters
async fn rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    Json(state.rooms.summaries().await)
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let room = state.rooms.resolve(params.room.as_deref());
    let capacity = state.config.session_capacity();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, room, capacity))
}

//! Axum router: REST endpoints, the `/ws` upgrade, health, and metrics.

mod admin;
pub mod error;
mod messages;
mod push;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use parlor_store::ChatStore;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::relay::Relay;
use crate::ws::handler::ws_handler;
use crate::ws::rooms::RoomRegistry;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence facade.
    pub store: Arc<ChatStore>,
    /// The relay core driven by WebSocket events.
    pub relay: Arc<Relay>,
    /// Connection registry for fan-out.
    pub rooms: Arc<RoomRegistry>,
    /// Admin shared secret.
    pub admin_password: Arc<str>,
    /// Renders the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}

/// Build the Axum router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/admin/verify", post(admin::verify))
        .route("/api/admin/sessions", get(admin::list_sessions))
        .route(
            "/api/admin/sessions/{session_id}",
            delete(admin::delete_session),
        )
        .route("/api/messages/{session_id}", get(messages::list_messages))
        .route("/api/push/register", post(push::register))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Heartbeat endpoint.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.rooms.connection_count(),
    }))
}

/// Prometheus text exposition.
async fn metrics_endpoint(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

/// Bind the listener and serve in a background task.
pub async fn start(host: &str, port: u16, state: AppState) -> std::io::Result<ServerHandle> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let local_addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by [`start`]; the serve task lives for the process.
pub struct ServerHandle {
    /// Actually bound port (useful with port 0).
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

//! MCP Server implementation
//!
//! The [`ConnectionManager`] turns every accepted channel into its own
//! [`Session`]. Channels come from stdio or from WebSocket upgrades on the
//! HTTP server, which also exposes info and health endpoints.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::mcp::registry::ToolRegistry;
use crate::mcp::session::{Session, SessionState, SERVER_NAME, SERVER_VERSION};
use crate::mcp::transport::{LineTransport, Transport, WebSocketTransport};
use crate::mcp::types::MCP_VERSION;

/// Accepts channels and runs one session per channel
pub struct ConnectionManager {
    /// Shared, immutable tool set
    registry: Arc<ToolRegistry>,

    /// Bound on a single tool invocation
    tool_timeout: Duration,

    /// Sessions currently running
    active: AtomicUsize,

    /// Next session id
    next_id: AtomicU64,
}

impl ConnectionManager {
    /// Create a manager serving `registry`
    pub fn new(registry: ToolRegistry, tool_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            tool_timeout,
            active: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Tools offered to every session
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Number of sessions currently open
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Run a session over `transport` until the channel closes
    pub async fn serve_channel<T: Transport>(&self, transport: T) -> SessionState {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let _guard = ActiveGuard::new(&self.active);

        Session::new(id, transport, self.registry.clone(), self.tool_timeout)
            .run()
            .await
    }

    /// Serve a single session on stdin/stdout; returns when stdin closes
    pub async fn run_stdio(&self) -> Result<()> {
        info!("serving MCP over stdio");
        self.serve_channel(LineTransport::stdio()).await;
        Ok(())
    }
}

/// Keeps the active-session count right even if a session task is cancelled
struct ActiveGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ActiveGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

// ==================== HTTP surface ====================

/// Routes: `/` (server info), `/health` and `/mcp` (WebSocket sessions)
pub fn router(manager: Arc<ConnectionManager>) -> Router {
    Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        .route("/mcp", get(mcp_handler))
        .with_state(manager)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(manager: Arc<ConnectionManager>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "WebSocket MCP endpoint listening on /mcp");

    axum::serve(listener, router(manager))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await?;

    Ok(())
}

async fn info_handler(State(manager): State<Arc<ConnectionManager>>) -> impl IntoResponse {
    Json(json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "protocolVersion": MCP_VERSION,
        "endpoint": "/mcp",
        "tools": manager.registry().names(),
    }))
}

async fn health_handler(State(manager): State<Arc<ConnectionManager>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "active_sessions": manager.active_sessions(),
    }))
}

async fn mcp_handler(
    ws: WebSocketUpgrade,
    State(manager): State<Arc<ConnectionManager>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        manager
            .serve_channel(WebSocketTransport::new(socket))
            .await;
    })
}

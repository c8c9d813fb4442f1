//! HUD server for OBS browser sources and other devices
//!
//! Serves a small HUD page and pushes every graded shot over a WebSocket.
//! Default port: 8000

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::feedback::{FeedbackSink, HudPayload, ShotReport};

/// Shared state for HUD handlers
pub struct HudState {
    /// Broadcast channel for shot payloads
    pub update_tx: broadcast::Sender<HudPayload>,
}

impl HudState {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (update_tx, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { update_tx })
    }
}

/// Build the HUD router
pub fn build_router(state: Arc<HudState>) -> Router {
    Router::new()
        .route("/", get(serve_hud))
        .route("/ws", get(hud_ws))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET / - HUD page
async fn serve_hud() -> impl IntoResponse {
    Html(include_str!("../../static/hud.html"))
}

/// GET /ws - push channel for shot payloads
async fn hud_ws(ws: WebSocketUpgrade, State(state): State<Arc<HudState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state.update_tx.subscribe()))
}

async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<HudPayload>) {
    debug!("HUD client connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(payload) => {
                        let msg = match serde_json::to_string(&payload) {
                            Ok(msg) => msg,
                            Err(e) => {
                                warn!("Failed to encode HUD payload: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(msg)).await.is_err() {
                            debug!("HUD client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("HUD broadcast channel closed");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("HUD client lagged by {} shots", n);
                    }
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("HUD client closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("HUD WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}

/// GET /api/health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Sink that broadcasts every shot to connected HUD clients
pub struct HudSink {
    state: Arc<HudState>,
}

impl HudSink {
    pub fn new(state: Arc<HudState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl FeedbackSink for HudSink {
    fn name(&self) -> &str {
        "hud"
    }

    async fn deliver(&self, report: &ShotReport) -> Result<()> {
        let payload = HudPayload::from_classification(&report.classification);
        // No connected clients is not an error
        let _ = self.state.update_tx.send(payload);
        Ok(())
    }
}

/// Bind the HUD server
pub async fn bind(host: &str, port: u16) -> Result<tokio::net::TcpListener> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid HUD server address: {}:{}", host, port))?;
    tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HUD server on {}", addr))
}

/// Serve the HUD on an already bound listener
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<HudState>) -> Result<()> {
    let router = build_router(state);
    if let Ok(addr) = listener.local_addr() {
        info!("HUD available at http://{}", addr);
        info!("Add a Browser Source in OBS pointing at http://127.0.0.1:{}", addr.port());
    }

    axum::serve(listener, router).await.context("HUD server error")?;

    Ok(())
}

//! HTTP invocation interface.
//!
//! `POST /` (also mounted at `/youtube-feed`) takes `{"channelId": "..."}`
//! and answers with the normalized video list or `{"error": "..."}`. Every
//! response carries open CORS headers so the website can call it directly.
//!
//! The `/sermons` routes expose the [`FeedPoller`] board when a channel is
//! configured.

mod handlers;
mod middleware;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

use crate::board::FeedPoller;
use crate::feed::FeedClient;

pub use middleware::ALLOW_HEADERS as CORS_ALLOW_HEADERS;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: FeedClient,
    /// Present when a board channel is configured.
    pub poller: Option<FeedPoller>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::fetch_videos))
        .route("/youtube-feed", post(handlers::fetch_videos))
        .route("/sermons", get(handlers::sermon_board))
        .route("/sermons/refresh", post(handlers::refresh_board))
        .route("/sermons/featured", post(handlers::select_featured))
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::not_found)
        .layer(from_fn(middleware::cors_middleware))
        .layer(from_fn(middleware::request_tracing_middleware))
        .with_state(state)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "Listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

//! The storyteller web form.
//!
//! Routes:
//! - `GET /` form page with the current story
//! - `POST /story` weave a new tale
//! - `POST /story/revise` update the tale
//! - `POST /story/reset` forget the tale
//! - `POST /story/listen` narrate the tale into the page
//! - `GET /story/audio` narrated tale as raw audio
//! - `GET /health` liveness

mod cookie;
mod error;
mod handlers;
mod page;
mod state;

pub use cookie::{SESSION_COOKIE, SessionCookie};
pub use page::PageRenderer;
pub use state::{AppState, SessionId};

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/story", post(handlers::generate))
        .route("/story/revise", post(handlers::revise))
        .route("/story/reset", post(handlers::reset))
        .route("/story/listen", post(handlers::listen))
        .route("/story/audio", get(handlers::audio))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on `listener` until Ctrl+C.
///
/// # Errors
///
/// Returns [`AppError::Server`] if the server stops with an error.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "storyteller listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .map_err(|e| AppError::server(e.to_string()))
}

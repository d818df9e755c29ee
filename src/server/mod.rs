//! # HTTP Server for Report Generation
//!
//! Exposes configuration cleaning, analysis text and PDF generation over
//! HTTP.
//!
//! ## Usage
//!
//! ```bash
//! releve serve --listen 0.0.0.0:8080
//! ```
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /api/health` | liveness |
//! | `POST /api/config/clean` | partial config → complete config |
//! | `POST /api/config/validate` | partial config → `{ valid, errors }` |
//! | `POST /api/analysis` | report (+ templates) → text per category |
//! | `POST /api/evolution` | current + previous or percentage → evolution |
//! | `POST /api/report/pdf` | report (+ config) → `application/pdf` |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::compose::HttpImageLoader;
use crate::error::ReleveError;
use state::IMAGE_CACHE_EXPIRATION_SECS;

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/config/clean", post(handlers::config::clean))
        .route("/api/config/validate", post(handlers::config::validate))
        .route("/api/analysis", post(handlers::analysis::generate))
        .route("/api/evolution", post(handlers::analysis::evolution))
        .route("/api/report/pdf", post(handlers::report::pdf))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use releve::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), releve::error::ReleveError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ReleveError> {
    let (app_state, loader) = AppState::new(config.clone())?;

    // Spawn background cache cleanup task
    tokio::spawn(cleanup_image_cache(loader));

    let app = router(Arc::new(app_state));

    log::info!("Releve HTTP server listening on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            ReleveError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ReleveError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to drop images nobody asked for recently.
async fn cleanup_image_cache(loader: HttpImageLoader) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(IMAGE_CACHE_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let removed = loader.evict_older_than(expiration).await;
        if removed > 0 {
            log::info!(
                "[cache] Cleaned up {} expired images ({} remaining)",
                removed,
                loader.cached_count().await
            );
        }
    }
}

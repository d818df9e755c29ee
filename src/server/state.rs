//! Server state and configuration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::compose::{ComposeOptions, DEFAULT_LOAD_TIMEOUT, HttpImageLoader, ImageLoader};
use crate::error::ReleveError;

/// How long an unused cached image is kept.
pub const IMAGE_CACHE_EXPIRATION_SECS: u64 = 30 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Deadline for each image load during composition
    pub load_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub loader: Arc<dyn ImageLoader>,
    pub options: ComposeOptions,
    pub started_at: Instant,
}

impl AppState {
    /// State backed by the HTTP image loader. Also returns the loader so the
    /// caller can run cache maintenance on it.
    pub fn new(config: ServerConfig) -> Result<(Self, HttpImageLoader), ReleveError> {
        let loader = HttpImageLoader::new()?;
        let state = Self::with_loader(config, Arc::new(loader.clone()));
        Ok((state, loader))
    }

    pub fn with_loader(config: ServerConfig, loader: Arc<dyn ImageLoader>) -> Self {
        let options = ComposeOptions {
            page_format: None,
            load_timeout: config.load_timeout,
        };
        Self {
            config,
            loader,
            options,
            started_at: Instant::now(),
        }
    }
}

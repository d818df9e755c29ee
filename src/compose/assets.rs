//! Image loading for the compositor.
//!
//! The compositor only sees the [`ImageLoader`] trait. [`HttpImageLoader`]
//! fetches `http(s)://` URLs with a shared `reqwest` client and reads local
//! paths (`file://` or bare) from disk, keeping decoded images in an in-memory
//! cache for the lifetime of the loader.

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::ReleveError;

/// A decoded image ready to be placed.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub image: Arc<DynamicImage>,
}

impl LoadedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            image: Arc::new(image),
        }
    }
}

/// Loads an image by URL.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load_image(&self, url: &str) -> Result<LoadedImage, ReleveError>;
}

/// Run `loader.load_image(url)` under a deadline. Timing out is a load failure.
pub async fn load_with_timeout(
    loader: &dyn ImageLoader,
    url: &str,
    timeout: Duration,
) -> Result<LoadedImage, ReleveError> {
    match tokio::time::timeout(timeout, loader.load_image(url)).await {
        Ok(result) => result,
        Err(_) => Err(ReleveError::image(
            url,
            format!("timed out after {} ms", timeout.as_millis()),
        )),
    }
}

/// A cache entry with its last access time.
struct CachedImage {
    image: LoadedImage,
    last_accessed: Instant,
}

impl CachedImage {
    fn new(image: LoadedImage) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Loader backed by HTTP and the local filesystem, with a decoded-image cache.
#[derive(Clone)]
pub struct HttpImageLoader {
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedImage>>>,
}

impl HttpImageLoader {
    pub fn new() -> Result<Self, ReleveError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("releve/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReleveError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of cached images.
    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Drop entries not accessed within `max_age`. Returns how many were removed.
    pub async fn evict_older_than(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, v| now.duration_since(v.last_accessed) < max_age);
        before - cache.len()
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ReleveError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .http_client
                .get(url)
                .send()
                .await
                .map_err(|e| ReleveError::image(url, format!("download failed: {}", e)))?;
            if !response.status().is_success() {
                return Err(ReleveError::image(url, format!("HTTP {}", response.status())));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ReleveError::image(url, format!("failed to read body: {}", e)))?;
            Ok(bytes.to_vec())
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            tokio::fs::read(path)
                .await
                .map_err(|e| ReleveError::image(url, e))
        }
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load_image(&self, url: &str) -> Result<LoadedImage, ReleveError> {
        {
            let mut cache = self.cache.write().await;
            if let Some(entry) = cache.get_mut(url) {
                entry.touch();
                return Ok(entry.image.clone());
            }
        }

        let bytes = self.fetch_bytes(url).await?;
        let image = image::load_from_memory(&bytes)
            .map(LoadedImage::new)
            .map_err(|e| ReleveError::image(url, format!("failed to decode image: {}", e)))?;
        log::debug!("[assets] loaded {} ({}x{})", url, image.width, image.height);

        {
            let mut cache = self.cache.write().await;
            cache.insert(url.to_string(), CachedImage::new(image.clone()));
        }

        Ok(image)
    }
}

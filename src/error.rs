//! # Error Types
//!
//! This module defines error types used throughout the releve library.

use thiserror::Error;

/// Main error type for releve operations
#[derive(Debug, Error)]
pub enum ReleveError {
    /// Template configuration is invalid (one message per problem)
    #[error("Invalid template configuration: {}", .0.join("; "))]
    ConfigValidation(Vec<String>),

    /// A background page could not be loaded. Aborts the whole document.
    #[error("Template page {page} could not be loaded ({url}): {reason}")]
    BackgroundLoad {
        page: usize,
        url: String,
        reason: String,
    },

    /// A secondary asset (logo, screenshot, variable image) failed to load
    #[error("Image error: {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    /// PDF emission error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Transport-level errors (listener bind, server)
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReleveError {
    /// Build an `ImageLoad` error from anything displayable.
    pub fn image(url: &str, reason: impl std::fmt::Display) -> Self {
        ReleveError::ImageLoad {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort document generation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReleveError::ImageLoad { .. })
    }
}

//! # Releve - Template-Driven KPI Reports
//!
//! Releve composites monthly KPI reports into PDF. It provides:
//!
//! - **Template configuration**: background page images plus logo,
//!   screenshot, text and variable zones, with self-healing clean/validate
//! - **Evolution and analysis**: trend classification and French analysis
//!   prose selected from operator templates
//! - **Compositor**: page fit, zone mapping, text wrapping, PDF emission
//! - **Zone editor**: the state machine behind interactive zone drawing
//!
//! ## Quick Start
//!
//! ```no_run
//! use releve::{
//!     compose::{ComposeOptions, HttpImageLoader, generate_document},
//!     config::clean_template_config,
//!     report::ReportData,
//! };
//!
//! # async fn example() -> Result<(), releve::ReleveError> {
//! let raw = serde_json::json!({ "pages": ["https://cdn.example.com/p1.png"] });
//! let config = clean_template_config(&raw);
//! let data: ReportData = serde_json::from_str(&std::fs::read_to_string("report.json")?)?;
//!
//! let loader = HttpImageLoader::new()?;
//! let document = generate_document(&data, &config, &loader, &ComposeOptions::default()).await?;
//! std::fs::write("rapport.pdf", &document.pdf)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`zone`] | Zones and typed placements |
//! | [`config`] | Template configuration: clean, validate, update |
//! | [`report`] | Report data record |
//! | [`evolution`] | Month-over-month evolution and trend buckets |
//! | [`format`] | French number formatting |
//! | [`resolve`] | Variable paths to display values |
//! | [`analysis`] | Analysis text engine |
//! | [`compose`] | Document compositor and image loading |
//! | [`pdf`] | PDF emission |
//! | [`editor`] | Zone editor state machine |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod analysis;
pub mod category;
pub mod compose;
pub mod config;
pub mod editor;
pub mod error;
pub mod evolution;
pub mod format;
pub mod pdf;
pub mod report;
pub mod resolve;
pub mod server;
pub mod zone;

// Re-exports for convenience
pub use category::Category;
pub use config::TemplateConfig;
pub use error::ReleveError;
pub use report::ReportData;

//! # Document Compositor
//!
//! Turns report data into a paginated PDF. Two strategies implement
//! [`DocumentGenerator`]:
//!
//! - [`TemplateCompositor`]: one output page per configured background page,
//!   with logo, screenshots, analysis text and variable zones drawn on top.
//! - [`DefaultLayoutCompositor`]: a fixed A4 layout used when the template has
//!   no pages.
//!
//! [`generate_document`] picks the strategy. Pages are composed one after the
//! other; every image goes through an [`ImageLoader`] under
//! [`ComposeOptions::load_timeout`].
//!
//! ## Failure policy
//!
//! | Asset | On failure |
//! |-------|------------|
//! | Background page | abort, [`ReleveError::BackgroundLoad`] |
//! | Logo, screenshot, variable image | warn and skip the zone |

pub mod assets;
mod default_layout;
pub mod fit;
mod template;
pub mod text;

pub use assets::{HttpImageLoader, ImageLoader, LoadedImage, load_with_timeout};
pub use default_layout::DefaultLayoutCompositor;
pub use fit::PageFit;
pub use template::TemplateCompositor;

use async_trait::async_trait;
use std::time::Duration;

use crate::analysis::with_generated_analyses;
use crate::config::{PageFormat, TemplateConfig};
use crate::error::ReleveError;
use crate::pdf::{PageLayout, emit_document};
use crate::report::ReportData;

/// Default per-image load deadline.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-request composition settings.
#[derive(Debug, Clone, Copy)]
pub struct ComposeOptions {
    /// Overrides the template's page format when set.
    pub page_format: Option<PageFormat>,
    pub load_timeout: Duration,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            page_format: None,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

/// A generated document: the laid-out pages and the PDF bytes.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub pages: Vec<PageLayout>,
    pub pdf: Vec<u8>,
}

impl ComposedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A layout strategy.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Lay out every page.
    async fn layout(
        &self,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) -> Result<Vec<PageLayout>, ReleveError>;

    /// Lay out and emit the PDF.
    async fn generate(
        &self,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) -> Result<ComposedDocument, ReleveError> {
        let pages = self.layout(data, loader, options).await?;
        let pdf = emit_document(&pages)?;
        log::info!(
            "[compose] {} page(s), {} bytes for {}",
            pages.len(),
            pdf.len(),
            data.file_stem()
        );
        Ok(ComposedDocument { pages, pdf })
    }
}

/// Compose with the template strategy. The template must have pages.
pub async fn compose_document(
    data: &ReportData,
    config: &TemplateConfig,
    loader: &dyn ImageLoader,
    options: &ComposeOptions,
) -> Result<ComposedDocument, ReleveError> {
    TemplateCompositor::new(config.clone())
        .generate(data, loader, options)
        .await
}

/// Compose with the fixed default layout.
pub async fn compose_default_document(
    data: &ReportData,
    loader: &dyn ImageLoader,
    options: &ComposeOptions,
) -> Result<ComposedDocument, ReleveError> {
    DefaultLayoutCompositor::default()
        .generate(data, loader, options)
        .await
}

/// Full pipeline: fill missing analyses from the template's trend texts, then
/// compose with the template when it has pages, or the default layout
/// otherwise.
pub async fn generate_document(
    data: &ReportData,
    config: &TemplateConfig,
    loader: &dyn ImageLoader,
    options: &ComposeOptions,
) -> Result<ComposedDocument, ReleveError> {
    let templates = config.non_empty_templates();
    let data = with_generated_analyses(data, Some(&templates));

    let generator: Box<dyn DocumentGenerator> = if config.pages.is_empty() {
        log::info!("[compose] no template pages, using the default layout");
        Box::new(DefaultLayoutCompositor::default())
    } else {
        Box::new(TemplateCompositor::new(config.clone()))
    };
    generator.generate(&data, loader, options).await
}

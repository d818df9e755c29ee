//! Template strategy: configured background pages with zones drawn on top.

use async_trait::async_trait;

use super::assets::{ImageLoader, load_with_timeout};
use super::fit::PageFit;
use super::text::layout_text;
use super::{ComposeOptions, DocumentGenerator};
use crate::config::TemplateConfig;
use crate::error::ReleveError;
use crate::pdf::font::FontFace;
use crate::pdf::{DrawOp, PageLayout, Rect};
use crate::report::ReportData;
use crate::resolve::{ResolveKind, resolve_variable};
use crate::zone::{Placement, TextStyle, VariableBinding};

/// Composes one output page per background page of a template.
#[derive(Debug, Clone)]
pub struct TemplateCompositor {
    config: TemplateConfig,
}

/// What a placement draws once bound to report data.
enum Content {
    Image(String),
    Text(String, TextStyle),
}

impl TemplateCompositor {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Bind a placement to the data. `None` means nothing to draw.
    fn bind(placement: &Placement, data: &ReportData) -> Option<Content> {
        match placement {
            Placement::Logo(_) => data.logo_url().map(|u| Content::Image(u.to_string())),
            Placement::Screenshot { category, .. } => data
                .screenshot(*category)
                .map(|u| Content::Image(u.to_string())),
            Placement::Text {
                category, style, ..
            } => data
                .kpi(*category)
                .map(|k| k.analysis.trim())
                .filter(|a| !a.is_empty())
                .map(|a| Content::Text(a.to_string(), style.clone())),
            Placement::Variable {
                variable, binding, ..
            } => match binding {
                VariableBinding::Image => {
                    resolve_variable(variable, data, ResolveKind::Image).map(Content::Image)
                }
                VariableBinding::Text(style) => resolve_variable(variable, data, ResolveKind::Text)
                    .map(|t| Content::Text(t, style.clone())),
            },
        }
    }

    async fn draw_placement(
        &self,
        page: &mut PageLayout,
        placement: &Placement,
        area: Rect,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) {
        let Some(content) = Self::bind(placement, data) else {
            log::debug!("[compose] {}: nothing to draw", placement.describe());
            return;
        };
        match content {
            Content::Image(url) => match load_with_timeout(loader, &url, options.load_timeout).await {
                Ok(image) => page.push(DrawOp::Image {
                    rect: area,
                    source: url,
                    image: image.image,
                }),
                Err(e) => log::warn!("[compose] skipping {}: {}", placement.describe(), e),
            },
            Content::Text(text, style) => {
                let runs = layout_text(
                    &text,
                    area,
                    style.font_size,
                    FontFace::Regular,
                    style.align,
                    style.rgb(),
                );
                page.ops.extend(runs.into_iter().map(DrawOp::Text));
            }
        }
    }
}

/// Reason text of a loader error, without the URL prefix.
fn load_reason(err: ReleveError) -> String {
    match err {
        ReleveError::ImageLoad { reason, .. } => reason,
        other => other.to_string(),
    }
}

#[async_trait]
impl DocumentGenerator for TemplateCompositor {
    async fn layout(
        &self,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) -> Result<Vec<PageLayout>, ReleveError> {
        if self.config.pages.is_empty() {
            return Err(ReleveError::ConfigValidation(vec![
                "template has no pages".to_string(),
            ]));
        }
        let format = options.page_format.unwrap_or(self.config.page_format);
        let mut pages = Vec::with_capacity(self.config.pages.len());

        for (index, url) in self.config.pages.iter().enumerate() {
            let number = index + 1;
            let background = load_with_timeout(loader, url, options.load_timeout)
                .await
                .map_err(|e| ReleveError::BackgroundLoad {
                    page: number,
                    url: url.clone(),
                    reason: load_reason(e),
                })?;

            let fit = PageFit::new(background.width, background.height, format);
            let mut page = PageLayout::new(format.width_mm, format.height_mm);
            page.push(DrawOp::Image {
                source: url.clone(),
                rect: fit.image_rect(),
                image: background.image,
            });

            for placement in self.config.placements_on_page(number as u32) {
                let area = fit.map_zone(placement.zone());
                self.draw_placement(&mut page, &placement, area, data, loader, options)
                    .await;
            }
            log::debug!("[compose] page {} laid out ({} ops)", number, page.ops.len());
            pages.push(page);
        }
        Ok(pages)
    }
}

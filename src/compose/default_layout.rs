//! Default layout strategy, used when a template has no background pages.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ title band          [logo]   │
//! ├──────────────────────────────┤
//! │ Appels                       │  heading
//! │ Ce mois-ci … Évolution …     │  KPI line
//! │ analysis paragraph …         │
//! │ [screenshot]                 │
//! │ Clics vers le site web       │
//! │ …                            │
//! └──────────────────────────────┘
//! ```
//!
//! Sections follow the fixed category order and flow onto a new page when
//! the current one runs out of room.

use async_trait::async_trait;

use super::assets::{ImageLoader, load_with_timeout};
use super::fit::contain;
use super::text::{block_height, layout_lines, line_advance, wrap_text};
use super::{ComposeOptions, DocumentGenerator};
use crate::analysis::{PhraseStyle, builtin_phrase};
use crate::category::Category;
use crate::config::PageFormat;
use crate::error::ReleveError;
use crate::evolution::compute_evolution;
use crate::format::{format_evolution, format_number};
use crate::pdf::font::FontFace;
use crate::pdf::{DrawOp, PageLayout, Rect};
use crate::report::ReportData;
use crate::zone::{Align, Rgb};

const MARGIN: f64 = 15.0;
const BAND_HEIGHT: f64 = 32.0;
const SECTION_GAP: f64 = 8.0;
const SCREENSHOT_MAX_HEIGHT: f64 = 80.0;

const TITLE_SIZE: f64 = 18.0;
const SUBTITLE_SIZE: f64 = 12.0;
const HEADING_SIZE: f64 = 14.0;
const KPI_SIZE: f64 = 10.0;
const BODY_SIZE: f64 = 11.0;

const BRAND: Rgb = Rgb(0x1f, 0x3a, 0x5f);
const BODY: Rgb = Rgb(0x33, 0x33, 0x33);
const FAVORABLE: Rgb = Rgb(0x2e, 0x7d, 0x32);
const UNFAVORABLE: Rgb = Rgb(0xc6, 0x28, 0x28);

/// Fixed-section layout on plain pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLayoutCompositor;

/// Pages laid out so far and the vertical position on the last one.
struct Flow {
    format: PageFormat,
    pages: Vec<PageLayout>,
    y: f64,
}

impl Flow {
    fn new(format: PageFormat) -> Self {
        Self {
            format,
            pages: vec![PageLayout::new(format.width_mm, format.height_mm)],
            y: MARGIN,
        }
    }

    fn content_width(&self) -> f64 {
        self.format.width_mm - 2.0 * MARGIN
    }

    fn page(&mut self) -> &mut PageLayout {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Start a new page unless `height` still fits on this one. A block taller
    /// than a whole page is placed at the top of a fresh page anyway.
    fn reserve(&mut self, height: f64) {
        let bottom = self.format.height_mm - MARGIN;
        if self.y + height > bottom && self.y > MARGIN {
            self.pages
                .push(PageLayout::new(self.format.width_mm, self.format.height_mm));
            self.y = MARGIN;
        }
    }

    fn lines(&mut self, lines: &[String], size: f64, face: FontFace, color: Rgb) {
        let area = Rect::new(MARGIN, self.y, self.content_width(), block_height(lines.len(), size));
        let runs = layout_lines(lines, area, size, face, Align::Left, color);
        self.page().ops.extend(runs.into_iter().map(DrawOp::Text));
        self.y += area.height;
    }
}

impl DefaultLayoutCompositor {
    async fn title_band(
        &self,
        flow: &mut Flow,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) {
        let width = flow.format.width_mm;
        let page = flow.page();
        page.push(DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, width, BAND_HEIGHT),
            color: BRAND,
        });

        let title = vec!["Rapport mensuel de performance".to_string()];
        let subtitle = vec![format!("{} · {}", data.client.name.trim(), data.period.label())];
        let text_area = Rect::new(MARGIN, 8.0, width - 2.0 * MARGIN, BAND_HEIGHT);
        page.ops.extend(
            layout_lines(&title, text_area, TITLE_SIZE, FontFace::Bold, Align::Left, Rgb::WHITE)
                .into_iter()
                .map(DrawOp::Text),
        );
        let subtitle_area = Rect::new(
            MARGIN,
            text_area.y + line_advance(TITLE_SIZE) + 4.0,
            text_area.width,
            BAND_HEIGHT,
        );
        page.ops.extend(
            layout_lines(
                &subtitle,
                subtitle_area,
                SUBTITLE_SIZE,
                FontFace::Regular,
                Align::Left,
                Rgb::WHITE,
            )
            .into_iter()
            .map(DrawOp::Text),
        );

        if let Some(url) = data.logo_url() {
            match load_with_timeout(loader, url, options.load_timeout).await {
                Ok(logo) => {
                    let area = Rect::new(width - MARGIN - 40.0, 6.0, 40.0, BAND_HEIGHT - 12.0);
                    flow.page().push(DrawOp::Image {
                        rect: contain(logo.width, logo.height, area),
                        source: url.to_string(),
                        image: logo.image,
                    });
                }
                Err(e) => log::warn!("[compose] skipping logo: {}", e),
            }
        }
        flow.y = BAND_HEIGHT + SECTION_GAP;
    }

    async fn section(
        &self,
        flow: &mut Flow,
        category: Category,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) {
        let width = flow.content_width();
        let heading = vec![category.label().to_string()];

        let (kpi_line, analysis, kpi_color) = match data.kpi(category) {
            Some(kpi) => {
                let evolution = compute_evolution(kpi.current, kpi.previous);
                let shown_pct = if kpi.previous == 0.0 {
                    0.0
                } else {
                    evolution.signed_percentage
                };
                let line = format!(
                    "Ce mois-ci : {}   Mois précédent : {}   Évolution : {}",
                    format_number(kpi.current),
                    format_number(kpi.previous),
                    format_evolution(evolution.difference, shown_pct)
                );
                let analysis = if kpi.analysis.trim().is_empty() {
                    builtin_phrase(category, kpi.current, kpi.previous, &evolution, PhraseStyle::Binary)
                } else {
                    kpi.analysis.clone()
                };
                let color = if evolution.direction.is_favorable() {
                    FAVORABLE
                } else {
                    UNFAVORABLE
                };
                (
                    wrap_text(&line, width, KPI_SIZE, FontFace::Regular),
                    wrap_text(&analysis, width, BODY_SIZE, FontFace::Regular),
                    color,
                )
            }
            None => (Vec::new(), Vec::new(), BODY),
        };

        let text_height = block_height(1, HEADING_SIZE)
            + block_height(kpi_line.len(), KPI_SIZE)
            + block_height(analysis.len(), BODY_SIZE)
            + 2.0;
        flow.reserve(text_height);
        flow.lines(&heading, HEADING_SIZE, FontFace::Bold, BRAND);
        flow.y += 1.0;
        flow.lines(&kpi_line, KPI_SIZE, FontFace::Regular, kpi_color);
        flow.y += 1.0;
        flow.lines(&analysis, BODY_SIZE, FontFace::Regular, BODY);

        if let Some(url) = data.screenshot(category) {
            match load_with_timeout(loader, url, options.load_timeout).await {
                Ok(shot) => {
                    let fitted = contain(
                        shot.width,
                        shot.height,
                        Rect::new(0.0, 0.0, width, SCREENSHOT_MAX_HEIGHT),
                    );
                    flow.reserve(fitted.height + 3.0);
                    let rect = Rect::new(
                        MARGIN + fitted.x,
                        flow.y + 3.0,
                        fitted.width,
                        fitted.height,
                    );
                    flow.page().push(DrawOp::Image {
                        rect,
                        source: url.to_string(),
                        image: shot.image,
                    });
                    flow.y = rect.y + rect.height;
                }
                Err(e) => log::warn!("[compose] skipping screenshot '{}': {}", category, e),
            }
        }
        flow.y += SECTION_GAP;
    }
}

#[async_trait]
impl DocumentGenerator for DefaultLayoutCompositor {
    async fn layout(
        &self,
        data: &ReportData,
        loader: &dyn ImageLoader,
        options: &ComposeOptions,
    ) -> Result<Vec<PageLayout>, ReleveError> {
        let format = options.page_format.unwrap_or(PageFormat::A4_PORTRAIT);
        let mut flow = Flow::new(format);
        self.title_band(&mut flow, data, loader, options).await;

        for category in Category::ALL {
            if data.kpi(category).is_none() && data.screenshot(category).is_none() {
                continue;
            }
            self.section(&mut flow, category, data, loader, options).await;
        }
        Ok(flow.pages)
    }
}

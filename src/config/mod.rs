//! # Template Configuration
//!
//! The persisted, declarative description of a report template: ordered
//! background page images plus every zone drawn on top of them.
//!
//! Configurations are built interactively, page by page, so the store is
//! self-healing: [`clean_template_config`] turns any partial or stale JSON
//! value into a complete `TemplateConfig`, and [`validate_template_config`]
//! only reports genuine operator mistakes.
//!
//! ```
//! use releve::config::{clean_template_config, validate_template_config};
//!
//! let raw = serde_json::json!({ "pages": ["https://cdn.example.com/p1.png"] });
//! let config = clean_template_config(&raw);
//! assert_eq!(config.page_count(), 1);
//! assert!(validate_template_config(&raw).valid);
//! ```

mod clean;
mod update;

pub use clean::{ValidationReport, clean_template_config, validate_template_config};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::category::Category;
use crate::evolution::Direction;
use crate::zone::{
    Align, LogoPlacement, Placement, ScreenshotPlacement, TextPlacement, TextStyle,
    VariablePlacement, ZoneRect,
};

/// Output page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFormat {
    #[serde(alias = "width_mm")]
    pub width_mm: f64,
    #[serde(alias = "height_mm")]
    pub height_mm: f64,
}

impl PageFormat {
    pub const A4_PORTRAIT: PageFormat = PageFormat {
        width_mm: 210.0,
        height_mm: 297.0,
    };
    pub const A4_LANDSCAPE: PageFormat = PageFormat {
        width_mm: 297.0,
        height_mm: 210.0,
    };

    pub fn aspect_ratio(&self) -> f64 {
        self.width_mm / self.height_mm
    }

    pub fn is_valid(&self) -> bool {
        self.width_mm.is_finite()
            && self.height_mm.is_finite()
            && self.width_mm > 0.0
            && self.height_mm > 0.0
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        PageFormat::A4_PORTRAIT
    }
}

/// Prose templates for one category, one per trend bucket.
///
/// Each template may contain `{{placeholder}}` tokens; see
/// [`crate::analysis`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendTextBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "positiveModerate")]
    pub positive_moderate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "negativeModerate")]
    pub negative_moderate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
}

impl TrendTextBucket {
    /// The template for exactly this bucket, if it has any content.
    pub fn get(&self, direction: Direction) -> Option<&str> {
        let slot = match direction {
            Direction::Positive => &self.positive,
            Direction::PositiveModerate => &self.positive_moderate,
            Direction::Stable => &self.stable,
            Direction::NegativeModerate => &self.negative_moderate,
            Direction::Negative => &self.negative,
        };
        slot.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn set(&mut self, direction: Direction, template: Option<String>) {
        let slot = match direction {
            Direction::Positive => &mut self.positive,
            Direction::PositiveModerate => &mut self.positive_moderate,
            Direction::Stable => &mut self.stable,
            Direction::NegativeModerate => &mut self.negative_moderate,
            Direction::Negative => &mut self.negative,
        };
        *slot = template;
    }

    pub fn is_empty(&self) -> bool {
        Direction::ALL.iter().all(|d| self.get(*d).is_none())
    }
}

/// OCR extraction rectangle. The page is optional (OCR runs on screenshots).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcrRect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where to read the current and previous KPI values from a screenshot.
/// Carried for round-tripping; extraction itself is an external aid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcrZone {
    pub current: OcrRect,
    pub previous: OcrRect,
}

/// Aggregate root of the template configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Background page image URLs; index + 1 is the page number.
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default, alias = "logo_placement")]
    pub logo_placement: Option<LogoPlacement>,
    #[serde(default, alias = "screenshot_placements")]
    pub screenshot_placements: BTreeMap<Category, ScreenshotPlacement>,
    #[serde(default, alias = "text_placements")]
    pub text_placements: BTreeMap<Category, TextPlacement>,
    #[serde(default, alias = "text_templates")]
    pub text_templates: BTreeMap<Category, TrendTextBucket>,
    #[serde(default, alias = "ocr_zones")]
    pub ocr_zones: BTreeMap<Category, OcrZone>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariablePlacement>,
    #[serde(default, alias = "page_format")]
    pub page_format: PageFormat,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig::default_layout()
    }
}

/// Default logo zone (page 1, top left).
pub fn default_logo_placement() -> LogoPlacement {
    ZoneRect::new(1, 60.0, 60.0, 240.0, 120.0)
}

/// Default screenshot zone for a category: upper half of its own page.
pub fn default_screenshot_placement(category: Category) -> ScreenshotPlacement {
    ZoneRect::new(category.default_page(), 120.0, 380.0, 1000.0, 620.0)
}

/// Default analysis text zone for a category: under its screenshot.
pub fn default_text_placement(category: Category) -> TextPlacement {
    TextPlacement {
        zone: ZoneRect::new(category.default_page(), 120.0, 1080.0, 1000.0, 360.0),
        style: TextStyle {
            font_size: 12.0,
            color: crate::zone::DEFAULT_TEXT_COLOR.to_string(),
            align: Align::Left,
        },
    }
}

impl TemplateConfig {
    /// A fresh default configuration: no pages, every category zone at its
    /// documented default, empty templates.
    pub fn default_layout() -> Self {
        Self {
            pages: Vec::new(),
            logo_placement: Some(default_logo_placement()),
            screenshot_placements: Category::ALL
                .iter()
                .map(|c| (*c, default_screenshot_placement(*c)))
                .collect(),
            text_placements: Category::ALL
                .iter()
                .map(|c| (*c, default_text_placement(*c)))
                .collect(),
            text_templates: Category::ALL
                .iter()
                .map(|c| (*c, TrendTextBucket::default()))
                .collect(),
            ocr_zones: BTreeMap::new(),
            variables: BTreeMap::new(),
            page_format: PageFormat::default(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Templates for a category, when any bucket is filled.
    pub fn templates_for(&self, category: Category) -> Option<&TrendTextBucket> {
        self.text_templates.get(&category).filter(|b| !b.is_empty())
    }

    /// All templates that have content, keyed by category.
    pub fn non_empty_templates(&self) -> BTreeMap<Category, TrendTextBucket> {
        self.text_templates
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(c, b)| (*c, b.clone()))
            .collect()
    }

    /// Every placement, in draw order: free-form variables by key, then
    /// logo, screenshots and category text.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out: Vec<Placement> = self
            .variables
            .iter()
            .map(|(key, variable)| Placement::from((key.clone(), variable.clone())))
            .collect();
        if let Some(logo) = self.logo_placement {
            out.push(Placement::Logo(logo));
        }
        for (category, zone) in &self.screenshot_placements {
            out.push(Placement::Screenshot {
                category: *category,
                zone: *zone,
            });
        }
        for (category, text) in &self.text_placements {
            out.push(Placement::Text {
                category: *category,
                zone: text.zone,
                style: text.style.clone(),
            });
        }
        out
    }

    /// Placements drawn on `page` (1-indexed), in draw order.
    pub fn placements_on_page(&self, page: u32) -> Vec<Placement> {
        self.placements()
            .into_iter()
            .filter(|p| p.zone().page == page)
            .collect()
    }

    /// Whether a placement equals its family's documented default
    /// ("not yet configured"). Free-form variables have no default.
    pub fn is_default_placement(placement: &Placement) -> bool {
        match placement {
            Placement::Logo(zone) => *zone == default_logo_placement(),
            Placement::Screenshot { category, zone } => {
                *zone == default_screenshot_placement(*category)
            }
            Placement::Text {
                category,
                zone,
                style,
            } => {
                let default = default_text_placement(*category);
                *zone == default.zone && *style == default.style
            }
            Placement::Variable { .. } => false,
        }
    }
}

//! # Zone Model
//!
//! A zone is a rectangle in the pixel space of an original background page
//! image. Typed placements layer content on top of a zone:
//!
//! | Placement | Bound to |
//! |-----------|----------|
//! | `Logo` | the client's logo URL |
//! | `Screenshot` | the category's screenshot URL |
//! | `Text` | the category's analysis text |
//! | `Variable` | a dotted variable path (text or image) |
//!
//! The persisted JSON shape keeps one map per placement family (see
//! [`crate::config::TemplateConfig`]); rendering walks the closed
//! [`Placement`] enum instead.

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Page-relative rectangle, in source image pixels. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ZoneRect {
    pub const fn new(page: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            page,
            x,
            y,
            width,
            height,
        }
    }

    /// Page ≥ 1, finite non-negative origin, strictly positive size.
    pub fn is_well_formed(&self) -> bool {
        self.page >= 1
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Whether the zone's page exists in a template with `page_count` pages.
    /// Zones past the end are disabled, not deleted.
    pub fn is_enabled(&self, page_count: usize) -> bool {
        self.page >= 1 && (self.page as usize) <= page_count
    }
}

/// Horizontal text alignment inside a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn parse(s: &str) -> Option<Align> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Align::Left),
            "center" | "centre" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

pub const DEFAULT_FONT_SIZE: f64 = 12.0;
pub const DEFAULT_TEXT_COLOR: &str = "#333333";

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}

/// Typography of a text zone. `font_size` is in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(rename = "fontSize", alias = "font_size", default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub align: Align,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            color: default_color(),
            align: Align::Left,
        }
    }
}

impl TextStyle {
    /// The configured colour, or dark grey when the hex string is unusable.
    pub fn rgb(&self) -> Rgb {
        Rgb::from_hex(&self.color).unwrap_or(Rgb(0x33, 0x33, 0x33))
    }
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Rgb(r, g, b))
            }
            3 => {
                let mut channels = digits.chars().map(|c| {
                    let v = c.to_digit(16).unwrap_or(0) as u8;
                    v * 16 + v
                });
                Some(Rgb(channels.next()?, channels.next()?, channels.next()?))
            }
            _ => None,
        }
    }

    /// Channels in the 0.0–1.0 range used by PDF colour operators.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}

/// What a free-form variable zone draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Text,
    Image,
}

/// Logo zone: bound to the client's logo.
pub type LogoPlacement = ZoneRect;

/// Screenshot zone: bound to a category's screenshot.
pub type ScreenshotPlacement = ZoneRect;

/// Category text zone: zone plus typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPlacement {
    #[serde(flatten)]
    pub zone: ZoneRect,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// Free-form zone bound to a dotted variable path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariablePlacement {
    #[serde(flatten)]
    pub zone: ZoneRect,
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub variable: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// How a variable zone renders, with the style only where it applies.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableBinding {
    Text(TextStyle),
    Image,
}

/// A zone with its content binding, dispatched by tag at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Logo(ZoneRect),
    Screenshot {
        category: Category,
        zone: ZoneRect,
    },
    Text {
        category: Category,
        zone: ZoneRect,
        style: TextStyle,
    },
    Variable {
        key: String,
        variable: String,
        zone: ZoneRect,
        binding: VariableBinding,
    },
}

impl Placement {
    pub fn zone(&self) -> &ZoneRect {
        match self {
            Placement::Logo(zone) => zone,
            Placement::Screenshot { zone, .. } => zone,
            Placement::Text { zone, .. } => zone,
            Placement::Variable { zone, .. } => zone,
        }
    }

    /// Short description for log lines and validation messages.
    pub fn describe(&self) -> String {
        match self {
            Placement::Logo(_) => "logo".to_string(),
            Placement::Screenshot { category, .. } => format!("screenshot '{}'", category),
            Placement::Text { category, .. } => format!("text '{}'", category),
            Placement::Variable { key, variable, .. } => {
                format!("variable '{}' ({})", key, variable)
            }
        }
    }
}

impl From<(String, VariablePlacement)> for Placement {
    fn from((key, v): (String, VariablePlacement)) -> Self {
        let binding = match v.kind {
            VariableKind::Text => VariableBinding::Text(v.style),
            VariableKind::Image => VariableBinding::Image,
        };
        Placement::Variable {
            key,
            variable: v.variable,
            zone: v.zone,
            binding,
        }
    }
}

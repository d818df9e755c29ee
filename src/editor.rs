//! # Zone Editor
//!
//! State machine behind drawing zones with the mouse on a displayed page.
//!
//! ```text
//!          begin (page + zone type + binding selected)
//!   Idle ─────────────────────────────────────────▶ Drawing
//!    ▲                                              │ drag
//!    │ release < 10×10 / cancel                     │
//!    └──────────────────────────────────────────────┤
//!                                                   │ release ≥ 10×10
//!                                                   ▼
//!                                                 Saved ──apply──▶ TemplateConfig
//! ```
//!
//! Pointer coordinates are canvas pixels. The canvas shows the background
//! scaled by `display_scale` (canvas px per image px), so a committed zone is
//! divided by it to land in image pixel space, which is where zones live.
//! The 10 × 10 minimum applies to what the operator drew, in canvas pixels.

use thiserror::Error;

use crate::category::Category;
use crate::config::TemplateConfig;
use crate::error::ReleveError;
use crate::zone::{TextStyle, VariableKind, VariablePlacement, ZoneRect};

/// Smallest zone, in canvas pixels, that can be committed.
pub const MIN_ZONE_SIZE: f64 = 10.0;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("select a page first")]
    NoPage,

    #[error("select a zone type first")]
    NoZoneType,

    #[error("select a category for this zone type")]
    NoCategory,

    #[error("select a variable for this zone")]
    NoVariable,

    #[error("no zone is being drawn")]
    NotDrawing,

    #[error("zone too small ({width:.0}×{height:.0} px, minimum 10×10)")]
    TooSmall { width: f64, height: f64 },

    #[error("no saved zone to apply")]
    NothingSaved,

    #[error("display scale must be a positive number")]
    InvalidScale,

    #[error(transparent)]
    Config(#[from] ReleveError),
}

/// Kind of zone being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Logo,
    Screenshot,
    Text,
    Variable,
}

/// Variable a new variable zone is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSelection {
    pub key: String,
    pub path: String,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorState {
    Idle,
    Drawing { start: (f64, f64), current: (f64, f64) },
    Saved(ZoneRect),
}

#[derive(Debug, Clone)]
pub struct ZoneEditor {
    page: Option<u32>,
    zone_type: Option<ZoneType>,
    category: Option<Category>,
    variable: Option<VariableSelection>,
    display_scale: f64,
    state: EditorState,
}

impl Default for ZoneEditor {
    fn default() -> Self {
        Self {
            page: None,
            zone_type: None,
            category: None,
            variable: None,
            display_scale: 1.0,
            state: EditorState::Idle,
        }
    }
}

impl ZoneEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn select_page(&mut self, page: u32) {
        self.page = (page >= 1).then_some(page);
    }

    pub fn select_zone_type(&mut self, zone_type: ZoneType) {
        self.zone_type = Some(zone_type);
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = Some(category);
    }

    pub fn select_variable(&mut self, key: &str, path: &str, kind: VariableKind) {
        self.variable = Some(VariableSelection {
            key: key.trim().to_string(),
            path: path.trim().to_string(),
            kind,
        });
    }

    /// Canvas pixels per image pixel of the displayed page.
    pub fn set_display_scale(&mut self, scale: f64) -> Result<(), EditorError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EditorError::InvalidScale);
        }
        self.display_scale = scale;
        Ok(())
    }

    /// Whether drawing may start with the current selections.
    pub fn check_ready(&self) -> Result<(), EditorError> {
        self.page.ok_or(EditorError::NoPage)?;
        match self.zone_type.ok_or(EditorError::NoZoneType)? {
            ZoneType::Logo => Ok(()),
            ZoneType::Screenshot | ZoneType::Text => {
                self.category.map(|_| ()).ok_or(EditorError::NoCategory)
            }
            ZoneType::Variable => match &self.variable {
                Some(v) if !v.key.is_empty() && !v.path.is_empty() => Ok(()),
                _ => Err(EditorError::NoVariable),
            },
        }
    }

    /// Pointer down.
    pub fn begin(&mut self, x: f64, y: f64) -> Result<(), EditorError> {
        self.check_ready()?;
        self.state = EditorState::Drawing {
            start: (x, y),
            current: (x, y),
        };
        Ok(())
    }

    /// Pointer move while drawing.
    pub fn drag(&mut self, x: f64, y: f64) -> Result<(), EditorError> {
        match &mut self.state {
            EditorState::Drawing { current, .. } => {
                *current = (x, y);
                Ok(())
            }
            _ => Err(EditorError::NotDrawing),
        }
    }

    /// Pointer up. Commits the zone when it is at least 10 × 10 canvas px,
    /// otherwise discards it and returns to idle.
    pub fn release(&mut self, x: f64, y: f64) -> Result<ZoneRect, EditorError> {
        let EditorState::Drawing { start, .. } = self.state else {
            return Err(EditorError::NotDrawing);
        };
        let page = self.page.ok_or(EditorError::NoPage)?;

        let left = start.0.min(x).max(0.0);
        let top = start.1.min(y).max(0.0);
        let width = start.0.max(x) - left;
        let height = start.1.max(y) - top;

        if width < MIN_ZONE_SIZE || height < MIN_ZONE_SIZE {
            self.state = EditorState::Idle;
            return Err(EditorError::TooSmall { width, height });
        }

        let s = self.display_scale;
        let zone = ZoneRect::new(page, left / s, top / s, width / s, height / s);
        self.state = EditorState::Saved(zone);
        Ok(zone)
    }

    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    /// Write the saved zone into `config` through the matching update command.
    pub fn apply(&self, config: &TemplateConfig) -> Result<TemplateConfig, EditorError> {
        let EditorState::Saved(zone) = self.state else {
            return Err(EditorError::NothingSaved);
        };
        let updated = match self.zone_type.ok_or(EditorError::NoZoneType)? {
            ZoneType::Logo => config.with_logo(Some(zone))?,
            ZoneType::Screenshot => {
                let category = self.category.ok_or(EditorError::NoCategory)?;
                config.with_screenshot_zone(category, zone)?
            }
            ZoneType::Text => {
                let category = self.category.ok_or(EditorError::NoCategory)?;
                // Keep the category's current typography
                let mut placement = config
                    .text_placements
                    .get(&category)
                    .cloned()
                    .unwrap_or_else(|| crate::config::default_text_placement(category));
                placement.zone = zone;
                config.with_text_zone(category, placement)?
            }
            ZoneType::Variable => {
                let variable = self.variable.as_ref().ok_or(EditorError::NoVariable)?;
                let style = config
                    .variables
                    .get(&variable.key)
                    .map(|v| v.style.clone())
                    .unwrap_or_else(TextStyle::default);
                config.with_variable(
                    &variable.key,
                    VariablePlacement {
                        zone,
                        kind: variable.kind,
                        variable: variable.path.clone(),
                        style,
                    },
                )?
            }
        };
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> TemplateConfig {
        TemplateConfig::default_layout()
            .with_pages(vec!["https://x/p1.png".into(), "https://x/p2.png".into()])
            .unwrap()
    }

    #[test]
    fn test_preconditions_gate_drawing() {
        let mut editor = ZoneEditor::new();
        assert!(matches!(editor.begin(0.0, 0.0), Err(EditorError::NoPage)));
        editor.select_page(2);
        assert!(matches!(editor.begin(0.0, 0.0), Err(EditorError::NoZoneType)));
        editor.select_zone_type(ZoneType::Screenshot);
        assert!(matches!(editor.begin(0.0, 0.0), Err(EditorError::NoCategory)));
        editor.select_category(Category::Calls);
        assert!(editor.begin(0.0, 0.0).is_ok());

        editor.select_zone_type(ZoneType::Variable);
        assert!(matches!(editor.check_ready(), Err(EditorError::NoVariable)));
        editor.select_variable("nom", "client.name", VariableKind::Text);
        assert!(editor.check_ready().is_ok());
    }

    #[test]
    fn test_small_zone_returns_to_idle() {
        let mut editor = ZoneEditor::new();
        editor.select_page(1);
        editor.select_zone_type(ZoneType::Logo);
        editor.begin(100.0, 100.0).unwrap();
        editor.drag(105.0, 130.0).unwrap();
        let err = editor.release(109.0, 130.0).unwrap_err();
        assert!(matches!(err, EditorError::TooSmall { .. }));
        assert_eq!(editor.state(), EditorState::Idle);
        assert!(matches!(editor.drag(1.0, 1.0), Err(EditorError::NotDrawing)));
    }

    #[test]
    fn test_release_normalises_and_scales() {
        let mut editor = ZoneEditor::new();
        editor.select_page(2);
        editor.select_zone_type(ZoneType::Screenshot);
        editor.select_category(Category::Calls);
        editor.set_display_scale(0.5).unwrap();
        editor.begin(60.0, 80.0).unwrap();
        let zone = editor.release(10.0, 30.0).unwrap();
        assert_eq!(zone, ZoneRect::new(2, 20.0, 60.0, 100.0, 100.0));
        assert_eq!(editor.state(), EditorState::Saved(zone));
    }

    #[test]
    fn test_apply_screenshot_zone() {
        let mut editor = ZoneEditor::new();
        editor.select_page(2);
        editor.select_zone_type(ZoneType::Screenshot);
        editor.select_category(Category::Views);
        editor.begin(10.0, 10.0).unwrap();
        editor.release(110.0, 60.0).unwrap();
        let updated = editor.apply(&config()).unwrap();
        assert_eq!(
            updated.screenshot_placements[&Category::Views],
            ZoneRect::new(2, 10.0, 10.0, 100.0, 50.0)
        );
    }

    #[test]
    fn test_apply_text_keeps_style() {
        let mut editor = ZoneEditor::new();
        editor.select_page(1);
        editor.select_zone_type(ZoneType::Text);
        editor.select_category(Category::Calls);
        editor.begin(0.0, 0.0).unwrap();
        editor.release(50.0, 50.0).unwrap();
        let base = config();
        let updated = editor.apply(&base).unwrap();
        assert_eq!(
            updated.text_placements[&Category::Calls].style,
            base.text_placements[&Category::Calls].style
        );
    }

    #[test]
    fn test_apply_variable_and_page_out_of_range() {
        let mut editor = ZoneEditor::new();
        editor.select_page(3);
        editor.select_zone_type(ZoneType::Variable);
        editor.select_variable("periode", "period.label", VariableKind::Text);
        editor.begin(0.0, 0.0).unwrap();
        editor.release(40.0, 20.0).unwrap();
        assert!(matches!(editor.apply(&config()), Err(EditorError::Config(_))));

        editor.select_page(1);
        editor.begin(0.0, 0.0).unwrap();
        editor.release(40.0, 20.0).unwrap();
        let updated = editor.apply(&config()).unwrap();
        assert_eq!(updated.variables["periode"].variable, "period.label");
    }

    #[test]
    fn test_apply_without_saved_zone() {
        let editor = ZoneEditor::new();
        assert!(matches!(editor.apply(&config()), Err(EditorError::NothingSaved)));
    }
}

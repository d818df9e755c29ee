//! Update commands used by the template editor.
//!
//! Each command validates only the subject it edits, then returns a new,
//! cleaned configuration. The receiver is never modified.

use serde::Serialize;
use serde_json::Value;

use super::clean::{
    ocr_zone_is_well_formed, parse_text_placement, parse_variable, parse_zone, strict,
};
use super::{OcrZone, TemplateConfig};
use crate::category::Category;
use crate::error::ReleveError;
use crate::evolution::Direction;
use crate::zone::{LogoPlacement, ScreenshotPlacement, TextPlacement, VariablePlacement, ZoneRect};

fn to_value<T: Serialize>(subject: &T) -> Result<Value, ReleveError> {
    Ok(serde_json::to_value(subject)?)
}

/// Fail with every problem prefixed by `label`.
fn reject_if_any(label: &str, problems: Vec<String>) -> Result<(), ReleveError> {
    if problems.is_empty() {
        return Ok(());
    }
    Err(ReleveError::ConfigValidation(
        problems
            .into_iter()
            .map(|p| format!("{}: {}", label, p))
            .collect(),
    ))
}

impl TemplateConfig {
    fn page_problems(&self, zone: &ZoneRect) -> Vec<String> {
        let count = self.page_count();
        if count > 0 && !zone.is_enabled(count) {
            vec![format!(
                "page {} does not exist ({} page(s) configured)",
                zone.page, count
            )]
        } else {
            Vec::new()
        }
    }

    fn zone_problems(&self, zone: &ZoneRect) -> Result<Vec<String>, ReleveError> {
        let mut problems = parse_zone(&to_value(zone)?).err().unwrap_or_default();
        if problems.is_empty() {
            problems = self.page_problems(zone);
        }
        Ok(problems)
    }

    /// Replace the background pages. Blank URLs are rejected.
    pub fn with_pages(&self, pages: Vec<String>) -> Result<TemplateConfig, ReleveError> {
        let problems = pages
            .iter()
            .enumerate()
            .filter(|(_, url)| url.trim().is_empty())
            .map(|(i, _)| format!("entry {} must be a non-empty URL", i))
            .collect();
        reject_if_any("pages", problems)?;

        let mut next = self.clone();
        next.pages = pages.into_iter().map(|p| p.trim().to_string()).collect();
        Ok(next.cleaned())
    }

    /// Append a background page.
    pub fn with_page_added(&self, url: &str) -> Result<TemplateConfig, ReleveError> {
        let mut pages = self.pages.clone();
        pages.push(url.to_string());
        self.with_pages(pages)
    }

    /// Remove page `page` (1-indexed). Zones keep their page numbers; those
    /// now past the end are disabled.
    pub fn with_page_removed(&self, page: u32) -> Result<TemplateConfig, ReleveError> {
        let count = self.page_count();
        if page == 0 || page as usize > count {
            return Err(ReleveError::ConfigValidation(vec![format!(
                "pages: page {} does not exist ({} page(s) configured)",
                page, count
            )]));
        }
        let mut next = self.clone();
        next.pages.remove(page as usize - 1);
        Ok(next.cleaned())
    }

    /// Set or clear the logo zone.
    pub fn with_logo(&self, logo: Option<LogoPlacement>) -> Result<TemplateConfig, ReleveError> {
        if let Some(zone) = &logo {
            reject_if_any("logoPlacement", self.zone_problems(zone)?)?;
        }
        let mut next = self.clone();
        next.logo_placement = logo;
        Ok(next.cleaned())
    }

    pub fn with_screenshot_zone(
        &self,
        category: Category,
        zone: ScreenshotPlacement,
    ) -> Result<TemplateConfig, ReleveError> {
        let label = format!("screenshotPlacements.{}", category);
        reject_if_any(&label, self.zone_problems(&zone)?)?;
        let mut next = self.clone();
        next.screenshot_placements.insert(category, zone);
        Ok(next.cleaned())
    }

    pub fn with_text_zone(
        &self,
        category: Category,
        placement: TextPlacement,
    ) -> Result<TemplateConfig, ReleveError> {
        let label = format!("textPlacements.{}", category);
        let mut problems = strict(parse_text_placement(&to_value(&placement)?, category))
            .err()
            .unwrap_or_default();
        if problems.is_empty() {
            problems = self.page_problems(&placement.zone);
        }
        reject_if_any(&label, problems)?;
        let mut next = self.clone();
        next.text_placements.insert(category, placement);
        Ok(next.cleaned())
    }

    /// Set one trend template. `None` or blank text clears it.
    pub fn with_text_template(
        &self,
        category: Category,
        direction: Direction,
        template: Option<String>,
    ) -> Result<TemplateConfig, ReleveError> {
        let mut next = self.clone();
        next.text_templates
            .entry(category)
            .or_default()
            .set(direction, template.filter(|t| !t.trim().is_empty()));
        Ok(next.cleaned())
    }

    /// Set or clear a category's OCR zone.
    pub fn with_ocr_zone(
        &self,
        category: Category,
        zone: Option<OcrZone>,
    ) -> Result<TemplateConfig, ReleveError> {
        let mut next = self.clone();
        match zone {
            Some(zone) => {
                if !ocr_zone_is_well_formed(&zone) {
                    return Err(ReleveError::ConfigValidation(vec![format!(
                        "ocrZones.{}: rectangles need a non-negative origin and a positive size",
                        category
                    )]));
                }
                next.ocr_zones.insert(category, zone);
            }
            None => {
                next.ocr_zones.remove(&category);
            }
        }
        Ok(next.cleaned())
    }

    /// Add or replace a free-form variable zone.
    pub fn with_variable(
        &self,
        key: &str,
        placement: VariablePlacement,
    ) -> Result<TemplateConfig, ReleveError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ReleveError::ConfigValidation(vec![
                "variables: key must not be empty".to_string(),
            ]));
        }
        let mut problems = strict(parse_variable(&to_value(&placement)?))
            .err()
            .unwrap_or_default();
        if problems.is_empty() {
            problems = self.page_problems(&placement.zone);
        }
        reject_if_any(&format!("variables.{}", key), problems)?;
        let mut next = self.clone();
        next.variables.insert(key.to_string(), placement);
        Ok(next.cleaned())
    }

    /// Remove a variable zone. Unknown keys are ignored.
    pub fn without_variable(&self, key: &str) -> TemplateConfig {
        let mut next = self.clone();
        next.variables.remove(key.trim());
        next.cleaned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcrRect;
    use crate::zone::{Align, TextStyle, VariableKind};
    use pretty_assertions::assert_eq;

    fn two_pages() -> TemplateConfig {
        TemplateConfig::default_layout()
            .with_pages(vec!["https://x/p1.png".into(), "https://x/p2.png".into()])
            .unwrap()
    }

    fn messages(err: ReleveError) -> Vec<String> {
        match err {
            ReleveError::ConfigValidation(m) => m,
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_pages_commands() {
        let config = two_pages();
        assert_eq!(config.page_count(), 2);

        let added = config.with_page_added("https://x/p3.png").unwrap();
        assert_eq!(added.page_count(), 3);
        assert_eq!(config.page_count(), 2);

        let removed = added.with_page_removed(1).unwrap();
        assert_eq!(
            removed.pages,
            vec!["https://x/p2.png".to_string(), "https://x/p3.png".to_string()]
        );

        assert!(config.with_page_added("   ").is_err());
        assert!(config.with_page_removed(0).is_err());
        assert!(config.with_page_removed(3).is_err());
    }

    #[test]
    fn test_screenshot_zone() {
        let config = two_pages();
        let zone = ZoneRect::new(2, 10.0, 10.0, 100.0, 50.0);
        let next = config.with_screenshot_zone(Category::Calls, zone).unwrap();
        assert_eq!(next.screenshot_placements[&Category::Calls], zone);

        let bad = ZoneRect::new(2, 10.0, 10.0, 0.0, 50.0);
        let errors = messages(config.with_screenshot_zone(Category::Calls, bad).unwrap_err());
        assert_eq!(
            errors,
            vec!["screenshotPlacements.calls: width must be greater than 0".to_string()]
        );

        let far = ZoneRect::new(5, 10.0, 10.0, 100.0, 50.0);
        let errors = messages(config.with_screenshot_zone(Category::Calls, far).unwrap_err());
        assert_eq!(
            errors,
            vec!["screenshotPlacements.calls: page 5 does not exist (2 page(s) configured)".to_string()]
        );
    }

    #[test]
    fn test_logo_set_and_clear() {
        let config = two_pages();
        let cleared = config.with_logo(None).unwrap();
        assert_eq!(cleared.logo_placement, None);
        let zone = ZoneRect::new(1, 5.0, 5.0, 50.0, 20.0);
        assert_eq!(
            config.with_logo(Some(zone)).unwrap().logo_placement,
            Some(zone)
        );
    }

    #[test]
    fn test_text_zone_rejects_bad_style() {
        let config = two_pages();
        let placement = TextPlacement {
            zone: ZoneRect::new(1, 0.0, 0.0, 100.0, 40.0),
            style: TextStyle {
                font_size: 14.0,
                color: "nope".into(),
                align: Align::Center,
            },
        };
        assert!(config.with_text_zone(Category::Views, placement.clone()).is_err());

        let good = TextPlacement {
            style: TextStyle {
                color: "#112233".into(),
                ..placement.style
            },
            ..placement
        };
        let next = config.with_text_zone(Category::Views, good.clone()).unwrap();
        assert_eq!(next.text_placements[&Category::Views], good);
    }

    #[test]
    fn test_text_template_set_and_clear() {
        let config = two_pages();
        let next = config
            .with_text_template(Category::Calls, Direction::Positive, Some("Bravo".into()))
            .unwrap();
        assert_eq!(
            next.templates_for(Category::Calls).and_then(|t| t.get(Direction::Positive)),
            Some("Bravo")
        );
        let cleared = next
            .with_text_template(Category::Calls, Direction::Positive, Some("  ".into()))
            .unwrap();
        assert_eq!(cleared.templates_for(Category::Calls), None);
    }

    #[test]
    fn test_ocr_zone() {
        let config = two_pages();
        let rect = OcrRect {
            page: None,
            x: 1.0,
            y: 1.0,
            width: 10.0,
            height: 5.0,
        };
        let zone = OcrZone {
            current: rect,
            previous: rect,
        };
        let next = config.with_ocr_zone(Category::Calls, Some(zone)).unwrap();
        assert_eq!(next.ocr_zones.get(&Category::Calls), Some(&zone));
        assert!(next.with_ocr_zone(Category::Calls, None).unwrap().ocr_zones.is_empty());

        let broken = OcrZone {
            current: OcrRect { width: 0.0, ..rect },
            previous: rect,
        };
        assert!(config.with_ocr_zone(Category::Calls, Some(broken)).is_err());
    }

    #[test]
    fn test_variables() {
        let config = two_pages();
        let placement = VariablePlacement {
            zone: ZoneRect::new(1, 10.0, 10.0, 200.0, 30.0),
            kind: VariableKind::Text,
            variable: "client.name".into(),
            style: TextStyle::default(),
        };
        let next = config.with_variable("nom", placement.clone()).unwrap();
        assert_eq!(next.variables.get("nom"), Some(&placement));

        let empty_path = VariablePlacement {
            variable: " ".into(),
            ..placement.clone()
        };
        assert!(config.with_variable("nom", empty_path).is_err());
        assert!(config.with_variable("  ", placement).is_err());

        let removed = next.without_variable("nom");
        assert!(removed.variables.is_empty());
        assert_eq!(removed.without_variable("absent"), removed);
    }

    #[test]
    fn test_commands_return_cleaned_configs() {
        let config = two_pages();
        let next = config
            .with_screenshot_zone(Category::Views, ZoneRect::new(1, 1.0, 2.0, 3.0, 4.0))
            .unwrap();
        assert_eq!(next.cleaned(), next);
    }
}

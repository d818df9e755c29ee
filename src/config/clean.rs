//! Clean and validate partial template configurations.
//!
//! Both operations work on raw JSON so that half-edited or stale configs
//! (missing keys, wrong types, zones on pages not uploaded yet) can be
//! repaired instead of rejected at deserialization time.
//!
//! - `clean` never fails. Each zone keeps the caller's value when it is
//!   structurally complete, otherwise the category default.
//! - `validate` cleans first, then reports malformed fields in the input
//!   and non-default zones that point past the last configured page.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    OcrZone, PageFormat, TemplateConfig, TrendTextBucket, default_logo_placement,
    default_screenshot_placement, default_text_placement,
};
use crate::category::Category;
use crate::error::ReleveError;
use crate::evolution::Direction;
use crate::zone::{Align, Rgb, TextPlacement, TextStyle, VariableKind, VariablePlacement, ZoneRect};

const LOGO_KEYS: &[&str] = &["logoPlacement", "logo_placement"];
const SCREENSHOT_KEYS: &[&str] = &["screenshotPlacements", "screenshot_placements"];
const TEXT_KEYS: &[&str] = &["textPlacements", "text_placements"];
const TEMPLATE_KEYS: &[&str] = &["textTemplates", "text_templates"];
const OCR_KEYS: &[&str] = &["ocrZones", "ocr_zones"];
const FORMAT_KEYS: &[&str] = &["pageFormat", "page_format"];

/// Outcome of [`validate_template_config`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// `Ok` when valid, otherwise a `ConfigValidation` error carrying every message.
    pub fn into_result(self) -> Result<(), ReleveError> {
        if self.valid {
            Ok(())
        } else {
            Err(ReleveError::ConfigValidation(self.errors))
        }
    }
}

/// Repair a partial configuration into a complete one. Never fails.
pub fn clean_template_config(raw: &Value) -> TemplateConfig {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let defaults = TemplateConfig::default_layout();

    let pages = field(obj, &["pages"])
        .and_then(Value::as_array)
        .map(|pages| {
            pages
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let logo_placement = match field(obj, LOGO_KEYS) {
        None => defaults.logo_placement,
        Some(Value::Null) => None,
        Some(v) => Some(parse_zone(v).unwrap_or_else(|_| default_logo_placement())),
    };

    let screenshots = field(obj, SCREENSHOT_KEYS).and_then(Value::as_object);
    let screenshot_placements = Category::ALL
        .iter()
        .map(|c| {
            let zone = screenshots
                .and_then(|m| category_entry(m, *c))
                .and_then(|v| parse_zone(v).ok())
                .unwrap_or_else(|| default_screenshot_placement(*c));
            (*c, zone)
        })
        .collect();

    let texts = field(obj, TEXT_KEYS).and_then(Value::as_object);
    let text_placements = Category::ALL
        .iter()
        .map(|c| {
            let placement = texts
                .and_then(|m| category_entry(m, *c))
                .and_then(|v| parse_text_placement(v, *c).ok())
                .map(|(placement, _)| placement)
                .unwrap_or_else(|| default_text_placement(*c));
            (*c, placement)
        })
        .collect();

    let templates = field(obj, TEMPLATE_KEYS).and_then(Value::as_object);
    let text_templates = Category::ALL
        .iter()
        .map(|c| {
            let bucket = templates
                .and_then(|m| category_entry(m, *c))
                .map(parse_bucket)
                .unwrap_or_default();
            (*c, bucket)
        })
        .collect();

    let ocr = field(obj, OCR_KEYS).and_then(Value::as_object);
    let ocr_zones = Category::ALL
        .iter()
        .filter_map(|c| {
            let v = ocr.and_then(|m| category_entry(m, *c))?;
            let zone: OcrZone = serde_json::from_value(v.clone()).ok()?;
            ocr_zone_is_well_formed(&zone).then_some((*c, zone))
        })
        .collect();

    let variables = obj
        .get("variables")
        .and_then(Value::as_object)
        .map(|vars| {
            vars.iter()
                .filter_map(|(key, v)| parse_variable(v).ok().map(|(p, _)| (key.clone(), p)))
                .collect()
        })
        .unwrap_or_default();

    let page_format = field(obj, FORMAT_KEYS)
        .and_then(|v| serde_json::from_value::<PageFormat>(v.clone()).ok())
        .filter(PageFormat::is_valid)
        .unwrap_or_default();

    TemplateConfig {
        pages,
        logo_placement,
        screenshot_placements,
        text_placements,
        text_templates,
        ocr_zones,
        variables,
        page_format,
    }
}

/// Clean, then report malformed input fields and non-default zones that
/// reference pages beyond the configured page count.
pub fn validate_template_config(raw: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    let empty = Map::new();
    let obj = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return ValidationReport::from_errors(vec![
                "configuration must be a JSON object".to_string(),
            ]);
        }
    };

    if let Some(pages) = field(obj, &["pages"]) {
        match pages.as_array() {
            Some(pages) => {
                for (i, page) in pages.iter().enumerate() {
                    if page.as_str().is_none_or(|url| url.trim().is_empty()) {
                        errors.push(format!("pages[{}] must be a non-empty image URL", i));
                    }
                }
            }
            None => errors.push("pages must be an array of image URLs".to_string()),
        }
    }

    if let Some(v) = field(obj, LOGO_KEYS).filter(|v| !v.is_null())
        && let Err(problems) = parse_zone(v)
    {
        errors.extend(problems.into_iter().map(|p| format!("logoPlacement: {}", p)));
    }

    check_category_map(obj, SCREENSHOT_KEYS, "screenshotPlacements", &mut errors, |v, _| {
        parse_zone(v).map(|_| ())
    });
    check_category_map(obj, TEXT_KEYS, "textPlacements", &mut errors, |v, c| {
        strict(parse_text_placement(v, c))
    });
    check_category_map(obj, TEMPLATE_KEYS, "textTemplates", &mut errors, |v, _| {
        check_bucket(v)
    });
    check_category_map(obj, OCR_KEYS, "ocrZones", &mut errors, |v, _| check_ocr_zone(v));

    if let Some(vars) = obj.get("variables") {
        match vars.as_object() {
            Some(vars) => {
                for (key, v) in vars {
                    if let Err(problems) = strict(parse_variable(v)) {
                        errors.extend(
                            problems
                                .into_iter()
                                .map(|p| format!("variables.{}: {}", key, p)),
                        );
                    }
                }
            }
            None => errors.push("variables must be an object".to_string()),
        }
    }

    let config = clean_template_config(raw);
    let page_count = config.page_count();
    for placement in config.placements() {
        let zone = placement.zone();
        if !zone.is_enabled(page_count) && !TemplateConfig::is_default_placement(&placement) {
            errors.push(format!(
                "{}: page {} does not exist ({} page(s) configured)",
                placement.describe(),
                zone.page,
                page_count
            ));
        }
    }

    ValidationReport::from_errors(errors)
}

impl TemplateConfig {
    /// Re-run the cleaning pass on an already typed configuration.
    pub fn cleaned(&self) -> TemplateConfig {
        serde_json::to_value(self)
            .map(|v| clean_template_config(&v))
            .unwrap_or_else(|_| TemplateConfig::default_layout())
    }

    /// Validate an already typed configuration.
    pub fn validate(&self) -> ValidationReport {
        match serde_json::to_value(self) {
            Ok(v) => validate_template_config(&v),
            Err(e) => ValidationReport::from_errors(vec![e.to_string()]),
        }
    }
}

// ============================================================================
// FIELD PARSING
// ============================================================================

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn category_entry(map: &Map<String, Value>, category: Category) -> Option<&Value> {
    field(map, category.keys())
}

/// Run `check` on every entry of a category-keyed map, prefixing problems.
fn check_category_map(
    obj: &Map<String, Value>,
    keys: &[&str],
    label: &str,
    errors: &mut Vec<String>,
    check: impl Fn(&Value, Category) -> Result<(), Vec<String>>,
) {
    let Some(v) = field(obj, keys) else {
        return;
    };
    let Some(map) = v.as_object() else {
        errors.push(format!("{} must be an object keyed by category", label));
        return;
    };
    for (key, entry) in map {
        match Category::from_key(key) {
            Some(category) => {
                if let Err(problems) = check(entry, category) {
                    errors.extend(
                        problems
                            .into_iter()
                            .map(|p| format!("{}.{}: {}", label, key, p)),
                    );
                }
            }
            None => errors.push(format!("{}: unknown category '{}'", label, key)),
        }
    }
}

/// Parse a zone rectangle, collecting every structural problem.
pub(crate) fn parse_zone(v: &Value) -> Result<ZoneRect, Vec<String>> {
    let Some(obj) = v.as_object() else {
        return Err(vec!["zone must be an object".to_string()]);
    };
    let mut problems = Vec::new();

    let page = match obj.get("page") {
        None => {
            problems.push("missing page".to_string());
            None
        }
        Some(p) => match p.as_f64() {
            Some(n) if n.fract() == 0.0 && n >= 1.0 && n <= u32::MAX as f64 => Some(n as u32),
            Some(_) => {
                problems.push("page must be a whole number ≥ 1".to_string());
                None
            }
            None => {
                problems.push("page must be a number".to_string());
                None
            }
        },
    };

    match (page, coords(obj, &mut problems)) {
        (Some(page), Some([x, y, width, height])) if problems.is_empty() => {
            Ok(ZoneRect::new(page, x, y, width, height))
        }
        _ => Err(problems),
    }
}

/// `x`/`y` must be ≥ 0 and `width`/`height` > 0.
fn coords(obj: &Map<String, Value>, problems: &mut Vec<String>) -> Option<[f64; 4]> {
    let mut coord = |name: &str, positive: bool| -> Option<f64> {
        match obj.get(name) {
            None => {
                problems.push(format!("missing {}", name));
                None
            }
            Some(v) => match v.as_f64() {
                Some(n) if positive && n <= 0.0 => {
                    problems.push(format!("{} must be greater than 0", name));
                    None
                }
                Some(n) if !positive && n < 0.0 => {
                    problems.push(format!("{} must not be negative", name));
                    None
                }
                Some(n) => Some(n),
                None => {
                    problems.push(format!("{} must be a number", name));
                    None
                }
            },
        }
    };

    let x = coord("x", false);
    let y = coord("y", false);
    let width = coord("width", true);
    let height = coord("height", true);
    Some([x?, y?, width?, height?])
}

/// Parse typography; unusable values fall back to `fallback`, problems are
/// still reported.
fn parse_style(obj: &Map<String, Value>, fallback: &TextStyle) -> (TextStyle, Vec<String>) {
    let mut problems = Vec::new();
    let mut style = fallback.clone();

    if let Some(v) = field(obj, &["fontSize", "font_size"]) {
        match v.as_f64() {
            Some(n) if n > 0.0 => style.font_size = n,
            _ => problems.push("fontSize must be a number greater than 0".to_string()),
        }
    }
    if let Some(v) = obj.get("color") {
        match v.as_str().filter(|s| Rgb::from_hex(s).is_some()) {
            Some(color) => style.color = color.to_string(),
            None => problems.push("color must be a hex colour like #333333".to_string()),
        }
    }
    if let Some(v) = obj.get("align") {
        match v.as_str().and_then(Align::parse) {
            Some(align) => style.align = align,
            None => problems.push("align must be left, center or right".to_string()),
        }
    }
    (style, problems)
}

/// Text zone with repaired typography, plus any typography problems found.
pub(super) fn parse_text_placement(
    v: &Value,
    category: Category,
) -> Result<(TextPlacement, Vec<String>), Vec<String>> {
    let obj = v.as_object().cloned().unwrap_or_default();
    let (style, style_problems) = parse_style(&obj, &default_text_placement(category).style);
    match parse_zone(v) {
        Ok(zone) => Ok((TextPlacement { zone, style }, style_problems)),
        Err(mut problems) => {
            problems.extend(style_problems);
            Err(problems)
        }
    }
}

/// Variable zone with repaired typography, plus any typography problems found.
pub(super) fn parse_variable(v: &Value) -> Result<(VariablePlacement, Vec<String>), Vec<String>> {
    let obj = v.as_object().cloned().unwrap_or_default();
    let mut problems = Vec::new();

    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("text") => Some(VariableKind::Text),
        Some("image") => Some(VariableKind::Image),
        _ => {
            problems.push("type must be \"text\" or \"image\"".to_string());
            None
        }
    };
    let variable = match obj.get("variable").and_then(Value::as_str).map(str::trim) {
        Some(path) if !path.is_empty() => Some(path.to_string()),
        _ => {
            problems.push("variable must be a non-empty dotted path".to_string());
            None
        }
    };
    let (style, style_problems) = parse_style(&obj, &TextStyle::default());

    match (parse_zone(v), kind, variable) {
        (Ok(zone), Some(kind), Some(variable)) => Ok((
            VariablePlacement {
                zone,
                kind,
                variable,
                style,
            },
            style_problems,
        )),
        (zone, _, _) => {
            let mut all = zone.err().unwrap_or_default();
            all.extend(problems);
            all.extend(style_problems);
            Err(all)
        }
    }
}

/// Collapse a lenient parse into a strict check.
pub(super) fn strict<T>(parsed: Result<(T, Vec<String>), Vec<String>>) -> Result<(), Vec<String>> {
    match parsed {
        Ok((_, problems)) if problems.is_empty() => Ok(()),
        Ok((_, problems)) => Err(problems),
        Err(problems) => Err(problems),
    }
}

fn parse_bucket(v: &Value) -> TrendTextBucket {
    let mut bucket = TrendTextBucket::default();
    let Some(obj) = v.as_object() else {
        return bucket;
    };
    for direction in Direction::ALL {
        let template = direction
            .keys()
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        bucket.set(direction, template);
    }
    bucket
}

fn check_bucket(v: &Value) -> Result<(), Vec<String>> {
    let Some(obj) = v.as_object() else {
        return Err(vec!["templates must be an object keyed by trend".to_string()]);
    };
    let problems: Vec<String> = Direction::ALL
        .iter()
        .filter_map(|d| {
            let v = d.keys().iter().find_map(|k| obj.get(*k))?;
            (!v.is_string() && !v.is_null()).then(|| format!("{} must be a string", d.key()))
        })
        .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Report every problem in an `{ current, previous }` OCR entry.
fn check_ocr_zone(v: &Value) -> Result<(), Vec<String>> {
    let Some(obj) = v.as_object() else {
        return Err(vec!["OCR zone must be an object with current and previous".to_string()]);
    };
    let mut problems = Vec::new();
    for side in ["current", "previous"] {
        let Some(rect) = obj.get(side).and_then(Value::as_object) else {
            problems.push(format!("{}: missing or not an object", side));
            continue;
        };
        let mut found = Vec::new();
        if let Some(page) = rect.get("page").filter(|p| !p.is_null()) {
            let whole = page.as_u64().is_some_and(|n| n >= 1 && n <= u64::from(u32::MAX));
            if !whole {
                found.push("page must be a whole number ≥ 1".to_string());
            }
        }
        coords(rect, &mut found);
        problems.extend(found.into_iter().map(|p| format!("{}: {}", side, p)));
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

pub(super) fn ocr_zone_is_well_formed(zone: &OcrZone) -> bool {
    [zone.current, zone.previous].iter().all(|r| {
        r.x >= 0.0 && r.y >= 0.0 && r.width > 0.0 && r.height > 0.0 && r.page != Some(0)
    })
}

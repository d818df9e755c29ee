//! Variable resolution: dotted path + report data → display string or image URL.
//!
//! ## Paths
//!
//! | Path | Text | Image |
//! |------|------|-------|
//! | `client.name`, `client.company`, `client.id` | ✓ | |
//! | `client.logo` / `client.logo_url` | | ✓ |
//! | `period`, `period.label`, `period.month`, `period.month_name`, `period.year` | ✓ | |
//! | `kpis.<cat>.current`, `.previous`, `.difference`, `.percentage`, `.evolution`, `.direction`, `.label`, `.analysis` | ✓ | |
//! | `kpis.<cat>.screenshot`, `screenshots.<cat>` | | ✓ |
//! | `analysis.<cat>` | ✓ | |
//!
//! `None` means "nothing to draw": the caller skips the zone.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::evolution::compute_evolution;
use crate::format::{format_evolution, format_number, format_percentage};
use crate::report::ReportData;

/// What the caller is going to draw with the resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveKind {
    Text,
    Image,
}

impl From<crate::zone::VariableKind> for ResolveKind {
    fn from(kind: crate::zone::VariableKind) -> Self {
        match kind {
            crate::zone::VariableKind::Text => ResolveKind::Text,
            crate::zone::VariableKind::Image => ResolveKind::Image,
        }
    }
}

/// Resolve a dotted variable path against report data.
pub fn resolve_variable(path: &str, data: &ReportData, kind: ResolveKind) -> Option<String> {
    let segments: Vec<&str> = path.trim().split('.').map(str::trim).collect();
    let value = match kind {
        ResolveKind::Text => resolve_text(&segments, data),
        ResolveKind::Image => resolve_image(&segments, data),
    }?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn resolve_text(segments: &[&str], data: &ReportData) -> Option<String> {
    match segments {
        ["client", "name"] => Some(data.client.name.clone()),
        ["client", "company"] => data.client.company.clone(),
        ["client", "id"] => Some(data.client.id.clone()),
        ["period"] | ["period", "label"] => Some(data.period.label()),
        ["period", "month"] => Some(data.period.month.to_string()),
        ["period", "month_name"] | ["period", "monthName"] => Some(data.period.month_name()),
        ["period", "year"] => Some(data.period.year.to_string()),
        ["kpis", category, field] => {
            let category = Category::from_key(category)?;
            resolve_kpi_field(category, field, data)
        }
        ["analysis", category] => {
            let category = Category::from_key(category)?;
            data.kpi(category).map(|k| k.analysis.clone())
        }
        _ => None,
    }
}

fn resolve_kpi_field(category: Category, field: &str, data: &ReportData) -> Option<String> {
    if field == "label" {
        return Some(category.label().to_string());
    }
    let kpi = data.kpi(category)?;
    match field {
        "current" => Some(format_number(kpi.current)),
        "previous" => Some(format_number(kpi.previous)),
        "analysis" => Some(kpi.analysis.clone()),
        "difference" | "percentage" | "evolution" | "direction" => {
            let evolution = compute_evolution(kpi.current, kpi.previous);
            Some(match field {
                "difference" => crate::format::format_signed(evolution.difference),
                "percentage" => format_percentage(evolution.percentage),
                "direction" => evolution.direction.key().to_string(),
                // previous = 0 has no meaningful ratio: show 0 %
                _ if kpi.previous == 0.0 => format_evolution(evolution.difference, 0.0),
                _ => format_evolution(evolution.difference, evolution.signed_percentage),
            })
        }
        _ => None,
    }
}

fn resolve_image(segments: &[&str], data: &ReportData) -> Option<String> {
    match segments {
        ["client", "logo"] | ["client", "logo_url"] | ["client", "logoUrl"] => {
            data.logo_url().map(str::to_string)
        }
        ["screenshots", category] | ["kpis", category, "screenshot"] => {
            let category = Category::from_key(category)?;
            data.screenshot(category).map(str::to_string)
        }
        _ => None,
    }
}

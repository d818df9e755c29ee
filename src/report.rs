//! Report data record.
//!
//! Built fresh by the caller for every report: who the report is for, which
//! month it covers, and the KPI values and screenshots per category. The
//! compositor only reads it.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::category::Category;

const MONTHS: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, alias = "logoUrl", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Reporting month. `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// The month before the current local date (reports cover a closed month).
    pub fn previous_month() -> Self {
        let today = Local::now().date_naive();
        if today.month() == 1 {
            Self::new(12, today.year() - 1)
        } else {
            Self::new(today.month() - 1, today.year())
        }
    }

    /// French month name, or the raw number when out of range.
    pub fn month_name(&self) -> String {
        match self.month {
            1..=12 => MONTHS[(self.month - 1) as usize].to_string(),
            n => n.to_string(),
        }
    }

    /// Display label, e.g. "Mars 2025".
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::previous_month()
    }
}

/// One KPI: this month's value, the previous value and the analysis prose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub current: f64,
    pub previous: f64,
    #[serde(default)]
    pub analysis: String,
}

impl Kpi {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            analysis: String::new(),
        }
    }
}

/// Everything a report needs besides the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub client: Client,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub kpis: BTreeMap<Category, Kpi>,
    /// Screenshot image URL per category.
    #[serde(default)]
    pub screenshots: BTreeMap<Category, String>,
}

impl ReportData {
    pub fn kpi(&self, category: Category) -> Option<&Kpi> {
        self.kpis.get(&category)
    }

    /// Screenshot URL for a category, when non-blank.
    pub fn screenshot(&self, category: Category) -> Option<&str> {
        self.screenshots
            .get(&category)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Client logo URL, when non-blank.
    pub fn logo_url(&self) -> Option<&str> {
        self.client
            .logo_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Base name for the generated file, e.g. `rapport-boulangerie-martin-2025-03`.
    pub fn file_stem(&self) -> String {
        let mut slug = String::new();
        let mut last_dash = false;
        for ch in self.client.name.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
                last_dash = false;
            } else if !last_dash && !slug.is_empty() {
                slug.push('-');
                last_dash = true;
            }
        }
        let slug = slug.trim_matches('-');
        let slug = if slug.is_empty() { "client" } else { slug };
        format!(
            "rapport-{}-{}-{:02}",
            slug, self.period.year, self.period.month
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_label() {
        assert_eq!(Period::new(3, 2025).label(), "Mars 2025");
        assert_eq!(Period::new(8, 2024).label(), "Août 2024");
        assert_eq!(Period::new(13, 2024).label(), "13 2024");
    }

    #[test]
    fn test_previous_month_is_in_range() {
        let p = Period::previous_month();
        assert!((1..=12).contains(&p.month));
    }

    #[test]
    fn test_deserialize_with_french_keys() {
        let json = r#"{
            "client": {"id": "c1", "name": "Boulangerie Martin", "logoUrl": "https://x/logo.png"},
            "period": {"month": 3, "year": 2025},
            "kpis": {"appels": {"current": 120, "previous": 100}},
            "screenshots": {"appels": "https://x/calls.png", "vues": "  "}
        }"#;
        let data: ReportData = serde_json::from_str(json).unwrap();
        assert_eq!(data.kpi(Category::Calls), Some(&Kpi::new(120.0, 100.0)));
        assert_eq!(data.screenshot(Category::Calls), Some("https://x/calls.png"));
        assert_eq!(data.screenshot(Category::Views), None);
        assert_eq!(data.logo_url(), Some("https://x/logo.png"));
    }

    #[test]
    fn test_file_stem() {
        let data = ReportData {
            client: Client {
                name: "Boulangerie  Martin & Fils".into(),
                ..Default::default()
            },
            period: Period::new(3, 2025),
            ..Default::default()
        };
        assert_eq!(data.file_stem(), "rapport-boulangerie-martin-fils-2025-03");
    }
}

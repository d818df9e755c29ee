//! KPI categories.
//!
//! The report covers a closed set of four KPI groupings. Each one owns a
//! screenshot zone, a text zone and a trend template bucket in the template
//! configuration. Keys are English; the French keys used by older stored
//! configurations are accepted on input.

use serde::{Deserialize, Serialize};

/// A KPI grouping shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Phone calls from the business listing.
    #[serde(alias = "appels")]
    Calls,
    /// Clicks through to the website.
    #[serde(alias = "clics_web", alias = "webClicks", alias = "clicsWeb")]
    WebClicks,
    /// Driving direction requests.
    #[serde(alias = "itineraires", alias = "itinéraires")]
    Directions,
    /// Listing views.
    #[serde(alias = "vues")]
    Views,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 4] = [
        Category::Calls,
        Category::WebClicks,
        Category::Directions,
        Category::Views,
    ];

    /// Canonical key (as serialized).
    pub fn key(self) -> &'static str {
        match self {
            Category::Calls => "calls",
            Category::WebClicks => "web_clicks",
            Category::Directions => "directions",
            Category::Views => "views",
        }
    }

    /// Every key accepted for this category, canonical first.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Category::Calls => &["calls", "appels"],
            Category::WebClicks => &["web_clicks", "clics_web", "webClicks", "clicsWeb"],
            Category::Directions => &["directions", "itineraires", "itinéraires"],
            Category::Views => &["views", "vues"],
        }
    }

    /// Parse any accepted key.
    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.keys().contains(&key))
    }

    /// Display label used in generated prose and headings.
    pub fn label(self) -> &'static str {
        match self {
            Category::Calls => "Appels",
            Category::WebClicks => "Clics vers le site web",
            Category::Directions => "Demandes d'itinéraire",
            Category::Views => "Vues de la fiche",
        }
    }

    /// Background page the category's zones sit on in the default layout.
    pub fn default_page(self) -> u32 {
        match self {
            Category::Calls => 2,
            Category::WebClicks => 3,
            Category::Directions => 4,
            Category::Views => 5,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

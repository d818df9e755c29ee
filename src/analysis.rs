//! # Text Template Engine
//!
//! Picks the analysis prose for a KPI category.
//!
//! 1. A non-empty operator override always wins, verbatim.
//! 2. Without templates, a built-in French phrase is generated.
//! 3. Otherwise the template of the KPI's trend bucket is used, falling back
//!    `positive → positive_moderate → stable` and
//!    `negative → negative_moderate → stable`. An empty `stable` ends the
//!    chain and the built-in phrase is used.
//! 4. `{{placeholder}}` tokens are replaced literally (global,
//!    case-sensitive). Unknown tokens stay as they are.
//!
//! ## Placeholders
//!
//! | Token | Example |
//! |-------|---------|
//! | `{{current}}` | `1 200` |
//! | `{{previous}}` | `1 000` |
//! | `{{difference}}` | `+200` |
//! | `{{percentage}}` | `+20.0` |
//! | `{{percentage_abs}}` | `20.0` |
//! | `{{period}}` | `Mars 2025` |
//! | `{{client_name}}` | `Boulangerie Martin` |
//! | `{{category}}` | `Appels` |

use std::collections::BTreeMap;

use crate::category::Category;
use crate::config::TrendTextBucket;
use crate::evolution::{Direction, Evolution, compute_evolution};
use crate::format::{format_number, format_percentage, format_percentage_signed, format_signed};
use crate::report::ReportData;

/// Phrasing used by the built-in generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseStyle {
    /// One sentence per trend bucket.
    Detailed,
    /// Good news / needs attention.
    Binary,
}

/// Analysis text for one category.
pub fn generate_analysis_text(
    category: Category,
    data: &ReportData,
    templates: Option<&TrendTextBucket>,
    custom_analysis: Option<&str>,
) -> String {
    if let Some(custom) = custom_analysis.filter(|s| !s.trim().is_empty()) {
        return custom.to_string();
    }

    let Some(kpi) = data.kpi(category) else {
        return format!(
            "Aucune donnée disponible pour « {} » sur {}.",
            category.label().to_lowercase(),
            data.period.label()
        );
    };
    let evolution = compute_evolution(kpi.current, kpi.previous);

    match templates.and_then(|t| select_template(t, evolution.direction)) {
        Some(template) => interpolate(template, &placeholders(category, data, &evolution)),
        None => builtin_phrase(category, kpi.current, kpi.previous, &evolution, PhraseStyle::Detailed),
    }
}

/// Analysis text for every category present in the data, each KPI's own
/// `analysis` acting as the override.
pub fn generate_all_analysis_texts(
    data: &ReportData,
    templates_by_category: Option<&BTreeMap<Category, TrendTextBucket>>,
) -> BTreeMap<Category, String> {
    data.kpis
        .iter()
        .map(|(category, kpi)| {
            let templates = templates_by_category.and_then(|t| t.get(category));
            let text = generate_analysis_text(*category, data, templates, Some(&kpi.analysis));
            (*category, text)
        })
        .collect()
}

/// A copy of the data with every KPI's `analysis` filled in.
pub fn with_generated_analyses(
    data: &ReportData,
    templates_by_category: Option<&BTreeMap<Category, TrendTextBucket>>,
) -> ReportData {
    let texts = generate_all_analysis_texts(data, templates_by_category);
    let mut out = data.clone();
    for (category, text) in texts {
        if let Some(kpi) = out.kpis.get_mut(&category) {
            kpi.analysis = text;
        }
    }
    out
}

/// Walk the fallback chain from `direction` until a template has content.
pub fn select_template(templates: &TrendTextBucket, direction: Direction) -> Option<&str> {
    let mut current = Some(direction);
    while let Some(d) = current {
        if let Some(template) = templates.get(d) {
            return Some(template);
        }
        current = d.fallback();
    }
    None
}

/// Placeholder values for one category.
pub fn placeholders(
    category: Category,
    data: &ReportData,
    evolution: &Evolution,
) -> Vec<(&'static str, String)> {
    let (current, previous) = data
        .kpi(category)
        .map(|k| (k.current, k.previous))
        .unwrap_or_default();
    vec![
        ("current", format_number(current)),
        ("previous", format_number(previous)),
        ("difference", format_signed(evolution.difference)),
        ("percentage", format_percentage_signed(evolution.signed_percentage)),
        ("percentage_abs", format_percentage(evolution.percentage)),
        ("period", data.period.label()),
        ("client_name", data.client.name.clone()),
        ("category", category.label().to_string()),
    ]
}

/// Replace every `{{name}}` with its value in one scan of the template.
/// Substituted values are never re-scanned; unknown tokens stay as written.
pub fn interpolate(template: &str, values: &[(&str, String)]) -> String {
    let lookup = |name: &str| values.iter().find(|(n, _)| *n == name).map(|(_, v)| v);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let token = after
            .find("}}")
            .and_then(|end| lookup(&after[..end]).map(|value| (value, &after[end + 2..])));
        match token {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Built-in prose when no template applies.
pub fn builtin_phrase(
    category: Category,
    current: f64,
    previous: f64,
    evolution: &Evolution,
    style: PhraseStyle,
) -> String {
    let label = category.label().to_lowercase();
    let current = format_number(current);
    let previous = format_number(previous);
    let pct = format_percentage(evolution.percentage);

    match style {
        PhraseStyle::Binary if evolution.direction.is_favorable() => format!(
            "Bonne nouvelle : les {} atteignent {} ce mois-ci (contre {} le mois précédent).",
            label, current, previous
        ),
        PhraseStyle::Binary => format!(
            "Point d'attention : les {} reculent à {} ce mois-ci (contre {} le mois précédent).",
            label, current, previous
        ),
        PhraseStyle::Detailed => match evolution.direction {
            Direction::Positive => format!(
                "Excellente progression des {} : {} ce mois-ci contre {} le mois précédent, soit une hausse de {} %. Votre visibilité locale se renforce nettement.",
                label, current, previous, pct
            ),
            Direction::PositiveModerate => format!(
                "Les {} progressent légèrement : {} ce mois-ci contre {} le mois précédent (+{} %). La tendance reste favorable.",
                label, current, previous, pct
            ),
            Direction::Stable => format!(
                "Les {} restent stables avec {} ce mois-ci contre {} le mois précédent. Votre présence en ligne se maintient.",
                label, current, previous
            ),
            Direction::NegativeModerate => format!(
                "Légère baisse des {} : {} ce mois-ci contre {} le mois précédent (-{} %). Une variation à surveiller le mois prochain.",
                label, current, previous, pct
            ),
            Direction::Negative => format!(
                "Baisse marquée des {} : {} ce mois-ci contre {} le mois précédent (-{} %). Des actions sont recommandées pour relancer la visibilité.",
                label, current, previous, pct
            ),
        },
    }
}

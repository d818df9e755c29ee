//! Analysis text and evolution handlers.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::analysis::generate_all_analysis_texts;
use crate::category::Category;
use crate::config::{TrendTextBucket, clean_template_config};
use crate::evolution::{
    Evolution, Trend3, classify_trend3, evolution_from_absolutes,
    evolution_from_percentage,
};
use crate::format::format_evolution;
use crate::report::ReportData;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub report: ReportData,
    /// Trend templates per category. Takes precedence over `config`.
    #[serde(default)]
    pub templates: Option<BTreeMap<Category, TrendTextBucket>>,
    /// A template configuration to take trend templates from.
    #[serde(default)]
    pub config: Option<Value>,
}

/// Handle POST /api/analysis - analysis text for every KPI in the report.
pub async fn generate(Json(req): Json<AnalysisRequest>) -> Json<BTreeMap<Category, String>> {
    let templates = match (req.templates, req.config) {
        (Some(templates), _) => Some(templates),
        (None, Some(raw)) => Some(clean_template_config(&raw).non_empty_templates()),
        (None, None) => None,
    };
    Json(generate_all_analysis_texts(&req.report, templates.as_ref()))
}

/// Either an absolute previous value or a percentage of change.
#[derive(Debug, Deserialize)]
pub struct EvolutionRequest {
    pub current: f64,
    #[serde(default)]
    pub previous: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EvolutionResponse {
    #[serde(flatten)]
    pub evolution: Evolution,
    pub trend: Trend3,
    pub display: String,
}

/// Handle POST /api/evolution.
pub async fn evolution(
    Json(req): Json<EvolutionRequest>,
) -> Result<Json<EvolutionResponse>, (StatusCode, String)> {
    let evolution = match (req.previous, req.percentage) {
        (Some(previous), None) => evolution_from_absolutes(req.current, previous),
        (None, Some(percentage)) => evolution_from_percentage(req.current, percentage),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Provide exactly one of `previous` or `percentage`".to_string(),
            ));
        }
    };
    let shown_pct = if req.previous == Some(0.0) {
        0.0
    } else {
        evolution.signed_percentage
    };
    Ok(Json(EvolutionResponse {
        display: format_evolution(evolution.difference, shown_pct),
        trend: classify_trend3(evolution.signed_percentage),
        evolution,
    }))
}

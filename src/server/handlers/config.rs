//! Template configuration handlers.

use axum::Json;
use serde_json::Value;

use crate::config::{TemplateConfig, ValidationReport, clean_template_config, validate_template_config};

/// Handle POST /api/config/clean - repair a partial configuration.
pub async fn clean(Json(raw): Json<Value>) -> Json<TemplateConfig> {
    Json(clean_template_config(&raw))
}

/// Handle POST /api/config/validate - report operator mistakes.
pub async fn validate(Json(raw): Json<Value>) -> Json<ValidationReport> {
    let report = validate_template_config(&raw);
    if !report.valid {
        log::debug!("[config] {} problem(s) found", report.errors.len());
    }
    Json(report)
}

//! PDF report generation handler.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::compose::generate_document;
use crate::config::clean_template_config;
use crate::error::ReleveError;
use crate::report::ReportData;

use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    pub report: ReportData,
    /// Template configuration; the default layout is used when absent or
    /// when it has no pages.
    #[serde(default)]
    pub config: Option<Value>,
}

fn status_for(err: &ReleveError) -> StatusCode {
    match err {
        ReleveError::BackgroundLoad { .. } | ReleveError::ImageLoad { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ReleveError::ConfigValidation(_) | ReleveError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle POST /api/report/pdf - compose and return the PDF.
pub async fn pdf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PdfRequest>,
) -> Result<Response, (StatusCode, String)> {
    let config = clean_template_config(req.config.as_ref().unwrap_or(&Value::Null));
    let document = generate_document(&req.report, &config, state.loader.as_ref(), &state.options)
        .await
        .map_err(|e| {
            log::error!("[report] generation failed: {}", e);
            (status_for(&e), e.to_string())
        })?;

    let disposition = format!("attachment; filename=\"{}.pdf\"", req.report.file_stem());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_failure_is_bad_gateway() {
        let err = ReleveError::BackgroundLoad {
            page: 1,
            url: "u".into(),
            reason: "r".into(),
        };
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&ReleveError::ConfigValidation(vec![])),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ReleveError::Pdf("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

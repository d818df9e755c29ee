//! # HTTP API Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image::DynamicImage;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use releve::ReleveError;
use releve::compose::{ImageLoader, LoadedImage};
use releve::server::{AppState, ServerConfig, router};

/// Every URL ending in `.png` is a 2100×2970 page; anything else fails.
struct PngOnly;

#[async_trait]
impl ImageLoader for PngOnly {
    async fn load_image(&self, url: &str) -> Result<LoadedImage, ReleveError> {
        if url.ends_with(".png") {
            Ok(LoadedImage::new(DynamicImage::new_rgb8(2100, 2970)))
        } else {
            Err(ReleveError::image(url, "HTTP 404"))
        }
    }
}

fn app() -> axum::Router {
    router(Arc::new(AppState::with_loader(
        ServerConfig::default(),
        Arc::new(PngOnly),
    )))
}

async fn post_json(uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn report() -> Value {
    json!({
        "client": { "id": "c-1", "name": "Boulangerie Martin" },
        "period": { "month": 3, "year": 2025 },
        "kpis": { "appels": { "current": 120, "previous": 100 } }
    })
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_clean_and_validate() {
    let raw = json!({
        "pages": ["https://x/p1.png"],
        "screenshotPlacements": { "calls": { "page": 3, "x": 1, "y": 1, "width": 10, "height": 10 } }
    });

    let (status, body) = post_json("/api/config/clean", raw.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let cleaned: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(cleaned["pages"], json!(["https://x/p1.png"]));
    assert_eq!(cleaned["screenshotPlacements"]["calls"]["page"], 3);

    let (status, body) = post_json("/api/config/validate", raw).await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(
        report["errors"],
        json!(["screenshot 'calls': page 3 does not exist (1 page(s) configured)"])
    );
}

#[tokio::test]
async fn test_analysis_with_templates() {
    let (status, body) = post_json(
        "/api/analysis",
        json!({
            "report": report(),
            "templates": { "calls": { "positive": "{{current}} appels ({{percentage}}%)" } }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let texts: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(texts, json!({ "calls": "120 appels (+20.0%)" }));
}

#[tokio::test]
async fn test_evolution_both_shapes() {
    let (status, body) = post_json("/api/evolution", json!({ "current": 120, "previous": 100 })).await;
    assert_eq!(status, StatusCode::OK);
    let evo: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(evo["direction"], "positive");
    assert_eq!(evo["trend"], "up");
    assert_eq!(evo["display"], "+20 (+20.0%)");

    let (_, body) = post_json("/api/evolution", json!({ "current": 110, "percentage": 10 })).await;
    let evo: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(evo["direction"], "positive_moderate");
    assert_eq!(evo["trend"], "stable");

    let (status, _) = post_json("/api/evolution", json!({ "current": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pdf_with_template() {
    let (status, body) = post_json(
        "/api/report/pdf",
        json!({ "report": report(), "config": { "pages": ["https://x/p1.png", "https://x/p2.png"] } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_pdf_default_layout() {
    let (status, body) = post_json("/api/report/pdf", json!({ "report": report() })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_pdf_background_failure_is_bad_gateway() {
    let (status, body) = post_json(
        "/api/report/pdf",
        json!({ "report": report(), "config": { "pages": ["https://x/p1.png", "https://x/p2.jpg"] } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let message = String::from_utf8(body).unwrap();
    assert!(message.contains("Template page 2"));
    assert!(message.contains("https://x/p2.jpg"));
}

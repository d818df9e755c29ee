//! # Compositor Tests
//!
//! End-to-end composition against an in-memory image loader: page count and
//! order, zone mapping through the page fit, draw order, and which load
//! failures abort a document.

use async_trait::async_trait;
use image::DynamicImage;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use releve::compose::{
    ComposeOptions, ImageLoader, LoadedImage, compose_default_document, compose_document,
    generate_document,
};
use releve::config::{PageFormat, clean_template_config};
use releve::evolution::{Direction, compute_evolution};
use releve::pdf::{DrawOp, PageLayout, Rect};
use releve::report::{Client, Kpi, Period};
use releve::{Category, ReleveError, ReportData, TemplateConfig};

/// Serves blank images of fixed sizes; anything else is a 404.
#[derive(Default)]
struct FakeLoader {
    sizes: HashMap<String, (u32, u32)>,
    slow: Vec<String>,
    requested: Mutex<Vec<String>>,
}

impl FakeLoader {
    fn with(mut self, url: &str, width: u32, height: u32) -> Self {
        self.sizes.insert(url.to_string(), (width, height));
        self
    }

    fn slow(mut self, url: &str) -> Self {
        self.slow.push(url.to_string());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageLoader for FakeLoader {
    async fn load_image(&self, url: &str) -> Result<LoadedImage, ReleveError> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.slow.iter().any(|u| u == url) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        match self.sizes.get(url) {
            Some((w, h)) => Ok(LoadedImage::new(DynamicImage::new_rgb8(*w, *h))),
            None => Err(ReleveError::image(url, "HTTP 404")),
        }
    }
}

const P1: &str = "https://cdn.example.com/p1.png";
const P2: &str = "https://cdn.example.com/p2.png";
const CALLS_SHOT: &str = "https://cdn.example.com/calls.png";
const LOGO: &str = "https://cdn.example.com/logo.png";

fn sample_report() -> ReportData {
    let mut data = ReportData {
        client: Client {
            id: "c-1".into(),
            name: "Boulangerie Martin".into(),
            company: None,
            logo_url: Some(LOGO.into()),
        },
        period: Period::new(3, 2025),
        ..Default::default()
    };
    data.kpis.insert(
        Category::Calls,
        Kpi {
            current: 120.0,
            previous: 100.0,
            analysis: "Bonne progression des appels".into(),
        },
    );
    data.screenshots.insert(Category::Calls, CALLS_SHOT.into());
    data
}

/// Two A4-shaped backgrounds (scale 0.1 mm/px), calls screenshot on page 2.
fn two_page_config() -> TemplateConfig {
    clean_template_config(&json!({
        "pages": [P1, P2],
        "logoPlacement": null,
        "screenshotPlacements": {
            "calls": { "page": 2, "x": 10, "y": 10, "width": 100, "height": 50 }
        }
    }))
}

fn a4_loader() -> FakeLoader {
    FakeLoader::default()
        .with(P1, 2100, 2970)
        .with(P2, 2100, 2970)
        .with(CALLS_SHOT, 200, 100)
        .with(LOGO, 100, 100)
}

fn image_rect(page: &PageLayout, source: &str) -> Option<Rect> {
    page.ops.iter().find_map(|op| match op {
        DrawOp::Image { source: s, rect, .. } if s == source => Some(*rect),
        _ => None,
    })
}

fn assert_rect(actual: Rect, expected: Rect) {
    let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
    assert!(
        close(actual.x, expected.x)
            && close(actual.y, expected.y)
            && close(actual.width, expected.width)
            && close(actual.height, expected.height),
        "{:?} != {:?}",
        actual,
        expected
    );
}

#[tokio::test]
async fn test_two_page_document() {
    let loader = a4_loader();
    let doc = compose_document(
        &sample_report(),
        &two_page_config(),
        &loader,
        &ComposeOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(doc.page_count(), 2);
    assert!(doc.pdf.starts_with(b"%PDF-"));

    assert_eq!(doc.pages[0].image_sources(), vec![P1]);
    assert_eq!(doc.pages[1].image_sources(), vec![P2, CALLS_SHOT]);

    // zone (10, 10, 100, 50) px at 0.1 mm/px
    let shot = image_rect(&doc.pages[1], CALLS_SHOT).unwrap();
    assert_rect(shot, Rect::new(1.0, 1.0, 10.0, 5.0));

    assert_eq!(doc.pages[1].texts(), vec!["Bonne progression des appels"]);
    assert!(doc.pages[0].texts().is_empty());
}

#[tokio::test]
async fn test_generated_analysis_fills_text_zone() {
    let loader = a4_loader();
    let mut data = sample_report();
    data.kpis.insert(Category::Calls, Kpi::new(120.0, 100.0));
    let config = clean_template_config(&json!({
        "pages": [P1, P2],
        "logoPlacement": null,
        "screenshotPlacements": {
            "calls": { "page": 2, "x": 10, "y": 10, "width": 100, "height": 50 }
        },
        "textPlacements": {
            "calls": { "page": 2, "x": 10, "y": 100, "width": 1000, "height": 200 }
        },
        "textTemplates": {
            "calls": { "positive": "{{difference}} ({{percentage}}%)" }
        }
    }));

    let evolution = compute_evolution(120.0, 100.0);
    assert_eq!(evolution.direction, Direction::Positive);

    let doc = generate_document(&data, &config, &loader, &ComposeOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages[0].texts().is_empty());
    assert_eq!(doc.pages[1].image_sources(), vec![P2, CALLS_SHOT]);
    assert_eq!(doc.pages[1].texts(), vec!["+20 (+20.0%)"]);
}

#[tokio::test]
async fn test_pages_follow_config_order() {
    let loader = a4_loader();
    let config = two_page_config().with_pages(vec![P2.into(), P1.into()]).unwrap();
    let doc = compose_document(&sample_report(), &config, &loader, &ComposeOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.pages[0].image_sources()[0], P2);
    assert_eq!(doc.pages[1].image_sources()[0], P1);
}

#[tokio::test]
async fn test_background_failure_is_fatal() {
    let loader = FakeLoader::default().with(P1, 2100, 2970);
    let err = compose_document(
        &sample_report(),
        &two_page_config(),
        &loader,
        &ComposeOptions::default(),
    )
    .await
    .unwrap_err();

    match &err {
        ReleveError::BackgroundLoad { page, url, reason } => {
            assert_eq!(*page, 2);
            assert_eq!(url, P2);
            assert_eq!(reason, "HTTP 404");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("Template page 2"));
    assert!(err.to_string().contains(P2));
}

#[tokio::test]
async fn test_background_timeout_is_fatal() {
    let loader = a4_loader().slow(P1);
    let options = ComposeOptions {
        load_timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let err = compose_document(&sample_report(), &two_page_config(), &loader, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, ReleveError::BackgroundLoad { page: 1, .. }));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_screenshot_failure_is_skipped() {
    let loader = FakeLoader::default().with(P1, 2100, 2970).with(P2, 2100, 2970);
    let doc = compose_document(
        &sample_report(),
        &two_page_config(),
        &loader,
        &ComposeOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages[1].image_sources(), vec![P2]);
    assert!(loader.requested().contains(&CALLS_SHOT.to_string()));
}

#[tokio::test]
async fn test_wide_background_letterboxes_vertically() {
    let loader = FakeLoader::default().with(P1, 2000, 1000);
    let config = clean_template_config(&json!({
        "pages": [P1],
        "logoPlacement": null,
        "variables": {
            "band": { "page": 1, "x": 0, "y": 0, "width": 2000, "height": 1000,
                      "type": "text", "variable": "client.name" }
        }
    }));
    let doc = compose_document(&sample_report(), &config, &loader, &ComposeOptions::default())
        .await
        .unwrap();

    let page = &doc.pages[0];
    let background = image_rect(page, P1).unwrap();
    assert_rect(background, Rect::new(0.0, 96.0, 210.0, 105.0));

    // Text starts at the mapped zone origin
    let run = page
        .ops
        .iter()
        .find_map(|op| match op {
            DrawOp::Text(run) => Some(run.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(run.text, "Boulangerie Martin");
    assert!((run.x - 0.0).abs() < 1e-9);
    assert!(run.baseline > 96.0 && run.baseline < 96.0 + 105.0);
}

#[tokio::test]
async fn test_tall_background_letterboxes_horizontally() {
    let loader = FakeLoader::default()
        .with(P1, 500, 1000)
        .with(CALLS_SHOT, 500, 1000);
    let config = clean_template_config(&json!({
        "pages": [P1],
        "logoPlacement": null,
        "screenshotPlacements": {
            "calls": { "page": 1, "x": 0, "y": 0, "width": 500, "height": 1000 }
        }
    }));
    let options = ComposeOptions {
        page_format: Some(PageFormat::A4_LANDSCAPE),
        ..Default::default()
    };
    let doc = compose_document(&sample_report(), &config, &loader, &options)
        .await
        .unwrap();

    let page = &doc.pages[0];
    assert_eq!((page.width_mm, page.height_mm), (297.0, 210.0));
    let background = image_rect(page, P1).unwrap();
    assert_rect(background, Rect::new(96.0, 0.0, 105.0, 210.0));
    assert_rect(image_rect(page, CALLS_SHOT).unwrap(), background);
}

#[tokio::test]
async fn test_draw_order_on_a_page() {
    let loader = a4_loader();
    let config = clean_template_config(&json!({
        "pages": [P1],
        "logoPlacement": { "page": 1, "x": 0, "y": 0, "width": 100, "height": 100 },
        "screenshotPlacements": {
            "calls": { "page": 1, "x": 0, "y": 200, "width": 200, "height": 100 }
        },
        "textPlacements": {
            "calls": { "page": 1, "x": 0, "y": 400, "width": 1000, "height": 200 }
        },
        "variables": {
            "a_period": { "page": 1, "x": 0, "y": 700, "width": 1000, "height": 100,
                          "type": "text", "variable": "period" },
            "b_missing": { "page": 1, "x": 0, "y": 900, "width": 100, "height": 100,
                           "type": "image", "variable": "screenshots.views" }
        }
    }));
    let doc = compose_document(&sample_report(), &config, &loader, &ComposeOptions::default())
        .await
        .unwrap();

    let page = &doc.pages[0];
    assert_eq!(page.image_sources(), vec![P1, LOGO, CALLS_SHOT]);
    assert_eq!(
        page.texts(),
        vec!["Mars 2025", "Bonne progression des appels"]
    );
    // Variable zones sit between the background and the category zones
    let position = |wanted: &dyn Fn(&DrawOp) -> bool| page.ops.iter().position(wanted).unwrap();
    let period = position(&|op| matches!(op, DrawOp::Text(run) if run.text == "Mars 2025"));
    let logo = position(&|op| matches!(op, DrawOp::Image { source, .. } if source == LOGO));
    let background = position(&|op| matches!(op, DrawOp::Image { source, .. } if source == P1));
    assert!(background < period && period < logo);
}

#[tokio::test]
async fn test_zone_images_fill_the_mapped_zone() {
    // A 200x100 screenshot in a square zone is stretched, not letterboxed
    let loader = a4_loader();
    let config = clean_template_config(&json!({
        "pages": [P1],
        "logoPlacement": null,
        "screenshotPlacements": {
            "calls": { "page": 1, "x": 100, "y": 100, "width": 300, "height": 300 }
        }
    }));
    let doc = compose_document(&sample_report(), &config, &loader, &ComposeOptions::default())
        .await
        .unwrap();
    let shot = image_rect(&doc.pages[0], CALLS_SHOT).unwrap();
    assert_rect(shot, Rect::new(10.0, 10.0, 30.0, 30.0));
}

#[tokio::test]
async fn test_disabled_zones_are_not_drawn() {
    // Default zones sit on pages 2-5; a one-page template only draws page 1
    let loader = a4_loader();
    let config = clean_template_config(&json!({ "pages": [P1] }));
    let doc = compose_document(&sample_report(), &config, &loader, &ComposeOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.pages[0].image_sources(), vec![P1, LOGO]);
    assert!(!loader.requested().contains(&CALLS_SHOT.to_string()));
}

#[tokio::test]
async fn test_generate_document_uses_default_layout_without_pages() {
    let mut data = sample_report();
    for category in Category::ALL {
        data.kpis.entry(category).or_insert(Kpi::new(50.0, 80.0));
        data.screenshots
            .insert(category, format!("https://cdn.example.com/{}.png", category));
    }
    let mut loader = FakeLoader::default().with(LOGO, 300, 100);
    for category in Category::ALL {
        loader = loader.with(&format!("https://cdn.example.com/{}.png", category), 1000, 1000);
    }

    let doc = generate_document(
        &data,
        &TemplateConfig::default_layout(),
        &loader,
        &ComposeOptions::default(),
    )
    .await
    .unwrap();

    assert!(doc.page_count() >= 2);
    let first = &doc.pages[0];
    assert!(matches!(first.ops[0], DrawOp::FillRect { .. }));
    assert!(first.texts().contains(&"Boulangerie Martin · Mars 2025"));
    assert!(first.image_sources().contains(&LOGO));

    let all_texts: Vec<&str> = doc.pages.iter().flat_map(|p| p.texts()).collect();
    for category in Category::ALL {
        assert!(all_texts.contains(&category.label()), "{}", category);
    }

    for page in &doc.pages {
        let bounds = Rect::new(0.0, 0.0, page.width_mm, page.height_mm);
        for op in &page.ops {
            if let DrawOp::Image { rect, .. } = op {
                assert!(bounds.contains(rect), "{:?}", rect);
            }
        }
    }
}

#[tokio::test]
async fn test_default_layout_survives_missing_assets() {
    let loader = FakeLoader::default();
    let doc = compose_default_document(&sample_report(), &loader, &ComposeOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.page_count(), 1);
    assert!(doc.pages[0].image_sources().is_empty());
    assert!(doc.pages[0].texts().contains(&"Bonne progression des appels"));
}

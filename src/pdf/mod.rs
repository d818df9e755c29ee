//! # PDF Emission
//!
//! Turns laid-out pages into PDF bytes with `pdf-writer`.
//!
//! Layout works in millimetres with a top-left origin (the same space the
//! compositor maps zones into). Emission converts to PDF points with a
//! bottom-left origin:
//!
//! ```text
//! x_pt = x_mm × 72 / 25.4
//! y_pt = (page_height_mm − y_mm − height_mm) × 72 / 25.4
//! ```
//!
//! Images are re-encoded as 8-bit RGB, Flate-compressed, with a soft mask
//! when the source has transparency. An image shared by several pages (same
//! `Arc`) is written once.

pub mod font;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::DynamicImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect as MediaBox, Ref, Str};
use serde::Serialize;

use crate::error::ReleveError;
use crate::zone::Rgb;
use font::{FontFace, MM_PER_PT, encode_winansi};

/// Rectangle in page millimetres, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.x + other.width <= self.x + self.width + EPS
            && other.y + other.height <= self.y + self.height + EPS
    }
}

/// One line of text. `x` is the left edge, `baseline` the baseline, both in mm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
    /// Points.
    pub font_size: f64,
    pub face: FontFace,
    #[serde(skip)]
    pub color: Rgb,
}

/// Something drawn on a page, in paint order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Image {
        /// Where the image came from (for logs and tests).
        source: String,
        rect: Rect,
        #[serde(skip)]
        image: Arc<DynamicImage>,
    },
    Text(TextRun),
    FillRect {
        rect: Rect,
        #[serde(skip)]
        color: Rgb,
    },
}

/// A laid-out output page.
#[derive(Debug, Clone, Serialize)]
pub struct PageLayout {
    pub width_mm: f64,
    pub height_mm: f64,
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Sources of every image on the page, in paint order.
    pub fn image_sources(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { source, .. } => Some(source.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every text line on the page, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(run) => Some(run.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn mm_to_pt(mm: f64) -> f32 {
    (mm / MM_PER_PT) as f32
}

/// Sequential object id allocator.
struct RefAlloc(i32);

impl RefAlloc {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>, ReleveError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Write an image (and its soft mask) and return the image object id.
fn write_image(pdf: &mut Pdf, refs: &mut RefAlloc, image: &DynamicImage) -> Result<Ref, ReleveError> {
    let image_ref = refs.next();
    let width = image.width() as i32;
    let height = image.height() as i32;

    let mask_ref = if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_ref = refs.next();
        let data = compress(&alpha)?;
        let mut mask = pdf.image_xobject(mask_ref, &data);
        mask.filter(Filter::FlateDecode);
        mask.width(width);
        mask.height(height);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        mask.finish();
        Some(mask_ref)
    } else {
        None
    };

    let data = compress(image.to_rgb8().as_raw())?;
    let mut xobject = pdf.image_xobject(image_ref, &data);
    xobject.filter(Filter::FlateDecode);
    xobject.width(width);
    xobject.height(height);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    if let Some(mask_ref) = mask_ref {
        xobject.s_mask(mask_ref);
    }
    xobject.finish();
    Ok(image_ref)
}

/// Emit the pages as a PDF document.
pub fn emit_document(pages: &[PageLayout]) -> Result<Vec<u8>, ReleveError> {
    if pages.is_empty() {
        return Err(ReleveError::Pdf("document has no pages".to_string()));
    }

    let mut pdf = Pdf::new();
    let mut refs = RefAlloc(0);

    let catalog_ref = refs.next();
    let page_tree_ref = refs.next();
    let regular_ref = refs.next();
    let bold_ref = refs.next();
    pdf.catalog(catalog_ref).pages(page_tree_ref);
    pdf.type1_font(regular_ref)
        .base_font(Name(FontFace::Regular.base_font()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_ref)
        .base_font(Name(FontFace::Bold.base_font()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    // Images shared between pages are written once
    let mut written: HashMap<*const DynamicImage, Ref> = HashMap::new();
    let mut page_refs = Vec::with_capacity(pages.len());

    for layout in pages {
        let page_ref = refs.next();
        let content_ref = refs.next();
        page_refs.push(page_ref);

        let page_height = layout.height_mm;
        let mut content = Content::new();
        let mut page_images: Vec<(String, Ref)> = Vec::new();

        for op in &layout.ops {
            match op {
                DrawOp::Image { rect, image, .. } => {
                    let key = Arc::as_ptr(image);
                    let image_ref = match written.get(&key) {
                        Some(r) => *r,
                        None => {
                            let r = write_image(&mut pdf, &mut refs, image)?;
                            written.insert(key, r);
                            r
                        }
                    };
                    let name = format!("Im{}", image_ref.get());
                    content.save_state();
                    content.transform([
                        mm_to_pt(rect.width),
                        0.0,
                        0.0,
                        mm_to_pt(rect.height),
                        mm_to_pt(rect.x),
                        mm_to_pt(page_height - rect.y - rect.height),
                    ]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                    if !page_images.iter().any(|(n, _)| *n == name) {
                        page_images.push((name, image_ref));
                    }
                }
                DrawOp::Text(run) => {
                    let [r, g, b] = run.color.to_unit();
                    let bytes = encode_winansi(&run.text);
                    content.begin_text();
                    content.set_font(Name(run.face.resource_name()), run.font_size as f32);
                    content.set_fill_rgb(r, g, b);
                    content.set_text_matrix([
                        1.0,
                        0.0,
                        0.0,
                        1.0,
                        mm_to_pt(run.x),
                        mm_to_pt(page_height - run.baseline),
                    ]);
                    content.show(Str(&bytes));
                    content.end_text();
                }
                DrawOp::FillRect { rect, color } => {
                    let [r, g, b] = color.to_unit();
                    content.save_state();
                    content.set_fill_rgb(r, g, b);
                    content.rect(
                        mm_to_pt(rect.x),
                        mm_to_pt(page_height - rect.y - rect.height),
                        mm_to_pt(rect.width),
                        mm_to_pt(rect.height),
                    );
                    content.fill_nonzero();
                    content.restore_state();
                }
            }
        }

        let mut page = pdf.page(page_ref);
        page.media_box(MediaBox::new(
            0.0,
            0.0,
            mm_to_pt(layout.width_mm),
            mm_to_pt(layout.height_mm),
        ));
        page.parent(page_tree_ref);
        page.contents(content_ref);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            fonts.pair(Name(FontFace::Regular.resource_name()), regular_ref);
            fonts.pair(Name(FontFace::Bold.resource_name()), bold_ref);
        }
        if !page_images.is_empty() {
            let mut x_objects = resources.x_objects();
            for (name, image_ref) in &page_images {
                x_objects.pair(Name(name.as_bytes()), *image_ref);
            }
        }
        resources.finish();
        page.finish();

        pdf.stream(content_ref, &content.finish());
    }

    let count = page_refs.len() as i32;
    pdf.pages(page_tree_ref).kids(page_refs).count(count);

    Ok(pdf.finish())
}

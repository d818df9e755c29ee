//! Page fit: placing a background image on an output page.
//!
//! The background keeps its aspect ratio and is centred on the page along the
//! axis it does not fill. Zones are given in the background's pixel space, so
//! the same scale and offset map them onto the page.

use crate::config::PageFormat;
use crate::pdf::Rect;
use crate::zone::ZoneRect;

/// How a background image of a given size sits on an output page (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFit {
    pub final_width: f64,
    pub final_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl PageFit {
    /// Fit an `image_width × image_height` pixel image onto `page`.
    pub fn new(image_width: u32, image_height: u32, page: PageFormat) -> Self {
        let image_width = image_width.max(1) as f64;
        let image_height = image_height.max(1) as f64;
        let image_aspect = image_width / image_height;

        let (final_width, final_height) = if image_aspect > page.aspect_ratio() {
            (page.width_mm, page.width_mm / image_aspect)
        } else {
            (page.height_mm * image_aspect, page.height_mm)
        };

        Self {
            final_width,
            final_height,
            offset_x: (page.width_mm - final_width) / 2.0,
            offset_y: (page.height_mm - final_height) / 2.0,
            scale_x: final_width / image_width,
            scale_y: final_height / image_height,
        }
    }

    /// Where the background itself is drawn.
    pub fn image_rect(&self) -> Rect {
        Rect::new(
            self.offset_x,
            self.offset_y,
            self.final_width,
            self.final_height,
        )
    }

    /// Map a zone from background pixels to page millimetres.
    pub fn map_zone(&self, zone: &ZoneRect) -> Rect {
        Rect::new(
            self.offset_x + zone.x * self.scale_x,
            self.offset_y + zone.y * self.scale_y,
            zone.width * self.scale_x,
            zone.height * self.scale_y,
        )
    }
}

/// Largest rect with the image's aspect ratio that fits in `area`, centred.
pub fn contain(image_width: u32, image_height: u32, area: Rect) -> Rect {
    let image_aspect = image_width.max(1) as f64 / image_height.max(1) as f64;
    let area_aspect = area.width / area.height;
    let (width, height) = if image_aspect > area_aspect {
        (area.width, area.width / image_aspect)
    } else {
        (area.height * image_aspect, area.height)
    };
    Rect::new(
        area.x + (area.width - width) / 2.0,
        area.y + (area.height - height) / 2.0,
        width,
        height,
    )
}

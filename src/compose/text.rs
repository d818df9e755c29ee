//! Text layout inside a zone: wrapping and alignment.
//!
//! Lines advance by `font_size × 0.35` mm. The first baseline sits one
//! advance below the top of the zone. Text is not clipped vertically.

use crate::pdf::font::{FontFace, text_width_mm};
use crate::pdf::{Rect, TextRun};
use crate::zone::{Align, Rgb};

pub const LINE_ADVANCE_FACTOR: f64 = 0.35;

/// Baseline-to-baseline distance in mm.
pub fn line_advance(font_size: f64) -> f64 {
    font_size * LINE_ADVANCE_FACTOR
}

/// Split on `\n`, drop blank lines, then greedy-wrap each line to `max_width`.
///
/// A word wider than `max_width` is broken between characters.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64, face: FontFace) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        wrap_line(line, max_width, font_size, face, &mut out);
    }
    out
}

fn wrap_line(line: &str, max_width: f64, font_size: f64, face: FontFace, out: &mut Vec<String>) {
    let fits = |s: &str| text_width_mm(s, font_size, face) <= max_width;
    let mut current = String::new();

    // No-break spaces (U+00A0, U+202F) stay inside words
    for word in line.split([' ', '\t']).filter(|w| !w.is_empty()) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_string();
        } else {
            // Hard break
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && !fits(&next) {
                    out.push(std::mem::take(&mut current));
                    current.push(ch);
                } else {
                    current = next;
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Position already-wrapped lines in `area`.
pub fn layout_lines(
    lines: &[String],
    area: Rect,
    font_size: f64,
    face: FontFace,
    align: Align,
    color: Rgb,
) -> Vec<TextRun> {
    let advance = line_advance(font_size);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let width = text_width_mm(line, font_size, face);
            let x = match align {
                Align::Left => area.x,
                Align::Center => area.x + (area.width - width) / 2.0,
                Align::Right => area.x + area.width - width,
            };
            TextRun {
                text: line.clone(),
                x,
                baseline: area.y + advance * (i as f64 + 1.0),
                font_size,
                face,
                color,
            }
        })
        .collect()
}

/// Wrap and position `text` in `area`.
pub fn layout_text(
    text: &str,
    area: Rect,
    font_size: f64,
    face: FontFace,
    align: Align,
    color: Rgb,
) -> Vec<TextRun> {
    let lines = wrap_text(text, area.width, font_size, face);
    layout_lines(&lines, area, font_size, face, align, color)
}

/// Height taken by `line_count` lines.
pub fn block_height(line_count: usize, font_size: f64) -> f64 {
    line_count as f64 * line_advance(font_size)
}

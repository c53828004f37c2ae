//! # Text Rasterization
//!
//! Styled text blocks are printed as raster images so that any script the
//! font covers (Hangul included) prints the same on every printer, regardless
//! of its ROM code pages.
//!
//! The compiler only depends on the [`Rasterizer`] trait. Two implementations
//! ship with the crate:
//!
//! | Rasterizer | Module | Glyphs |
//! |------------|--------|--------|
//! | [`TtfRasterizer`] | [`ttf`] | Any TrueType/OpenType font file |
//! | [`BitmapFontRasterizer`] | [`bitmap_font`] | Built-in Spleen bitmap font (Latin) |
//!
//! ## Canvas Layout
//!
//! Both lay text out the same way on a canvas as wide as the printable area:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐  ─┐
//! │                                              │   │ TEXT_MARGIN
//! │ ←20→ Left line                               │  ─┘
//! │             Centered line                    │
//! │                              Right line ←20→ │
//! │                                              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Pixels are thresholded at mid-gray, so the output bitmap is already binary.

pub mod bitmap;
pub mod bitmap_font;
pub mod ttf;

pub use bitmap::Bitmap;
pub use bitmap_font::BitmapFontRasterizer;
pub use ttf::TtfRasterizer;

use std::ops::RangeInclusive;

use crate::error::{BluberryError, Result};
use crate::protocol::text::Alignment;

/// Blank space around rendered text, in pixels.
pub const TEXT_MARGIN: u32 = 20;

/// Point sizes the built-in rasterizers accept.
pub const POINT_SIZES: RangeInclusive<f32> = 1.0..=255.0;

/// Tallest canvas a rasterizer will allocate, in pixel rows.
pub const MAX_CANVAS_HEIGHT: u32 = 65_535;

/// Turns styled text into a binary bitmap no wider than the printable area.
///
/// `text` may contain several lines separated by `\n`. Implementations must
/// be deterministic: the same arguments always yield the same bitmap.
///
/// Closures with the same signature implement the trait, which keeps test
/// doubles short:
///
/// ```
/// use bluberry::render::{Bitmap, Rasterizer};
/// use bluberry::protocol::text::Alignment;
///
/// let stub = |_: &str, _: f32, _: bool, _: Alignment| -> bluberry::Result<Bitmap> {
///     Ok(Bitmap::new(8, 1))
/// };
/// assert_eq!(stub.render("x", 16.0, false, Alignment::Left).unwrap().width(), 8);
/// ```
pub trait Rasterizer {
    fn render(&self, text: &str, point_size: f32, bold: bool, align: Alignment) -> Result<Bitmap>;
}

impl<F> Rasterizer for F
where
    F: Fn(&str, f32, bool, Alignment) -> Result<Bitmap>,
{
    fn render(&self, text: &str, point_size: f32, bold: bool, align: Alignment) -> Result<Bitmap> {
        self(text, point_size, bold, align)
    }
}

pub(crate) fn check_point_size(point_size: f32) -> Result<()> {
    if POINT_SIZES.contains(&point_size) {
        Ok(())
    } else {
        Err(BluberryError::Font(format!(
            "Point size {} outside {}..={}",
            point_size,
            POINT_SIZES.start(),
            POINT_SIZES.end()
        )))
    }
}

/// Height of a canvas holding `lines` lines of `line_height` rows plus margins.
pub(crate) fn canvas_height(line_height: u32, lines: usize) -> Result<u32> {
    u32::try_from(lines)
        .ok()
        .and_then(|n| line_height.checked_mul(n))
        .and_then(|rows| rows.checked_add(TEXT_MARGIN * 2))
        .filter(|&h| h <= MAX_CANVAS_HEIGHT)
        .ok_or_else(|| {
            BluberryError::Font(format!(
                "{} lines of {} rows exceed the {} row canvas limit",
                lines, line_height, MAX_CANVAS_HEIGHT
            ))
        })
}

/// Left edge of a line `line_width` pixels wide on a `canvas_width` canvas.
///
/// Lines wider than the canvas start at 0 and are clipped on the right.
pub(crate) fn line_x(canvas_width: u32, line_width: u32, align: Alignment) -> i64 {
    let canvas = canvas_width as i64;
    let line = line_width as i64;
    let margin = TEXT_MARGIN as i64;
    let x = match align {
        Alignment::Left => margin,
        Alignment::Center => (canvas - line) / 2,
        Alignment::Right => canvas - line - margin,
    };
    x.max(0)
}

//! TrueType rasterizer.
//!
//! Renders text with ab_glyph into an anti-aliased coverage buffer the width
//! of the printable area, then thresholds it into a [`Bitmap`]. Any script
//! the loaded font covers can be printed, which is how Hangul receipts are
//! produced on printers with no Korean code page.
//!
//! Point size is used directly as the pixel height of the font's em box.

use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use tracing::debug;

use super::{Bitmap, Rasterizer, TEXT_MARGIN, canvas_height, check_point_size, line_x};
use crate::error::{BluberryError, Result};
use crate::protocol::text::Alignment;

/// Rasterizer backed by a TrueType/OpenType font.
#[derive(Clone)]
pub struct TtfRasterizer {
    regular: FontArc,
    bold: Option<FontArc>,
    width: u32,
}

impl TtfRasterizer {
    /// Load a font file. `width` is the printable width in pixels.
    pub fn from_file(path: &Path, width: u32) -> Result<Self> {
        let font = load_font(path)?;
        Ok(Self::new(font, width))
    }

    /// Use an already loaded font.
    pub fn new(regular: FontArc, width: u32) -> Self {
        Self {
            regular,
            bold: None,
            width,
        }
    }

    /// Parse font bytes (e.g. from `include_bytes!`).
    pub fn from_bytes(bytes: Vec<u8>, width: u32) -> Result<Self> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| BluberryError::Font(format!("Invalid font data: {}", e)))?;
        Ok(Self::new(font, width))
    }

    /// Use a dedicated bold face instead of synthetic emboldening.
    pub fn with_bold_file(mut self, path: &Path) -> Result<Self> {
        self.bold = Some(load_font(path)?);
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn face(&self, bold: bool) -> (&FontArc, bool) {
        match (&self.bold, bold) {
            (Some(face), true) => (face, false),
            (None, true) => (&self.regular, true),
            (_, false) => (&self.regular, false),
        }
    }
}

fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path).map_err(|e| {
        BluberryError::Font(format!("Failed to read font {}: {}", path.display(), e))
    })?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| BluberryError::Font(format!("Invalid font {}: {}", path.display(), e)))
}

/// Glyph ids and caret positions for one line, plus its advance width.
fn layout_line<F: Font>(font: &F, scale: PxScale, line: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(line.len());
    let mut caret_x = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, id);
        }
        glyphs.push((id, caret_x));
        caret_x += scaled.h_advance(id);
        previous = Some(id);
    }

    (glyphs, caret_x)
}

impl Rasterizer for TtfRasterizer {
    fn render(&self, text: &str, point_size: f32, bold: bool, align: Alignment) -> Result<Bitmap> {
        check_point_size(point_size)?;

        let (font, synthetic_bold) = self.face(bold);
        let scale = PxScale::from(point_size);
        let scaled = font.as_scaled(scale);

        let ascent = scaled.ascent();
        let line_height = (ascent - scaled.descent() + scaled.line_gap()).ceil().max(1.0) as u32;
        let lines: Vec<&str> = text.split('\n').collect();

        let width = self.width;
        let height = canvas_height(line_height, lines.len())?;
        let mut coverage = vec![0.0f32; width as usize * height as usize];

        // Synthetic bold strikes every glyph again, shifted right.
        let strikes: u32 = if synthetic_bold {
            1 + (point_size / 24.0).ceil().max(1.0) as u32
        } else {
            1
        };

        for (i, line) in lines.iter().enumerate() {
            let (glyphs, advance) = layout_line(font, scale, line);
            let line_width = (advance.ceil() as u32).saturating_add(strikes - 1);
            let x0 = line_x(width, line_width, align) as f32;
            let baseline = TEXT_MARGIN as f32 + ascent + (i as u32 * line_height) as f32;

            for &(id, glyph_x) in &glyphs {
                for strike in 0..strikes {
                    let glyph = id.with_scale_and_position(
                        scale,
                        point(x0 + glyph_x + strike as f32, baseline),
                    );
                    let Some(outlined) = font.outline_glyph(glyph) else {
                        continue;
                    };
                    let bounds = outlined.px_bounds();
                    outlined.draw(|px, py, c| {
                        let x = px as i64 + bounds.min.x as i64;
                        let y = py as i64 + bounds.min.y as i64;
                        if x >= 0 && x < width as i64 && y >= 0 && y < height as i64 {
                            let idx = y as usize * width as usize + x as usize;
                            coverage[idx] = (coverage[idx] + c).min(1.0);
                        }
                    });
                }
            }
        }

        debug!(
            lines = lines.len(),
            point_size,
            bold,
            ?align,
            height,
            "rasterized text block"
        );
        Ok(Bitmap::from_coverage(width, height, &coverage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes() {
        assert!(matches!(
            TtfRasterizer::from_bytes(vec![0, 1, 2, 3], 576),
            Err(BluberryError::Font(_))
        ));
    }

    #[test]
    fn test_missing_font_file() {
        let err = TtfRasterizer::from_file(Path::new("/nonexistent/font.ttf"), 576)
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }
}

//! Built-in bitmap font rasterizer.
//!
//! Uses the Spleen fonts bundled with `spleen-font`, so no font file is
//! needed. Spleen covers Latin only; characters it lacks are drawn as an
//! outlined box.
//!
//! ## Size Selection
//!
//! | Point size | Base font | Scale |
//! |------------|-----------|-------|
//! | ≤ 14 | 6×12 | 1 |
//! | 15-20 | 8×16 | 1 |
//! | > 20 | 12×24 | round(size / 24) |

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use super::{Bitmap, Rasterizer, TEXT_MARGIN, canvas_height, check_point_size, line_x};
use crate::error::{BluberryError, Result};
use crate::protocol::text::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BaseFont {
    data: &'static [u8],
    width: u32,
    height: u32,
}

const SPLEEN_6X12: BaseFont = BaseFont {
    data: FONT_6X12,
    width: 6,
    height: 12,
};

const SPLEEN_8X16: BaseFont = BaseFont {
    data: FONT_8X16,
    width: 8,
    height: 16,
};

const SPLEEN_12X24: BaseFont = BaseFont {
    data: FONT_12X24,
    width: 12,
    height: 24,
};

fn select_font(point_size: f32) -> (BaseFont, u32) {
    if point_size <= 14.0 {
        (SPLEEN_6X12, 1)
    } else if point_size <= 20.0 {
        (SPLEEN_8X16, 1)
    } else {
        let scale = (point_size / 24.0).round().max(1.0) as u32;
        (SPLEEN_12X24, scale)
    }
}

/// Rasterizer using the built-in Spleen bitmap fonts.
#[derive(Debug, Clone, Copy)]
pub struct BitmapFontRasterizer {
    width: u32,
}

impl BitmapFontRasterizer {
    /// `width` is the printable width in pixels.
    pub fn new(width: u32) -> Self {
        Self { width }
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

/// Glyph cells of one character, `font.width * font.height`, row-major.
fn glyph_cells(spleen: &mut PSF2Font, font: BaseFont, ch: char) -> Vec<bool> {
    let (w, h) = (font.width as usize, font.height as usize);
    let mut cells = vec![false; w * h];
    let mut utf8 = [0u8; 4];

    match spleen.glyph_for_utf8(ch.encode_utf8(&mut utf8).as_bytes()) {
        Some(glyph) => {
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < h && col_x < w {
                        cells[row_y * w + col_x] = on;
                    }
                }
            }
        }
        None => {
            for x in 0..w {
                cells[x] = true;
                cells[(h - 1) * w + x] = true;
            }
            for y in 0..h {
                cells[y * w] = true;
                cells[y * w + w - 1] = true;
            }
        }
    }
    cells
}

impl Rasterizer for BitmapFontRasterizer {
    fn render(&self, text: &str, point_size: f32, bold: bool, align: Alignment) -> Result<Bitmap> {
        check_point_size(point_size)?;

        let (font, scale) = select_font(point_size);
        let mut spleen = PSF2Font::new(font.data)
            .map_err(|_| BluberryError::Font("Failed to load built-in Spleen font".into()))?;

        let cell_w = font.width * scale;
        let cell_h = font.height * scale;
        let embolden = if bold { scale } else { 0 };
        let lines: Vec<&str> = text.split('\n').collect();

        let height = canvas_height(cell_h, lines.len())?;
        let mut bitmap = Bitmap::new(self.width, height);

        for (i, line) in lines.iter().enumerate() {
            // Only the left edge depends on this, so overlong lines just clip.
            let line_width = cell_w
                .saturating_mul(u32::try_from(line.chars().count()).unwrap_or(u32::MAX))
                .saturating_add(embolden);
            let x0 = line_x(self.width, line_width, align);
            let y0 = (TEXT_MARGIN + i as u32 * cell_h) as i64;

            for (n, ch) in line.chars().enumerate() {
                let gx = x0 + n as i64 * cell_w as i64;
                if gx >= self.width as i64 {
                    break;
                }
                let cells = glyph_cells(&mut spleen, font, ch);

                // Nearest-neighbour upscale of each glyph cell.
                for dy in 0..cell_h {
                    let row = (dy / scale) * font.width;
                    let ink = |px: u32| px < cell_w && cells[(row + px / scale) as usize];
                    for dx in 0..cell_w + embolden {
                        let on = ink(dx) || (embolden > 0 && dx >= embolden && ink(dx - embolden));
                        let x = gx + dx as i64;
                        if on && x >= 0 {
                            bitmap.set(x as u32, (y0 + dy as i64) as u32, true);
                        }
                    }
                }
            }
        }

        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_columns(bmp: &Bitmap) -> Vec<u32> {
        (0..bmp.width())
            .filter(|&x| (0..bmp.height()).any(|y| bmp.get(x, y)))
            .collect()
    }

    #[test]
    fn test_select_font() {
        assert_eq!(select_font(14.0), (SPLEEN_6X12, 1));
        assert_eq!(select_font(16.0), (SPLEEN_8X16, 1));
        assert_eq!(select_font(24.0), (SPLEEN_12X24, 1));
        assert_eq!(select_font(48.0), (SPLEEN_12X24, 2));
    }

    #[test]
    fn test_canvas_dimensions() {
        let r = BitmapFontRasterizer::new(576);
        let bmp = r.render("Hello\nWorld", 24.0, false, Alignment::Left).unwrap();
        assert_eq!(bmp.width(), 576);
        assert_eq!(bmp.height(), 24 * 2 + TEXT_MARGIN * 2);
        assert!(!bmp.is_blank());
    }

    #[test]
    fn test_left_alignment_respects_margin() {
        let r = BitmapFontRasterizer::new(576);
        let bmp = r.render("HHHH", 24.0, false, Alignment::Left).unwrap();
        let cols = black_columns(&bmp);
        assert!(*cols.first().unwrap() >= TEXT_MARGIN);
        assert!(*cols.last().unwrap() < TEXT_MARGIN + 4 * 12);
    }

    #[test]
    fn test_right_alignment_respects_margin() {
        let r = BitmapFontRasterizer::new(576);
        let bmp = r.render("HHHH", 24.0, false, Alignment::Right).unwrap();
        let cols = black_columns(&bmp);
        assert!(*cols.first().unwrap() >= 576 - TEXT_MARGIN - 4 * 12);
        assert!(*cols.last().unwrap() < 576 - TEXT_MARGIN);
    }

    #[test]
    fn test_center_alignment_is_roughly_symmetric() {
        let r = BitmapFontRasterizer::new(576);
        let bmp = r.render("HHHH", 24.0, false, Alignment::Center).unwrap();
        let cols = black_columns(&bmp);
        let left = *cols.first().unwrap() as i64;
        let right = 575 - *cols.last().unwrap() as i64;
        assert!((left - right).abs() <= 12, "left {left} right {right}");
    }

    #[test]
    fn test_bold_adds_ink() {
        let r = BitmapFontRasterizer::new(576);
        let ink = |b: &Bitmap| b.data().iter().map(|x| x.count_ones()).sum::<u32>();
        let regular = r.render("Total", 24.0, false, Alignment::Left).unwrap();
        let bold = r.render("Total", 24.0, true, Alignment::Left).unwrap();
        assert!(ink(&bold) > ink(&regular));
    }

    #[test]
    fn test_deterministic() {
        let r = BitmapFontRasterizer::new(384);
        let a = r.render("Same", 16.0, true, Alignment::Center).unwrap();
        let b = r.render("Same", 16.0, true, Alignment::Center).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_point_size() {
        let r = BitmapFontRasterizer::new(576);
        for size in [0.0, f32::NAN, 256.0, 1e5, 1e30, f32::INFINITY] {
            assert!(
                matches!(r.render("x", size, false, Alignment::Left), Err(BluberryError::Font(_))),
                "size {size}"
            );
        }
    }

    #[test]
    fn test_largest_size_renders() {
        let r = BitmapFontRasterizer::new(576);
        let bmp = r.render("W", 255.0, true, Alignment::Right).unwrap();
        assert_eq!(bmp.height(), 24 * 11 + TEXT_MARGIN * 2);
    }

    #[test]
    fn test_too_many_lines_is_font_error() {
        let r = BitmapFontRasterizer::new(576);
        let text = vec!["x"; 2000].join("\n");
        assert!(matches!(
            r.render(&text, 255.0, false, Alignment::Left),
            Err(BluberryError::Font(_))
        ));
    }

    #[test]
    fn test_overlong_line_clips() {
        let r = BitmapFontRasterizer::new(384);
        let bmp = r.render(&"M".repeat(10_000), 24.0, false, Alignment::Center).unwrap();
        assert_eq!(bmp.width(), 384);
        assert!(!bmp.is_blank());
    }
}

//! # 1-bit Bitmaps
//!
//! The rasterizer hands the compiler a [`Bitmap`]: one bit per pixel,
//! row-major, each row padded to a whole byte.
//!
//! ```text
//! width = 10                     row stride = ceil(10 / 8) = 2 bytes
//!
//!   x: 0 1 2 3 4 5 6 7 | 8 9 . . . . . .
//!      █ ░ ░ ░ ░ ░ ░ █ | █ ░ 0 0 0 0 0 0     → 0x81 0x80
//!                            └─ padding, always clear
//! ```
//!
//! Bit 7 (MSB) of each byte is the leftmost pixel and a set bit prints black.
//! This is exactly the layout of the `GS v 0` raster payload, so encoding is
//! a copy.

use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::{BluberryError, Result};

/// Coverage at or above this value is printed black (mid-gray).
pub const COVERAGE_THRESHOLD: f32 = 0.5;

/// A binary image with bit-packed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// An all-white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let len = Self::stride_for(width) * height as usize;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wrap already packed rows.
    ///
    /// Fails with [`BluberryError::BitmapDataLength`] when `data` is not
    /// exactly `ceil(width / 8) * height` bytes. Padding bits are cleared.
    pub fn from_packed(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self> {
        let stride = Self::stride_for(width);
        let expected = stride * height as usize;
        if data.len() != expected {
            return Err(BluberryError::BitmapDataLength {
                expected,
                actual: data.len(),
            });
        }

        let used = width as usize % 8;
        if used != 0 {
            let mask = 0xFFu8 << (8 - used);
            for row in data.chunks_exact_mut(stride) {
                if let Some(last) = row.last_mut() {
                    *last &= mask;
                }
            }
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Threshold a grayscale coverage buffer (0.0 = white, 1.0 = black).
    ///
    /// `coverage` is row-major with `width * height` entries; missing
    /// entries are treated as white.
    pub fn from_coverage(width: u32, height: u32, coverage: &[f32]) -> Self {
        let mut bitmap = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let idx = y as usize * width as usize + x as usize;
                if coverage.get(idx).is_some_and(|&c| c >= COVERAGE_THRESHOLD) {
                    bitmap.set(x, y, true);
                }
            }
        }
        bitmap
    }

    #[inline]
    fn stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    /// Packed pixel data, `stride() * height()` bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Packed bytes of one row.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Whether the pixel at `(x, y)` is black. Out of bounds reads are white.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.stride() + x as usize / 8;
        self.data[idx] & (0x80 >> (x % 8)) != 0
    }

    /// Set or clear the pixel at `(x, y)`. Out of bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.stride() + x as usize / 8;
        let bit = 0x80 >> (x % 8);
        if black {
            self.data[idx] |= bit;
        } else {
            self.data[idx] &= !bit;
        }
    }

    /// A copy of rows `start..start + rows` (clamped to the bitmap).
    pub fn rows(&self, start: u32, rows: u32) -> Bitmap {
        let start = start.min(self.height);
        let end = start.saturating_add(rows).min(self.height);
        let stride = self.stride();
        Bitmap {
            width: self.width,
            height: end - start,
            data: self.data[start as usize * stride..end as usize * stride].to_vec(),
        }
    }

    /// Whether every pixel is white.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    /// Convert to an 8-bit grayscale image (black = 0, white = 255).
    pub fn to_gray_image(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = if self.get(x, y) { 0u8 } else { 255u8 };
                img.put_pixel(x, y, Luma([color]));
            }
        }
        img
    }

    /// Save as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_gray_image()
            .save(path)
            .map_err(|e| BluberryError::Image(format!("Failed to save PNG: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_msb_first() {
        let mut bmp = Bitmap::new(10, 2);
        bmp.set(0, 0, true);
        bmp.set(7, 0, true);
        bmp.set(8, 0, true);
        assert_eq!(bmp.row(0), &[0x81, 0x80]);
        assert!(bmp.get(8, 0));
        assert!(!bmp.get(9, 0));
        assert_eq!(bmp.row(1), &[0x00, 0x00]);
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut bmp = Bitmap::new(4, 1);
        bmp.set(4, 0, true);
        bmp.set(0, 1, true);
        assert!(bmp.is_blank());
        assert!(!bmp.get(100, 100));
    }

    #[test]
    fn test_from_packed_checks_length() {
        assert!(matches!(
            Bitmap::from_packed(9, 2, vec![0; 3]),
            Err(BluberryError::BitmapDataLength {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_from_packed_clears_padding() {
        let bmp = Bitmap::from_packed(3, 1, vec![0xFF]).unwrap();
        assert_eq!(bmp.data(), &[0xE0]);
    }

    #[test]
    fn test_from_coverage_threshold() {
        let bmp = Bitmap::from_coverage(4, 1, &[0.0, 0.49, 0.5, 1.0]);
        assert!(!bmp.get(0, 0));
        assert!(!bmp.get(1, 0));
        assert!(bmp.get(2, 0));
        assert!(bmp.get(3, 0));
    }

    #[test]
    fn test_rows_slice() {
        let mut bmp = Bitmap::new(8, 5);
        bmp.set(1, 3, true);
        let band = bmp.rows(2, 2);
        assert_eq!(band.height(), 2);
        assert!(band.get(1, 1));
        assert_eq!(bmp.rows(4, 10).height(), 1);
        assert_eq!(bmp.rows(9, 1).height(), 0);
    }

    #[test]
    fn test_gray_image_colors() {
        let mut bmp = Bitmap::new(2, 1);
        bmp.set(1, 0, true);
        let img = bmp.to_gray_image();
        assert_eq!(img.get_pixel(0, 0).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [0]);
    }
}

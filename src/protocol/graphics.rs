//! # ESC/POS Raster Graphics
//!
//! The Bitmap-to-Raster Encoder. Text blocks reach the printer as raster
//! images built with `GS v 0`.
//!
//! ## Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
//!
//! | Format  | Bytes |
//! |---------|-------|
//! | ASCII   | GS v 0 m xL xH yL yH d1...dk |
//! | Hex     | 1D 76 30 m xL xH yL yH d1...dk |
//!
//! - `m`: scaling mode (0 normal, 1 double width, 2 double height, 3 both)
//! - `xL xH`: width in **bytes**, little-endian (`ceil(width / 8)`)
//! - `yL yH`: height in dots, little-endian
//! - `d1...dk`: `k = (xL + xH × 256) × (yL + yH × 256)` bytes of row-major,
//!   MSB-first packed pixels, 1 = black
//!
//! ## Data Layout
//!
//! ```text
//! Row 0:  [byte 0] [byte 1] ... [byte xL-1]
//! Row 1:  [byte 0] [byte 1] ... [byte xL-1]
//! ...
//! Each byte: bit 7 = leftmost dot
//! ```
//!
//! This is the same layout as [`Bitmap`], so the payload is the bitmap's
//! packed rows unchanged.

use super::commands::GS;
use super::template::{Command, CommandTemplate, ParamSlot, ValidRange};
use crate::error::{BluberryError, Result};
use crate::render::Bitmap;

/// Length of the fixed `GS v 0` header that precedes the pixel data.
pub const RASTER_HEADER_LEN: usize = 8;

/// # Raster Bit Image header (GS v 0 m xL xH yL yH)
pub static RASTER_HEADER: CommandTemplate = CommandTemplate::new(
    "raster",
    &[GS, b'v', b'0', 0x00, 0x00, 0x00, 0x00, 0x00],
    &[
        ParamSlot::byte("mode", 3, ValidRange::new(0, 3)),
        ParamSlot::word("width_bytes", 4, ValidRange::WORD),
        ParamSlot::word("height", 6, ValidRange::WORD),
    ],
);

/// Encode a bitmap as one `GS v 0` raster command at normal scale.
///
/// Fails with [`BluberryError::BitmapTooWide`] if the bitmap is wider than
/// `printable_width`; it is never cropped.
///
/// ## Example
///
/// ```
/// use bluberry::protocol::graphics::encode;
/// use bluberry::render::Bitmap;
///
/// let mut bmp = Bitmap::new(10, 1);
/// bmp.set(0, 0, true);
/// let cmd = encode(&bmp, 576).unwrap();
/// assert_eq!(cmd.bytes(), &[0x1D, 0x76, 0x30, 0, 2, 0, 1, 0, 0x80, 0x00]);
/// ```
pub fn encode(bitmap: &Bitmap, printable_width: u32) -> Result<Command> {
    if bitmap.width() > printable_width {
        return Err(BluberryError::BitmapTooWide {
            width: bitmap.width(),
            max: printable_width,
        });
    }

    let header = RASTER_HEADER.bind(&[
        ("mode", 0),
        ("width_bytes", bitmap.stride() as i64),
        ("height", bitmap.height() as i64),
    ])?;
    Ok(header.with_payload(bitmap.data()))
}

/// Encode a tall bitmap as several raster commands of at most `band_rows`
/// rows each, top to bottom.
///
/// Some printers only buffer a limited number of raster rows per command.
/// Splitting keeps each command within that limit without changing what is
/// printed. An empty bitmap yields no commands.
pub fn encode_banded(bitmap: &Bitmap, printable_width: u32, band_rows: u32) -> Result<Vec<Command>> {
    ValidRange::new(1, 65535).check("band_rows", band_rows as i64)?;

    let mut commands = Vec::with_capacity(bitmap.height().div_ceil(band_rows) as usize);
    let mut start = 0;
    while start < bitmap.height() {
        commands.push(encode(&bitmap.rows(start, band_rows), printable_width)?);
        start += band_rows;
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random test pattern.
    fn pattern(width: u32, height: u32, seed: u32) -> Bitmap {
        let mut bmp = Bitmap::new(width, height);
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        for y in 0..height {
            for x in 0..width {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                bmp.set(x, y, state & 1 == 1);
            }
        }
        bmp
    }

    #[test]
    fn test_header_layout() {
        let bmp = Bitmap::new(576, 300);
        let cmd = encode(&bmp, 576).unwrap();
        assert_eq!(
            &cmd.bytes()[..RASTER_HEADER_LEN],
            &[0x1D, 0x76, 0x30, 0x00, 72, 0, 0x2C, 0x01]
        );
        assert_eq!(cmd.name(), "raster");
    }

    #[test]
    fn test_payload_length_and_bits() {
        for (w, h) in [(1, 1), (7, 3), (8, 2), (9, 5), (100, 17), (576, 4)] {
            let bmp = pattern(w, h, w * 31 + h);
            let cmd = encode(&bmp, 576).unwrap();
            let payload = &cmd.bytes()[RASTER_HEADER_LEN..];
            let stride = (w as usize).div_ceil(8);
            assert_eq!(payload.len(), stride * h as usize);

            for y in 0..h {
                for x in 0..w {
                    let byte = payload[y as usize * stride + x as usize / 8];
                    let bit = byte & (0x80 >> (x % 8)) != 0;
                    assert_eq!(bit, bmp.get(x, y), "pixel ({x},{y}) of {w}x{h}");
                }
            }
        }
    }

    #[test]
    fn test_too_wide_is_rejected() {
        let bmp = Bitmap::new(577, 1);
        assert!(matches!(
            encode(&bmp, 576),
            Err(BluberryError::BitmapTooWide {
                width: 577,
                max: 576
            })
        ));
        assert!(encode(&bmp, 584).is_ok());
    }

    #[test]
    fn test_banded_split() {
        let bmp = pattern(64, 10, 7);
        let bands = encode_banded(&bmp, 576, 4).unwrap();
        assert_eq!(bands.len(), 3);

        let heights: Vec<u16> = bands
            .iter()
            .map(|c| u16::from_le_bytes([c.bytes()[6], c.bytes()[7]]))
            .collect();
        assert_eq!(heights, vec![4, 4, 2]);

        let rejoined: Vec<u8> = bands
            .iter()
            .flat_map(|c| c.bytes()[RASTER_HEADER_LEN..].to_vec())
            .collect();
        assert_eq!(rejoined, bmp.data());
    }

    #[test]
    fn test_banded_zero_rows_rejected() {
        assert!(encode_banded(&Bitmap::new(8, 8), 576, 0).is_err());
        assert!(encode_banded(&Bitmap::new(8, 0), 576, 8).unwrap().is_empty());
    }
}

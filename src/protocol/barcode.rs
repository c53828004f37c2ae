//! # 1D Barcode Commands
//!
//! Barcodes use `GS k` function B: an explicit length byte followed by the
//! data, so no terminator is needed and data may contain any printable byte.
//!
//! | Format  | Bytes |
//! |---------|-------|
//! | ASCII   | GS k m n d1...dn |
//! | Hex     | 1D 6B m n d1...dn |
//!
//! Height (`GS h`), module width (`GS w`) and HRI position (`GS H`) are set
//! by separate commands beforehand; see [`setup`].

use serde::{Deserialize, Serialize};

use super::commands::{BARCODE_HEIGHT, BARCODE_HRI, BARCODE_WIDTH, GS};
use super::template::{Command, CommandTemplate, ParamSlot, ValidRange};
use crate::error::{BluberryError, Result};

/// Barcode symbology (`m` values of `GS k` function B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeKind {
    Ean13 = 67,
    Ean8 = 68,
    Code39 = 69,
    #[default]
    Code128 = 73,
}

impl BarcodeKind {
    /// Parse a symbology name as written in receipt scripts.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ean13" | "ean-13" => Some(Self::Ean13),
            "ean8" | "ean-8" => Some(Self::Ean8),
            "code39" => Some(Self::Code39),
            "code128" => Some(Self::Code128),
            _ => None,
        }
    }

    /// Name accepted by [`BarcodeKind::from_name`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ean13 => "ean13",
            Self::Ean8 => "ean8",
            Self::Code39 => "code39",
            Self::Code128 => "code128",
        }
    }

    fn validate(self, data: &str) -> Result<()> {
        let digits_only = data.bytes().all(|b| b.is_ascii_digit());
        let ok = !data.is_empty()
            && match self {
                Self::Ean13 => digits_only && (12..=13).contains(&data.len()),
                Self::Ean8 => digits_only && (7..=8).contains(&data.len()),
                Self::Code39 => data.bytes().all(|b| {
                    b.is_ascii_uppercase() || b.is_ascii_digit() || b" -.$/+%".contains(&b)
                }),
                Self::Code128 => data.bytes().all(|b| (0x20..=0x7E).contains(&b)),
            };
        if ok {
            Ok(())
        } else {
            Err(BluberryError::BarcodeData {
                kind: self.name().to_string(),
                data: data.to_string(),
            })
        }
    }
}

/// # Print Barcode header (GS k m n)
pub static BARCODE_PRINT: CommandTemplate = CommandTemplate::new(
    "barcode",
    &[GS, b'k', 73, 0x00],
    &[
        ParamSlot::byte("kind", 2, ValidRange::new(65, 73)),
        ParamSlot::byte("length", 3, ValidRange::new(1, 255)),
    ],
);

/// Barcode appearance settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeSetup {
    /// Bar height in dots.
    pub height: u8,
    /// Module width (2-6).
    pub module_width: u8,
    /// Human readable text position (0 none, 1 above, 2 below, 3 both).
    pub hri: u8,
}

impl Default for BarcodeSetup {
    fn default() -> Self {
        // GS h 162 / GS w 3 as shipped in the printer defaults
        Self {
            height: 162,
            module_width: 3,
            hri: 2,
        }
    }
}

/// Commands that configure the next barcode.
pub fn setup(settings: &BarcodeSetup) -> Result<Vec<Command>> {
    Ok(vec![
        BARCODE_HEIGHT.bind(&[("height", settings.height as i64)])?,
        BARCODE_WIDTH.bind(&[("width", settings.module_width as i64)])?,
        BARCODE_HRI.bind(&[("position", settings.hri as i64)])?,
    ])
}

/// Build a `GS k` function B command.
///
/// CODE128 data is prefixed with the `{B` code set selector unless the caller
/// already chose a code set.
///
/// ```
/// use bluberry::protocol::barcode::{barcode, BarcodeKind};
///
/// let cmd = barcode(BarcodeKind::Code39, "ABC123").unwrap();
/// assert_eq!(&cmd.bytes()[..4], &[0x1D, 0x6B, 69, 6]);
/// ```
pub fn barcode(kind: BarcodeKind, data: &str) -> Result<Command> {
    kind.validate(data)?;

    let mut payload = Vec::with_capacity(data.len() + 2);
    if kind == BarcodeKind::Code128 && !data.starts_with('{') {
        payload.extend_from_slice(b"{B");
    }
    payload.extend_from_slice(data.as_bytes());

    let header = BARCODE_PRINT.bind(&[
        ("kind", kind as i64),
        ("length", payload.len() as i64),
    ])?;
    Ok(header.with_payload(&payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_prefix() {
        let cmd = barcode(BarcodeKind::Code128, "12345").unwrap();
        assert_eq!(&cmd.bytes()[..4], &[0x1D, 0x6B, 73, 7]);
        assert_eq!(&cmd.bytes()[4..], b"{B12345");
    }

    #[test]
    fn test_ean13() {
        let cmd = barcode(BarcodeKind::Ean13, "490123456789").unwrap();
        assert_eq!(cmd.bytes()[2], 67);
        assert_eq!(cmd.bytes()[3], 12);
        assert!(barcode(BarcodeKind::Ean13, "12AB").is_err());
    }

    #[test]
    fn test_code39_charset() {
        assert!(barcode(BarcodeKind::Code39, "ABC-12").is_ok());
        assert!(barcode(BarcodeKind::Code39, "abc").is_err());
    }

    #[test]
    fn test_length_limit() {
        let long = "A".repeat(254);
        assert!(matches!(
            barcode(BarcodeKind::Code128, &long),
            Err(BluberryError::OutOfRange { slot: "length", value: 256, .. })
        ));
        assert!(barcode(BarcodeKind::Code128, &"A".repeat(253)).is_ok());
    }

    #[test]
    fn test_empty_data_rejected() {
        assert!(barcode(BarcodeKind::Code39, "").is_err());
        assert!(matches!(
            barcode(BarcodeKind::Code128, ""),
            Err(BluberryError::BarcodeData { .. })
        ));
    }

    #[test]
    fn test_setup_defaults() {
        let cmds = setup(&BarcodeSetup::default()).unwrap();
        let bytes: Vec<u8> = cmds.iter().flat_map(|c| c.bytes().to_vec()).collect();
        assert_eq!(bytes, vec![0x1D, 0x68, 162, 0x1D, 0x77, 3, 0x1D, 0x48, 2]);
    }

    #[test]
    fn test_setup_rejects_bad_width() {
        let settings = BarcodeSetup {
            module_width: 9,
            ..Default::default()
        };
        assert!(setup(&settings).is_err());
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(BarcodeKind::from_name("CODE128"), Some(BarcodeKind::Code128));
        assert_eq!(BarcodeKind::from_name("ean-8"), Some(BarcodeKind::Ean8));
        assert_eq!(BarcodeKind::from_name("qr"), None);
    }
}

//! # Printer Configuration
//!
//! Hardware profiles and the print settings that tune compilation and
//! delivery for one printer.
//!
//! ## Profiles
//!
//! | Profile | Paper | Width (dots) | Resolution |
//! |---------|-------|--------------|------------|
//! | `GENERIC_80MM` | 80mm | 576 | 203 DPI |
//! | `GENERIC_58MM` | 58mm | 384 | 203 DPI |
//!
//! ## Settings File
//!
//! Every key is optional; missing keys keep their defaults.
//!
//! ```json
//! {
//!   "max_frame_bytes": 20,
//!   "inter_frame_delay_ms": 20,
//!   "printable_width_pixels": 576
//! }
//! ```

use std::fs;
use std::num::{NonZeroU16, NonZeroUsize};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BluberryError, Result};

/// Hardware characteristics of a thermal receipt printer.
///
/// ```text
/// 80mm paper: 576 dots at 203 DPI = 72mm printable
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u16,

    /// Resolution in dots per inch
    pub dpi: u16,
}

impl PrinterConfig {
    /// 80mm paper, 72mm printable.
    pub const GENERIC_80MM: Self = Self {
        name: "Generic 80mm",
        width_dots: 576,
        dpi: 203,
    };

    /// 58mm paper, 48mm printable.
    pub const GENERIC_58MM: Self = Self {
        name: "Generic 58mm",
        width_dots: 384,
        dpi: 203,
    };

    /// Look a profile up by its short name (`80mm`, `58mm`).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "80mm" | "80" => Some(Self::GENERIC_80MM),
            "58mm" | "58" => Some(Self::GENERIC_58MM),
            _ => None,
        }
    }

    /// Default print settings for this profile's width.
    pub fn settings(&self) -> PrintSettings {
        PrintSettings {
            printable_width_pixels: NonZeroU16::new(self.width_dots)
                .unwrap_or(PrintSettings::DEFAULT_WIDTH),
            ..PrintSettings::default()
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::GENERIC_80MM
    }
}

// ============================================================================
// PRINT SETTINGS
// ============================================================================

/// Framing and layout parameters for one printer.
///
/// The defaults suit a low-buffer Bluetooth SPP printer: 20-byte frames,
/// 20ms apart, onto an 80mm roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "RawSettings")]
pub struct PrintSettings {
    /// Upper bound on the size of one transport write.
    pub max_frame_bytes: NonZeroUsize,

    /// Pause between consecutive frames.
    pub inter_frame_delay: Duration,

    /// Widest bitmap the printer accepts.
    pub printable_width_pixels: NonZeroU16,
}

impl PrintSettings {
    pub const DEFAULT_FRAME_BYTES: NonZeroUsize = match NonZeroUsize::new(20) {
        Some(n) => n,
        None => unreachable!(),
    };

    pub const DEFAULT_DELAY: Duration = Duration::from_millis(20);

    pub const DEFAULT_WIDTH: NonZeroU16 = match NonZeroU16::new(576) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Parse settings from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSettings = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            BluberryError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Printable width in pixels, as the compiler takes it.
    #[inline]
    pub fn printable_width(&self) -> u32 {
        u32::from(self.printable_width_pixels.get())
    }
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            max_frame_bytes: Self::DEFAULT_FRAME_BYTES,
            inter_frame_delay: Self::DEFAULT_DELAY,
            printable_width_pixels: Self::DEFAULT_WIDTH,
        }
    }
}

/// On-disk shape of [`PrintSettings`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    max_frame_bytes: usize,
    inter_frame_delay_ms: u64,
    printable_width_pixels: u16,
}

impl Default for RawSettings {
    fn default() -> Self {
        PrintSettings::default().into()
    }
}

impl From<PrintSettings> for RawSettings {
    fn from(settings: PrintSettings) -> Self {
        Self {
            max_frame_bytes: settings.max_frame_bytes.get(),
            inter_frame_delay_ms: settings.inter_frame_delay.as_millis() as u64,
            printable_width_pixels: settings.printable_width_pixels.get(),
        }
    }
}

impl TryFrom<RawSettings> for PrintSettings {
    type Error = BluberryError;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let max_frame_bytes = NonZeroUsize::new(raw.max_frame_bytes)
            .ok_or_else(|| BluberryError::Config("max_frame_bytes must be at least 1".into()))?;
        let printable_width_pixels = NonZeroU16::new(raw.printable_width_pixels).ok_or_else(|| {
            BluberryError::Config("printable_width_pixels must be at least 1".into())
        })?;
        Ok(Self {
            max_frame_bytes,
            inter_frame_delay: Duration::from_millis(raw.inter_frame_delay_ms),
            printable_width_pixels,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_dimensions() {
        assert_eq!(PrinterConfig::GENERIC_80MM.settings().printable_width(), 576);
        assert_eq!(PrinterConfig::GENERIC_58MM.settings().printable_width(), 384);
        assert_eq!(PrinterConfig::default(), PrinterConfig::GENERIC_80MM);
    }

    #[test]
    fn test_by_name() {
        assert_eq!(PrinterConfig::by_name("58mm"), Some(PrinterConfig::GENERIC_58MM));
        assert_eq!(PrinterConfig::by_name(" 80MM "), Some(PrinterConfig::GENERIC_80MM));
        assert_eq!(PrinterConfig::by_name("110mm"), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = PrintSettings::default();
        assert_eq!(settings.max_frame_bytes.get(), 20);
        assert_eq!(settings.inter_frame_delay, Duration::from_millis(20));
        assert_eq!(settings.printable_width(), 576);
        assert_eq!(PrinterConfig::GENERIC_58MM.settings().printable_width(), 384);
    }

    #[test]
    fn test_settings_from_json() {
        let settings =
            PrintSettings::from_json(r#"{"max_frame_bytes": 512, "inter_frame_delay_ms": 0}"#)
                .unwrap();
        assert_eq!(settings.max_frame_bytes.get(), 512);
        assert!(settings.inter_frame_delay.is_zero());
        assert_eq!(settings.printable_width(), 576);

        assert_eq!(PrintSettings::from_json("{}").unwrap(), PrintSettings::default());
    }

    #[test]
    fn test_settings_reject_zero() {
        let err = PrintSettings::from_json(r#"{"max_frame_bytes": 0}"#).unwrap_err();
        assert!(matches!(err, BluberryError::Config(_)));
        let err = PrintSettings::from_json(r#"{"printable_width_pixels": 0}"#).unwrap_err();
        assert!(matches!(err, BluberryError::Config(_)));
    }

    #[test]
    fn test_settings_reject_unknown_keys() {
        let err = PrintSettings::from_json(r#"{"frame": 20}"#).unwrap_err();
        assert!(matches!(err, BluberryError::Json(_)));
    }

    #[test]
    fn test_settings_serialize_as_millis() {
        let json = serde_json::to_value(PrintSettings::default()).unwrap();
        assert_eq!(json["inter_frame_delay_ms"], 20);
        assert_eq!(json["max_frame_bytes"], 20);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PrintSettings::load(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, BluberryError::Config(_)));
    }
}

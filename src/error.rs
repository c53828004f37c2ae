//! # Error Types
//!
//! This module defines error types used throughout the bluberry library.
//!
//! Errors fall into three groups:
//!
//! | Group | Variants | Recovery |
//! |-------|----------|----------|
//! | Validation | `OutOfRange`, `MalformedSection`, `BitmapTooWide`, ... | Fix input, nothing was sent |
//! | Transport | `PartialSend`, `SessionFailed`, `Transport` | Caller decides resend policy |
//! | Collaborator | `Font`, `Connect` | Propagated unchanged |

use std::io;

use thiserror::Error;

use crate::protocol::template::ValidRange;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, BluberryError>;

/// Main error type for bluberry operations
#[derive(Debug, Error)]
pub enum BluberryError {
    /// A parameter value fell outside its slot's declared range.
    #[error("Parameter '{slot}' = {value} is out of range {range}")]
    OutOfRange {
        slot: &'static str,
        value: i64,
        range: ValidRange,
    },

    /// A template slot was not given a value.
    #[error("Template '{template}' is missing parameter '{slot}'")]
    MissingParameter {
        template: &'static str,
        slot: &'static str,
    },

    /// A value was supplied for a slot the template does not have.
    #[error("Template '{template}' has no parameter '{slot}'")]
    UnknownParameter { template: &'static str, slot: String },

    /// No template with this name exists in the primitive table.
    #[error("Unknown command template '{0}'")]
    UnknownTemplate(String),

    /// A script line could not be interpreted (1-based line number).
    #[error("Malformed section at line {line}: '{content}'")]
    MalformedSection { line: usize, content: String },

    /// Bitmap is wider than the printable area.
    #[error("Bitmap width {width} exceeds printable width {max}")]
    BitmapTooWide { width: u32, max: u32 },

    /// Packed bitmap data does not match its declared dimensions.
    #[error("Bitmap data length mismatch: expected {expected} bytes, got {actual}")]
    BitmapDataLength { expected: usize, actual: usize },

    /// Barcode data is not encodable in the chosen symbology.
    #[error("Invalid {kind} barcode data: '{data}'")]
    BarcodeData { kind: String, data: String },

    /// Some frames were written before delivery stopped.
    #[error("Partial send: {bytes_sent} bytes delivered before failure ({cause})")]
    PartialSend {
        bytes_sent: usize,
        #[source]
        cause: SendFault,
    },

    /// The session already failed and must be discarded.
    #[error("Transport session has failed; reconnect before sending again")]
    SessionFailed,

    /// Transport-level setup errors (device lookup, tty configuration)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The device directory could not open a channel.
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// Font loading or glyph rendering failed.
    #[error("Font error: {0}")]
    Font(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why a framed send stopped early.
#[derive(Debug, Error)]
pub enum SendFault {
    /// The channel rejected a frame write.
    #[error("frame write failed: {0}")]
    Write(#[source] io::Error),

    /// The caller requested an abort between frames.
    #[error("aborted by caller")]
    Aborted,
}

impl BluberryError {
    /// Bytes handed to the channel before a transport failure, if any.
    pub fn bytes_sent(&self) -> Option<usize> {
        match self {
            Self::PartialSend { bytes_sent, .. } => Some(*bytes_sent),
            _ => None,
        }
    }

    /// Whether the error was raised before any byte left the process.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange { .. }
                | Self::MissingParameter { .. }
                | Self::UnknownParameter { .. }
                | Self::UnknownTemplate(_)
                | Self::MalformedSection { .. }
                | Self::BitmapTooWide { .. }
                | Self::BitmapDataLength { .. }
                | Self::BarcodeData { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = BluberryError::OutOfRange {
            slot: "lines",
            value: 300,
            range: ValidRange::new(0, 255),
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'lines' = 300 is out of range 0..=255"
        );
        assert!(err.is_validation());
        assert_eq!(err.bytes_sent(), None);
    }

    #[test]
    fn test_partial_send_reports_bytes() {
        let err = BluberryError::PartialSend {
            bytes_sent: 40,
            cause: SendFault::Aborted,
        };
        assert_eq!(err.bytes_sent(), Some(40));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("40 bytes"));
    }
}

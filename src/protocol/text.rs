//! # Text Styling Commands
//!
//! Alignment, emphasis and native (font ROM) text output. Styled text in a
//! receipt is normally rasterized to an image; these commands cover the
//! ASCII passthrough path where the printer's own font is used instead.
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```

use serde::{Deserialize, Serialize};

use super::commands::{ALIGN, BOLD, LF};
use super::template::{Command, ValidRange};
use crate::error::Result;

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    /// Parameter value of `ESC a n`.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// # Select Justification (ESC a n)
///
/// ## Example
///
/// ```
/// use bluberry::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center).bytes(), &[0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Command {
    // Alignment codes are always inside 0..=2.
    let mut bytes = ALIGN.opcode.to_vec();
    bytes[2] = alignment.code();
    Command::from_parts(ALIGN.name, bytes)
}

/// # Emphasized Mode (ESC E n)
pub fn bold(enabled: bool) -> Command {
    let mut bytes = BOLD.opcode.to_vec();
    bytes[2] = enabled as u8;
    Command::from_parts(BOLD.name, bytes)
}

/// Characters the printer's font ROM prints as-is.
const PRINTABLE_ASCII: ValidRange = ValidRange::new(0x20, 0x7E);

/// Whether `text` can be sent to the printer without rasterizing.
pub fn is_printable_ascii(text: &str) -> bool {
    text.chars().all(|c| PRINTABLE_ASCII.contains(c as i64))
}

/// A single line of native text followed by `LF`.
///
/// Rejects any character outside printable ASCII, so control bytes can never
/// be smuggled into the command stream.
///
/// ```
/// use bluberry::protocol::text::text_line;
///
/// assert_eq!(text_line("Hi").unwrap().bytes(), b"Hi\n");
/// assert!(text_line("\x1B@").is_err());
/// ```
pub fn text_line(text: &str) -> Result<Command> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    for c in text.chars() {
        PRINTABLE_ASCII.check("text", c as i64)?;
        bytes.push(c as u8);
    }
    bytes.push(LF);
    Ok(Command::from_parts("text", bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BluberryError;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left).bytes(), &[0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Center).bytes(), &[0x1B, 0x61, 0x01]);
        assert_eq!(align(Alignment::Right).bytes(), &[0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_align_matches_template() {
        for a in [Alignment::Left, Alignment::Center, Alignment::Right] {
            assert_eq!(align(a), ALIGN.bind(&[("alignment", a.code() as i64)]).unwrap());
        }
    }

    #[test]
    fn test_bold() {
        assert_eq!(bold(true).bytes(), &[0x1B, 0x45, 0x01]);
        assert_eq!(bold(false).bytes(), &[0x1B, 0x45, 0x00]);
    }

    #[test]
    fn test_text_line_rejects_non_ascii() {
        match text_line("가") {
            Err(BluberryError::OutOfRange { slot, value, .. }) => {
                assert_eq!(slot, "text");
                assert_eq!(value, '가' as i64);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_printable_ascii() {
        assert!(is_printable_ascii("Total: 15,000"));
        assert!(is_printable_ascii(""));
        assert!(!is_printable_ascii("합계"));
        assert!(!is_printable_ascii("tab\there"));
    }

    #[test]
    fn test_alignment_serde() {
        let a: Alignment = serde_json::from_str("\"center\"").unwrap();
        assert_eq!(a, Alignment::Center);
        assert_eq!(serde_json::to_string(&Alignment::Right).unwrap(), "\"right\"");
    }
}

//! # ESC/POS Command Primitive Table
//!
//! This module is the fixed catalogue of command templates for ESC/POS
//! thermal receipt printers, plus typed builders for the common ones.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`
//! - Fixed: `ESC @`, `GS V 0`
//! - With parameters: `ESC J n`, `GS L nL nH`
//! - With payload: `GS v 0 m xL xH yL yH d1...dk` (see [`super::graphics`])
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! ## Immutability
//!
//! Every template is a `static` value and is never written to. Building a
//! command copies the opcode bytes into a new buffer and fills the copy, so
//! two builds can never observe each other's parameters.
//!
//! ## Typed Builders
//!
//! The builders take parameters in their natural width, so they cannot
//! fail. A narrow column of native text, for a 58mm roll on an 80mm head:
//!
//! ```
//! use bluberry::protocol::commands;
//!
//! let layout: Vec<u8> = [
//!     commands::left_margin(96),        // GS L 96 0
//!     commands::print_area_width(384),  // GS W 0x80 0x01
//!     commands::line_spacing(30),       // ESC 3 30
//!     commands::absolute_position(8),   // ESC $ 8 0
//!     commands::line_feed(),            // LF
//!     commands::feed_lines(2),          // ESC d 2
//! ]
//! .iter()
//! .flat_map(|c| c.bytes().to_vec())
//! .collect();
//!
//! assert_eq!(
//!     layout,
//!     vec![
//!         0x1D, 0x4C, 96, 0, 0x1D, 0x57, 0x80, 0x01, 0x1B, 0x33, 30,
//!         0x1B, 0x24, 8, 0, 0x0A, 0x1B, 0x64, 2,
//!     ]
//! );
//! ```

use super::template::{Command, CommandTemplate, ParamSlot, ValidRange};
use crate::error::{BluberryError, Result};

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for graphics, cutter, barcode, and character size commands.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

/// NUL - Terminator for barcode data in `GS k` format A
pub const NUL: u8 = 0x00;

// ============================================================================
// PRINTER CONTROL
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets modes to power-on defaults. Always the
/// first command of a compiled receipt.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
pub static INIT: CommandTemplate = CommandTemplate::new("init", &[ESC, b'@'], &[]);

/// Print the line buffer and advance one line (LF).
pub static LINE_FEED: CommandTemplate = CommandTemplate::new("line_feed", &[LF], &[]);

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Print and Feed Paper (ESC J n)
///
/// Prints the buffer and advances the paper by `n` motion units (0-255).
/// This is the feed directive's command.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC J n  |
/// | Hex     | 1B 4A n  |
pub static PRINT_AND_FEED: CommandTemplate = CommandTemplate::new(
    "print_and_feed",
    &[ESC, b'J', 0x00],
    &[ParamSlot::byte("lines", 2, ValidRange::BYTE)],
);

/// # Print and Feed n Lines (ESC d n)
pub static FEED_LINES: CommandTemplate = CommandTemplate::new(
    "feed_lines",
    &[ESC, b'd', 0x00],
    &[ParamSlot::byte("lines", 2, ValidRange::BYTE)],
);

/// # Set Line Spacing (ESC 3 n)
pub static LINE_SPACING: CommandTemplate = CommandTemplate::new(
    "line_spacing",
    &[ESC, b'3', 0x00],
    &[ParamSlot::byte("spacing", 2, ValidRange::BYTE)],
);

/// # Default Line Spacing (ESC 2)
pub static DEFAULT_LINE_SPACING: CommandTemplate =
    CommandTemplate::new("default_line_spacing", &[ESC, b'2'], &[]);

// ============================================================================
// CUTTER
// ============================================================================

/// # Full Cut (GS V 0)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | GS V 0   |
/// | Hex     | 1D 56 00 |
pub static CUT_FULL: CommandTemplate = CommandTemplate::new("cut_full", &[GS, b'V', 0x00], &[]);

/// # Partial Cut (GS V 1)
pub static CUT_PARTIAL: CommandTemplate =
    CommandTemplate::new("cut_partial", &[GS, b'V', 0x01], &[]);

/// # Feed and Partial Cut (GS V B n)
///
/// Feeds `n` motion units past the cutter, then cuts. Function B of `GS V`.
pub static FEED_AND_CUT: CommandTemplate = CommandTemplate::new(
    "feed_and_cut",
    &[GS, b'V', b'B', 0x00],
    &[ParamSlot::byte("feed", 3, ValidRange::BYTE)],
);

/// # Legacy Full Cut (ESC i)
pub static CUT_ESC_I: CommandTemplate = CommandTemplate::new("cut_esc_i", &[ESC, b'i'], &[]);

/// # Legacy Partial Cut (ESC m)
pub static CUT_ESC_M: CommandTemplate = CommandTemplate::new("cut_esc_m", &[ESC, b'm'], &[]);

// ============================================================================
// TEXT FORMATTING
// ============================================================================

/// # Select Justification (ESC a n)
///
/// - `n = 0`: Left
/// - `n = 1`: Center
/// - `n = 2`: Right
pub static ALIGN: CommandTemplate = CommandTemplate::new(
    "align",
    &[ESC, b'a', 0x00],
    &[ParamSlot::byte("alignment", 2, ValidRange::new(0, 2))],
);

/// # Emphasized Mode (ESC E n)
pub static BOLD: CommandTemplate = CommandTemplate::new(
    "bold",
    &[ESC, b'E', 0x00],
    &[ParamSlot::byte("bold", 2, ValidRange::FLAG)],
);

/// # Underline Mode (ESC - n)
///
/// `n` is the underline thickness in dots (0 = off, 1 or 2).
pub static UNDERLINE: CommandTemplate = CommandTemplate::new(
    "underline",
    &[ESC, b'-', 0x00],
    &[ParamSlot::byte("underline", 2, ValidRange::new(0, 2))],
);

/// # White/Black Reverse Mode (GS B n)
pub static INVERT: CommandTemplate = CommandTemplate::new(
    "invert",
    &[GS, b'B', 0x00],
    &[ParamSlot::byte("invert", 2, ValidRange::FLAG)],
);

/// # Character Size (GS ! n)
///
/// High nibble is the width multiplier minus one, low nibble the height
/// multiplier minus one. Use [`text_scale`] to build it from two factors.
pub static TEXT_SCALE: CommandTemplate = CommandTemplate::new(
    "text_scale",
    &[GS, b'!', 0x00],
    &[ParamSlot::byte("scale", 2, ValidRange::new(0, 0x77))],
);

/// # Right-side Character Spacing (ESC SP n)
pub static CHAR_SPACING: CommandTemplate = CommandTemplate::new(
    "char_spacing",
    &[ESC, b' ', 0x00],
    &[ParamSlot::byte("spacing", 2, ValidRange::BYTE)],
);

/// # Select Character Code Table (ESC t n)
pub static CODE_PAGE: CommandTemplate = CommandTemplate::new(
    "code_page",
    &[ESC, b't', 0x00],
    &[ParamSlot::byte("page", 2, ValidRange::BYTE)],
);

// ============================================================================
// LAYOUT
// ============================================================================

/// # Set Left Margin (GS L nL nH)
pub static LEFT_MARGIN: CommandTemplate = CommandTemplate::new(
    "left_margin",
    &[GS, b'L', 0x00, 0x00],
    &[ParamSlot::word("margin", 2, ValidRange::WORD)],
);

/// # Set Absolute Print Position (ESC $ nL nH)
pub static ABSOLUTE_POSITION: CommandTemplate = CommandTemplate::new(
    "absolute_position",
    &[ESC, b'$', 0x00, 0x00],
    &[ParamSlot::word("position", 2, ValidRange::WORD)],
);

/// # Set Print Area Width (GS W nL nH)
pub static PRINT_AREA_WIDTH: CommandTemplate = CommandTemplate::new(
    "print_area_width",
    &[GS, b'W', 0x00, 0x00],
    &[ParamSlot::word("width", 2, ValidRange::WORD)],
);

// ============================================================================
// BARCODE SETUP
// ============================================================================

/// # Barcode Height (GS h n), in dots
pub static BARCODE_HEIGHT: CommandTemplate = CommandTemplate::new(
    "barcode_height",
    &[GS, b'h', 0xA2],
    &[ParamSlot::byte("height", 2, ValidRange::new(1, 255))],
);

/// # Barcode Module Width (GS w n)
pub static BARCODE_WIDTH: CommandTemplate = CommandTemplate::new(
    "barcode_width",
    &[GS, b'w', 0x03],
    &[ParamSlot::byte("width", 2, ValidRange::new(2, 6))],
);

/// # HRI Character Position (GS H n)
///
/// 0 = none, 1 = above, 2 = below, 3 = both.
pub static BARCODE_HRI: CommandTemplate = CommandTemplate::new(
    "barcode_hri",
    &[GS, b'H', 0x00],
    &[ParamSlot::byte("position", 2, ValidRange::new(0, 3))],
);

// ============================================================================
// PERIPHERALS
// ============================================================================

/// # Generate Drawer Pulse (ESC p m t1 t2)
pub static CASH_DRAWER: CommandTemplate = CommandTemplate::new(
    "cash_drawer",
    &[ESC, b'p', 0x00, 0x19, 0xFA],
    &[
        ParamSlot::byte("pin", 2, ValidRange::FLAG),
        ParamSlot::byte("on_time", 3, ValidRange::BYTE),
        ParamSlot::byte("off_time", 4, ValidRange::BYTE),
    ],
);

/// Every template in the table, looked up by name in [`build`].
pub static CATALOGUE: &[&CommandTemplate] = &[
    &INIT,
    &LINE_FEED,
    &PRINT_AND_FEED,
    &FEED_LINES,
    &LINE_SPACING,
    &DEFAULT_LINE_SPACING,
    &CUT_FULL,
    &CUT_PARTIAL,
    &FEED_AND_CUT,
    &CUT_ESC_I,
    &CUT_ESC_M,
    &ALIGN,
    &BOLD,
    &UNDERLINE,
    &INVERT,
    &TEXT_SCALE,
    &CHAR_SPACING,
    &CODE_PAGE,
    &LEFT_MARGIN,
    &ABSOLUTE_POSITION,
    &PRINT_AREA_WIDTH,
    &BARCODE_HEIGHT,
    &BARCODE_WIDTH,
    &BARCODE_HRI,
    &CASH_DRAWER,
    &super::barcode::BARCODE_PRINT,
    &super::graphics::RASTER_HEADER,
];

/// Find a template by name.
pub fn template(name: &str) -> Option<&'static CommandTemplate> {
    CATALOGUE.iter().copied().find(|t| t.name == name)
}

/// Build a command from the table by template name.
///
/// ## Example
///
/// ```
/// use bluberry::protocol::commands;
///
/// let margin = commands::build("left_margin", &[("margin", 0x0150)]).unwrap();
/// assert_eq!(margin.bytes(), &[0x1D, 0x4C, 0x50, 0x01]);
/// ```
pub fn build(name: &str, params: &[(&str, i64)]) -> Result<Command> {
    template(name)
        .ok_or_else(|| BluberryError::UnknownTemplate(name.to_string()))?
        .bind(params)
}

// ============================================================================
// TYPED BUILDERS
// ============================================================================

/// `ESC @`
pub fn init() -> Command {
    fixed(&INIT)
}

/// `LF`
pub fn line_feed() -> Command {
    fixed(&LINE_FEED)
}

/// `ESC J n`
pub fn print_and_feed(lines: u8) -> Command {
    byte_command(&PRINT_AND_FEED, "lines", lines)
}

/// `ESC d n`
pub fn feed_lines(lines: u8) -> Command {
    byte_command(&FEED_LINES, "lines", lines)
}

/// `GS ! n` from width/height factors (1-8 each).
pub fn text_scale(width: u8, height: u8) -> Result<Command> {
    const FACTOR: ValidRange = ValidRange::new(1, 8);
    FACTOR.check("scale_width", width as i64)?;
    FACTOR.check("scale_height", height as i64)?;
    let scale = (((width - 1) << 4) | (height - 1)) as i64;
    TEXT_SCALE.bind(&[("scale", scale)])
}

/// `GS L nL nH`
pub fn left_margin(dots: u16) -> Command {
    word_command(&LEFT_MARGIN, "margin", dots)
}

/// `ESC $ nL nH`
pub fn absolute_position(dots: u16) -> Command {
    word_command(&ABSOLUTE_POSITION, "position", dots)
}

/// `GS W nL nH`
pub fn print_area_width(dots: u16) -> Command {
    word_command(&PRINT_AREA_WIDTH, "width", dots)
}

/// `ESC 3 n`
pub fn line_spacing(dots: u8) -> Command {
    byte_command(&LINE_SPACING, "spacing", dots)
}

// Fixed templates and full-width slots cannot fail to bind; the remaining
// bytes come straight from the template.
fn fixed(template: &'static CommandTemplate) -> Command {
    Command::from_parts(template.name, template.opcode.to_vec())
}

fn byte_command(template: &'static CommandTemplate, slot: &'static str, value: u8) -> Command {
    debug_assert_eq!(template.slot(slot).map(|s| s.range), Some(ValidRange::BYTE));
    let mut bytes = template.opcode.to_vec();
    if let Some(s) = template.slot(slot) {
        bytes[s.offset] = value;
    }
    Command::from_parts(template.name, bytes)
}

fn word_command(template: &'static CommandTemplate, slot: &'static str, value: u16) -> Command {
    debug_assert_eq!(template.slot(slot).map(|s| s.range), Some(ValidRange::WORD));
    let mut bytes = template.opcode.to_vec();
    if let Some(s) = template.slot(slot) {
        bytes[s.offset..s.offset + 2].copy_from_slice(&value.to_le_bytes());
    }
    Command::from_parts(template.name, bytes)
}

// ============================================================================
// TESTS
// ============================================================================

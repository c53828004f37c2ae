//! # ESC/POS Protocol Implementation
//!
//! This module provides the command primitive table and command builders for
//! ESC/POS thermal receipt printers.
//!
//! ## Module Structure
//!
//! - [`template`]: Immutable command templates and parameter binding
//! - [`commands`]: The primitive table (init, feed, cut, layout) and typed builders
//! - [`text`]: Text styling (alignment, bold) and native ASCII lines
//! - [`barcode`]: 1D barcodes (`GS k`)
//! - [`graphics`]: Raster images (`GS v 0`)
//!
//! ## Usage Example
//!
//! ```
//! use bluberry::protocol::{commands, graphics, text};
//! use bluberry::protocol::text::Alignment;
//! use bluberry::render::Bitmap;
//!
//! let mut data = Vec::new();
//!
//! // Initialize printer
//! data.extend_from_slice(commands::init().bytes());
//!
//! // Centered bold line in the printer's own font
//! data.extend_from_slice(text::align(Alignment::Center).bytes());
//! data.extend_from_slice(text::bold(true).bytes());
//! data.extend_from_slice(text::text_line("RECEIPT").unwrap().bytes());
//!
//! // A 576-dot wide, 24-row image
//! let image = Bitmap::new(576, 24);
//! data.extend_from_slice(graphics::encode(&image, 576).unwrap().bytes());
//!
//! // Feed and cut
//! data.extend_from_slice(commands::print_and_feed(3).bytes());
//! data.extend_from_slice(commands::build("cut_full", &[]).unwrap().bytes());
//! ```
//!
//! Every command is built from a `static` template into a new buffer, so
//! builders can be called from any thread without coordination.

pub mod barcode;
pub mod commands;
pub mod graphics;
pub mod template;
pub mod text;

pub use commands::build;
pub use template::{Command, CommandTemplate, ParamSlot, ValidRange};

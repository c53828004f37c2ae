//! # Bluberry - Receipt Scripts for ESC/POS Printers
//!
//! Bluberry turns section-tagged receipt text into ESC/POS command streams
//! and delivers them to Bluetooth thermal printers in small, paced frames.
//! It provides:
//!
//! - **Protocol**: a table of parameterized ESC/POS command templates
//! - **Raster encoding**: 1-bit bitmaps to `GS v 0` images
//! - **Receipt scripts**: a parser and compiler for sectioned receipt text
//! - **Transport**: chunked, paced delivery over RFCOMM
//!
//! ## Quick Start
//!
//! ```no_run
//! use bluberry::{
//!     printer::PrintSettings,
//!     receipt::{CompileOptions, compile_receipt},
//!     render::BitmapFontRasterizer,
//!     transport::{DeviceDirectory, RfcommDirectory, TransportSession},
//! };
//!
//! let settings = PrintSettings::default();
//! let options = CompileOptions {
//!     printable_width: settings.printable_width(),
//!     ..CompileOptions::default()
//! };
//!
//! let script = "타이틀, 24\n블루베리 카페\n\n줄바꿈, 3\n영수증 자르기";
//! let rasterizer = BitmapFontRasterizer::new(settings.printable_width());
//! let stream = compile_receipt(script, rasterizer, options)?;
//!
//! let directory = RfcommDirectory::default();
//! let channel = directory.connect("/dev/rfcomm0")?;
//! let mut session = TransportSession::with_settings(channel, &settings);
//! session.send(&stream)?;
//! directory.disconnect(session.into_channel())?;
//!
//! # Ok::<(), bluberry::BluberryError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS command templates and raster encoding |
//! | [`render`] | Bitmaps and text rasterizers |
//! | [`receipt`] | Script model, parser and compiler |
//! | [`transport`] | Channels, framing and RFCOMM |
//! | [`printer`] | Printer profiles and settings |
//! | [`error`] | Error types |

pub mod error;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::{BluberryError, Result};
pub use printer::{PrintSettings, PrinterConfig};
pub use receipt::{CommandStream, ReceiptScript};

//! # Printer Module
//!
//! Hardware profiles and per-printer settings.
//!
//! ## Modules
//!
//! - [`config`]: [`PrinterConfig`] profiles and [`PrintSettings`]

pub mod config;

pub use config::{PrintSettings, PrinterConfig};

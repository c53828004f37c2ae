//! # Printer Transport Layer
//!
//! This module delivers compiled command streams to printers over links that
//! only accept small writes and never acknowledge them.
//!
//! ## Pieces
//!
//! - [`Channel`]: a write-only byte pipe to one printer
//! - [`DeviceDirectory`]: opens and closes channels by address
//! - [`framer`]: splits a stream into bounded frames and paces their delivery
//! - [`bluetooth`]: RFCOMM serial channels (Linux)
//!
//! ```text
//! CommandStream ──► TransportSession ──► frame, sleep, frame, ... ──► Channel
//!                   (max_frame_bytes,
//!                    inter_frame_delay)
//! ```

pub mod bluetooth;
pub mod framer;

use std::io;

pub use bluetooth::{RfcommChannel, RfcommDirectory};
pub use framer::{AbortHandle, SendReport, SessionState, TransportSession, print_command_stream};

/// A write-only link to a printer.
///
/// Each call writes one bounded frame. There is no partial-write contract:
/// a frame is either written in full or the call fails.
pub trait Channel {
    fn write(&mut self, frame: &[u8]) -> io::Result<()>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn write(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).write(frame)
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn write(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).write(frame)
    }
}

/// Opens channels to printers by address.
///
/// Pairing and discovery happen outside this crate; an address is whatever
/// the directory understands (a device path, a Bluetooth MAC).
pub trait DeviceDirectory {
    type Channel: Channel;

    fn connect(&self, address: &str) -> crate::Result<Self::Channel>;

    fn disconnect(&self, channel: Self::Channel) -> crate::Result<()>;
}

//! # Chunked Transport Framer
//!
//! Splits a command stream into frames of at most `max_frame_bytes` and
//! writes them strictly in order, sleeping `inter_frame_delay` between
//! consecutive writes. The pause is pacing, not an acknowledgment wait: the
//! link never confirms delivery, so the delay is what keeps the printer's
//! receive buffer from overrunning.
//!
//! ## Session States
//!
//! ```text
//!            send()              all frames written
//!   Idle ───────────► Sending ─────────────────────► Complete ──┐
//!                        │                              ▲       │ send()
//!                        │ write error / abort          └───────┘
//!                        ▼
//!                      Failed   (every later send() → SessionFailed)
//! ```
//!
//! A failed send is never retried or resumed. The error reports how many
//! bytes reached the channel; resending from scratch on a new session is the
//! caller's decision.
//!
//! ## Exclusivity
//!
//! [`TransportSession::send`] takes `&mut self`, so the borrow checker rules
//! out two sends in flight on one session. Aborting from another thread goes
//! through an [`AbortHandle`], which is only checked between frames.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::Channel;
use crate::error::{BluberryError, Result, SendFault};
use crate::printer::PrintSettings;
use crate::receipt::CommandStream;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Complete,
    Failed,
}

/// Outcome of a completed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Every byte of the stream, handed to the channel in order.
    pub bytes_sent: usize,
    pub frames: usize,
}

/// Requests that an in-progress send stop before its next frame.
///
/// Cloneable and `Send`, so a signal handler or UI thread can hold one.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Number of frames a stream of `len` bytes is split into.
#[inline]
pub fn frame_count(len: usize, max_frame_bytes: NonZeroUsize) -> usize {
    len.div_ceil(max_frame_bytes.get())
}

/// An exclusively owned channel plus its framing parameters.
pub struct TransportSession<C: Channel> {
    channel: C,
    max_frame_bytes: NonZeroUsize,
    inter_frame_delay: Duration,
    state: SessionState,
    abort: AbortHandle,
    pause: fn(Duration),
}

impl<C: Channel> TransportSession<C> {
    pub fn new(channel: C, max_frame_bytes: NonZeroUsize, inter_frame_delay: Duration) -> Self {
        Self {
            channel,
            max_frame_bytes,
            inter_frame_delay,
            state: SessionState::Idle,
            abort: AbortHandle::default(),
            pause: thread::sleep,
        }
    }

    /// Session using the frame size and delay from `settings`.
    pub fn with_settings(channel: C, settings: &PrintSettings) -> Self {
        Self::new(channel, settings.max_frame_bytes, settings.inter_frame_delay)
    }

    /// Replace the blocking sleep used between frames.
    pub fn with_pause(mut self, pause: fn(Duration)) -> Self {
        self.pause = pause;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn max_frame_bytes(&self) -> NonZeroUsize {
        self.max_frame_bytes
    }

    pub fn inter_frame_delay(&self) -> Duration {
        self.inter_frame_delay
    }

    /// A handle that aborts sends on this session.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Release the channel, e.g. to hand it back to its directory.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Send a compiled stream.
    pub fn send(&mut self, stream: &CommandStream) -> Result<SendReport> {
        self.send_bytes(&stream.to_bytes())
    }

    /// Send raw bytes as frames.
    ///
    /// Frame `i + 1` is written only after the write of frame `i` returned.
    /// On the first failed write the session becomes `Failed` and the error
    /// carries the number of bytes already written.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<SendReport> {
        if self.state == SessionState::Failed {
            return Err(BluberryError::SessionFailed);
        }
        self.state = SessionState::Sending;

        let total_frames = frame_count(bytes.len(), self.max_frame_bytes);
        debug!(
            bytes = bytes.len(),
            frames = total_frames,
            max_frame_bytes = self.max_frame_bytes.get(),
            delay_ms = self.inter_frame_delay.as_millis() as u64,
            "sending stream"
        );

        let mut bytes_sent = 0;
        for (index, frame) in bytes.chunks(self.max_frame_bytes.get()).enumerate() {
            if index > 0 && !self.inter_frame_delay.is_zero() {
                (self.pause)(self.inter_frame_delay);
            }

            if self.abort.is_aborted() {
                return Err(self.fail(bytes_sent, SendFault::Aborted));
            }

            if let Err(e) = self.channel.write(frame) {
                return Err(self.fail(bytes_sent, SendFault::Write(e)));
            }
            bytes_sent += frame.len();
            trace!(index, len = frame.len(), bytes_sent, "frame written");
        }

        self.state = SessionState::Complete;
        info!(bytes_sent, frames = total_frames, "stream delivered");
        Ok(SendReport {
            bytes_sent,
            frames: total_frames,
        })
    }

    fn fail(&mut self, bytes_sent: usize, cause: SendFault) -> BluberryError {
        self.state = SessionState::Failed;
        warn!(bytes_sent, %cause, "send stopped");
        BluberryError::PartialSend { bytes_sent, cause }
    }
}

/// Deliver a compiled stream over a session: the single entry point from
/// bytes to printer.
pub fn print_command_stream<C: Channel>(
    stream: &CommandStream,
    session: &mut TransportSession<C>,
) -> Result<SendReport> {
    session.send(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, OnceCell};
    use std::io;
    use std::rc::Rc;

    /// Records frames; fails the `fail_on`-th write (1-based).
    #[derive(Default)]
    struct MockChannel {
        frames: Vec<Vec<u8>>,
        writes: usize,
        fail_on: Option<usize>,
    }

    impl Channel for MockChannel {
        fn write(&mut self, frame: &[u8]) -> io::Result<()> {
            self.writes += 1;
            if self.fail_on == Some(self.writes) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link lost"));
            }
            self.frames.push(frame.to_vec());
            Ok(())
        }
    }

    thread_local! {
        static PAUSES: Cell<usize> = const { Cell::new(0) };
    }

    fn count_pause(_: Duration) {
        PAUSES.with(|p| p.set(p.get() + 1));
    }

    fn session(channel: MockChannel, frame: usize) -> TransportSession<MockChannel> {
        TransportSession::new(channel, NonZeroUsize::new(frame).unwrap(), Duration::ZERO)
    }

    #[test]
    fn test_frames_reassemble() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        for frame in [1, 7, 20, 512, 1000, 4096] {
            let mut s = session(MockChannel::default(), frame);
            let report = s.send_bytes(&data).unwrap();

            let channel = s.into_channel();
            assert_eq!(report.frames, data.len().div_ceil(frame));
            assert_eq!(channel.frames.len(), report.frames);
            assert!(channel.frames[..channel.frames.len() - 1]
                .iter()
                .all(|f| f.len() == frame));
            assert_eq!(channel.frames.concat(), data);
            assert_eq!(report.bytes_sent, data.len());
        }
    }

    #[test]
    fn test_partial_send_stops_at_failed_write() {
        let channel = MockChannel {
            fail_on: Some(3),
            ..Default::default()
        };
        let mut s = session(channel, 20);
        let err = s.send_bytes(&[0xAB; 100]).unwrap_err();

        match err {
            BluberryError::PartialSend {
                bytes_sent,
                cause: SendFault::Write(e),
            } => {
                assert_eq!(bytes_sent, 40);
                assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(s.state(), SessionState::Failed);
        assert_eq!(s.into_channel().writes, 3);
    }

    #[test]
    fn test_failed_session_rejects_sends() {
        let channel = MockChannel {
            fail_on: Some(1),
            ..Default::default()
        };
        let mut s = session(channel, 20);
        assert!(s.send_bytes(&[0; 10]).is_err());
        assert!(matches!(s.send_bytes(&[0; 10]), Err(BluberryError::SessionFailed)));
        assert_eq!(s.into_channel().writes, 1);
    }

    #[test]
    fn test_abort_between_frames() {
        let mut s = session(MockChannel::default(), 20);
        let handle = s.abort_handle();
        handle.abort();
        let err = s.send_bytes(&[0; 50]).unwrap_err();
        assert!(matches!(
            err,
            BluberryError::PartialSend {
                bytes_sent: 0,
                cause: SendFault::Aborted
            }
        ));
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.into_channel().frames.is_empty());
    }

    /// Trips the session's abort handle once `after` writes have landed.
    struct AbortingChannel {
        inner: MockChannel,
        handle: Rc<OnceCell<AbortHandle>>,
        after: usize,
    }

    impl Channel for AbortingChannel {
        fn write(&mut self, frame: &[u8]) -> io::Result<()> {
            self.inner.write(frame)?;
            if self.inner.writes == self.after {
                if let Some(handle) = self.handle.get() {
                    handle.abort();
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_abort_mid_stream_keeps_delivered_frames() {
        let handle = Rc::new(OnceCell::new());
        let channel = AbortingChannel {
            inner: MockChannel::default(),
            handle: Rc::clone(&handle),
            after: 2,
        };
        let mut s = TransportSession::new(channel, NonZeroUsize::new(20).unwrap(), Duration::ZERO);
        let _ = handle.set(s.abort_handle());

        let data: Vec<u8> = (0..100).collect();
        let err = s.send_bytes(&data).unwrap_err();
        assert!(matches!(
            err,
            BluberryError::PartialSend {
                bytes_sent: 40,
                cause: SendFault::Aborted
            }
        ));
        assert_eq!(s.state(), SessionState::Failed);
        assert!(matches!(s.send_bytes(&data), Err(BluberryError::SessionFailed)));

        let channel = s.into_channel().inner;
        assert_eq!(channel.writes, 2);
        assert_eq!(channel.frames.concat(), data[..40].to_vec());
    }

    #[test]
    fn test_pauses_only_between_frames() {
        PAUSES.with(|p| p.set(0));
        let mut s = TransportSession::new(
            MockChannel::default(),
            NonZeroUsize::new(20).unwrap(),
            Duration::from_millis(20),
        )
        .with_pause(count_pause);
        s.send_bytes(&[1; 100]).unwrap();
        assert_eq!(PAUSES.with(Cell::get), 4);
    }

    #[test]
    fn test_zero_delay_never_pauses() {
        PAUSES.with(|p| p.set(0));
        let mut s = session(MockChannel::default(), 10).with_pause(count_pause);
        s.send_bytes(&[1; 100]).unwrap();
        assert_eq!(PAUSES.with(Cell::get), 0);
    }

    #[test]
    fn test_states() {
        let mut s = session(MockChannel::default(), 20);
        assert_eq!(s.state(), SessionState::Idle);
        s.send_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(s.state(), SessionState::Complete);
        // A complete session accepts the next print.
        s.send_bytes(&[4]).unwrap();
        assert_eq!(s.into_channel().frames, vec![vec![1, 2, 3], vec![4]]);
    }

    #[test]
    fn test_empty_stream() {
        let mut s = session(MockChannel::default(), 20);
        let report = s.send_bytes(&[]).unwrap();
        assert_eq!(report, SendReport { bytes_sent: 0, frames: 0 });
        assert_eq!(s.into_channel().writes, 0);
    }

    #[test]
    fn test_frame_count() {
        let f = NonZeroUsize::new(20).unwrap();
        assert_eq!(frame_count(0, f), 0);
        assert_eq!(frame_count(1, f), 1);
        assert_eq!(frame_count(20, f), 1);
        assert_eq!(frame_count(21, f), 2);
        assert_eq!(frame_count(100, f), 5);
    }
}

//! Outbound transport seam
//!
//! The surface never talks to midir directly. Every state change is handed to
//! a [`MidiSink`], so the same code drives real hardware
//! ([`crate::midi::MidirSink`]), dry runs and tests ([`RecordingSink`]).

use crate::error::SurfaceError;
use crate::message::WireMessage;

/// The "send raw message" primitive
///
/// Sends are fire-and-forget: a failure is reported once and never retried.
pub trait MidiSink {
    fn send(&mut self, message: WireMessage) -> Result<(), SurfaceError>;
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn send(&mut self, message: WireMessage) -> Result<(), SurfaceError> {
        (**self).send(message)
    }
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, message: WireMessage) -> Result<(), SurfaceError> {
        (**self).send(message)
    }
}

/// Sink that keeps every message it is given
///
/// Can be told to reject sends to exercise transport failure paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Vec<WireMessage>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every send fails with `SurfaceError::Transport`
    pub fn failing() -> Self {
        Self {
            sent: Vec::new(),
            failing: true,
        }
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// All messages sent so far, oldest first
    pub fn messages(&self) -> &[WireMessage] {
        &self.sent
    }

    pub fn last(&self) -> Option<WireMessage> {
        self.sent.last().copied()
    }

    /// Take the recorded messages, leaving the sink empty
    pub fn take(&mut self) -> Vec<WireMessage> {
        std::mem::take(&mut self.sent)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl MidiSink for RecordingSink {
    fn send(&mut self, message: WireMessage) -> Result<(), SurfaceError> {
        if self.failing {
            return Err(SurfaceError::Transport("recording sink set to fail".to_string()));
        }
        self.sent.push(message);
        Ok(())
    }
}

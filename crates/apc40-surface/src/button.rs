//! Note-addressed buttons with a single LED
//!
//! Buttons are binary: `on()` sends a Note On, `off()` sends a Note Off. The
//! Note On velocity is a per-button setting because the APC40 reads it as the
//! LED state; see [`DEFAULT_ON_VELOCITY`].

use crate::error::SurfaceError;
use crate::message::WireMessage;
use crate::transport::MidiSink;

/// Velocity sent with Note On when lighting a button
///
/// Zero is what the light-show scripts have always sent. The device treats a
/// zero-velocity Note On as "off" for most buttons, so profiles that need the
/// LED lit should set `button_on_velocity` in the driver config (usually 127).
pub const DEFAULT_ON_VELOCITY: u8 = 0;

/// The four light-up buttons under the track control knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackControlButton {
    Pan,
    SendA,
    SendB,
    SendC,
}

impl TrackControlButton {
    pub const ALL: [TrackControlButton; 4] = [
        TrackControlButton::Pan,
        TrackControlButton::SendA,
        TrackControlButton::SendB,
        TrackControlButton::SendC,
    ];

    /// MIDI channel the buttons live on
    pub const CHANNEL: u8 = 0;

    pub fn note(self) -> u8 {
        match self {
            Self::Pan => 0x57,
            Self::SendA => 0x58,
            Self::SendB => 0x59,
            Self::SendC => 0x5A,
        }
    }

    pub fn from_note(note: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|button| button.note() == note)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Pan => 0,
            Self::SendA => 1,
            Self::SendB => 2,
            Self::SendC => 3,
        }
    }
}

/// LED and press state of one button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    /// MIDI channel (0-15)
    channel: u8,
    /// Note number (0-127)
    note: u8,
    /// Velocity sent by `on()`
    on_velocity: u8,
    /// LED state as last sent
    is_on: bool,
    /// Physical press state as last reported by the device
    is_pressed: bool,
}

impl ButtonState {
    pub fn new(channel: u8, note: u8) -> Self {
        Self {
            channel: channel & 0x0F,
            note: note & 0x7F,
            on_velocity: DEFAULT_ON_VELOCITY,
            is_on: false,
            is_pressed: false,
        }
    }

    /// Override the Note On velocity (masked to 7 bits)
    pub fn with_on_velocity(mut self, velocity: u8) -> Self {
        self.on_velocity = velocity & 0x7F;
        self
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn on_velocity(&self) -> u8 {
        self.on_velocity
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn is_pressed(&self) -> bool {
        self.is_pressed
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.is_pressed = pressed;
    }

    /// Light the button: `(0x90 + channel, note, on_velocity)`
    pub fn on<S: MidiSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SurfaceError> {
        sink.send(WireMessage::note_on(self.channel, self.note, self.on_velocity))?;
        self.is_on = true;
        Ok(())
    }

    /// Unlight the button: `(0x80 + channel, note, 0)`
    pub fn off<S: MidiSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SurfaceError> {
        sink.send(WireMessage::note_off(self.channel, self.note))?;
        self.is_on = false;
        Ok(())
    }
}

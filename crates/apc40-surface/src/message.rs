//! Wire messages
//!
//! Outbound traffic is always a 3-byte [`WireMessage`]. Inbound bytes from the
//! midir callback are parsed with midly into an [`InboundEvent`].

use crate::address::{NOTE_OFF_STATUS_BASE, NOTE_ON_STATUS_BASE};
use midly::live::LiveEvent;
use midly::MidiMessage;
use std::fmt;

/// Immutable 3-byte MIDI message: `[status, data1, data2]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireMessage([u8; 3]);

impl WireMessage {
    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self([status, data1, data2])
    }

    /// Control Change on an already-resolved status byte (`0xB0 + channel`)
    pub const fn control_change(status: u8, controller: u8, value: u8) -> Self {
        Self::new(status, controller, value)
    }

    /// Note On for a 0-based channel
    pub const fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(NOTE_ON_STATUS_BASE | (channel & 0x0F), note, velocity)
    }

    /// Note Off for a 0-based channel (release velocity 0)
    pub const fn note_off(channel: u8, note: u8) -> Self {
        Self::new(NOTE_OFF_STATUS_BASE | (channel & 0x0F), note, 0)
    }

    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    pub fn status(&self) -> u8 {
        self.0[0]
    }

    pub fn data1(&self) -> u8 {
        self.0[1]
    }

    pub fn data2(&self) -> u8 {
        self.0[2]
    }
}

impl From<WireMessage> for [u8; 3] {
    fn from(message: WireMessage) -> Self {
        message.0
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#04x} {:#04x} {:#04x}]", self.0[0], self.0[1], self.0[2])
    }
}

/// Decoded inbound channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// Note On with non-zero velocity
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off, or Note On with velocity 0
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl InboundKind {
    /// Get the MIDI channel (0-15)
    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. } => *channel,
            Self::NoteOff { channel, .. } => *channel,
            Self::ControlChange { channel, .. } => *channel,
        }
    }
}

/// Inbound event as delivered by the transport callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InboundEvent {
    pub kind: InboundKind,
    /// Seconds since the previous inbound event (0.0 for the first one)
    pub delta_time: f64,
}

impl InboundEvent {
    pub fn new(kind: InboundKind, delta_time: f64) -> Self {
        Self { kind, delta_time }
    }

    /// Parse raw MIDI bytes into an event
    ///
    /// Returns `None` for anything other than Note On/Off and Control Change
    /// (SysEx, clock, pitch bend, aftertouch, truncated messages).
    pub fn parse(data: &[u8], delta_time: f64) -> Option<Self> {
        let LiveEvent::Midi { channel, message } = LiveEvent::parse(data).ok()? else {
            return None;
        };
        let channel = channel.as_int();

        let kind = match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => InboundKind::NoteOff {
                channel,
                note: key.as_int(),
                velocity: 0,
            },
            MidiMessage::NoteOn { key, vel } => InboundKind::NoteOn {
                channel,
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => InboundKind::NoteOff {
                channel,
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::Controller { controller, value } => InboundKind::ControlChange {
                channel,
                controller: controller.as_int(),
                value: value.as_int(),
            },
            _ => return None,
        };

        Some(Self::new(kind, delta_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_constructors() {
        assert_eq!(WireMessage::note_on(3, 0x57, 0).as_bytes(), &[0x93, 0x57, 0]);
        assert_eq!(WireMessage::note_off(3, 0x57).as_bytes(), &[0x83, 0x57, 0]);
    }

    #[test]
    fn test_display() {
        let message = WireMessage::control_change(0xB1, 0x10, 0x40);
        assert_eq!(message.to_string(), "[0xb1 0x10 0x40]");
    }

    #[test]
    fn test_parse_note_on() {
        let event = InboundEvent::parse(&[0x92, 0x35, 0x7F], 0.25).unwrap();
        assert_eq!(
            event.kind,
            InboundKind::NoteOn { channel: 2, note: 0x35, velocity: 0x7F }
        );
        assert_eq!(event.delta_time, 0.25);
    }

    #[test]
    fn test_parse_note_on_zero_velocity() {
        // Note On with velocity 0 is a release
        let event = InboundEvent::parse(&[0x90, 0x57, 0x00], 0.0).unwrap();
        assert_eq!(
            event.kind,
            InboundKind::NoteOff { channel: 0, note: 0x57, velocity: 0 }
        );
    }

    #[test]
    fn test_parse_note_off() {
        let event = InboundEvent::parse(&[0x87, 0x39, 0x40], 0.0).unwrap();
        assert_eq!(
            event.kind,
            InboundKind::NoteOff { channel: 7, note: 0x39, velocity: 0x40 }
        );
    }

    #[test]
    fn test_parse_cc() {
        let event = InboundEvent::parse(&[0xB5, 0x30, 0x64], 0.0).unwrap();
        assert_eq!(
            event.kind,
            InboundKind::ControlChange { channel: 5, controller: 0x30, value: 0x64 }
        );
        assert_eq!(event.kind.channel(), 5);
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        // Pitch bend
        assert!(InboundEvent::parse(&[0xE0, 0x00, 0x40], 0.0).is_none());
        // Truncated CC
        assert!(InboundEvent::parse(&[0xB0, 0x10], 0.0).is_none());
        assert!(InboundEvent::parse(&[], 0.0).is_none());
    }
}

//! Knob position and LED ring state
//!
//! One [`KnobState`] covers a single knob identity (controller id) across all
//! eight tracks. The value stored per track is whatever was last committed to
//! the transport; there is no read-back from the device.

use crate::address::{
    check_track, check_value, knob_channel, knob_led_controller, CC_STATUS_BASE, CONTROLLER_MAX,
    TRACK_COUNT,
};
use crate::error::SurfaceError;
use crate::message::WireMessage;
use crate::transport::MidiSink;
use serde::{Deserialize, Serialize};

/// LED ring display style, sent on the knob's LED ring controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedRingMode {
    /// Ring dark
    Off,
    /// Single lit LED at the position
    #[default]
    Single,
    /// Filled from the left up to the position
    Volume,
    /// Filled from the center out to the position
    Pan,
}

impl LedRingMode {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Single => 1,
            Self::Volume => 2,
            Self::Pan => 3,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, SurfaceError> {
        match byte {
            0 => Ok(Self::Off),
            1 => Ok(Self::Single),
            2 => Ok(Self::Volume),
            3 => Ok(Self::Pan),
            other => Err(SurfaceError::out_of_range("LED ring mode", other as usize)),
        }
    }
}

/// Per-track state of one knob identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnobState {
    /// Value controller number (e.g. 0x10 for the first device control knob)
    controller_id: u8,
    /// Last committed position per track
    positions: [u8; TRACK_COUNT],
    /// Last ring mode sent
    led_ring_mode: LedRingMode,
}

impl KnobState {
    pub fn new(controller_id: u8) -> Self {
        Self {
            controller_id,
            positions: [0; TRACK_COUNT],
            led_ring_mode: LedRingMode::default(),
        }
    }

    pub fn controller_id(&self) -> u8 {
        self.controller_id
    }

    /// LED ring sibling controller (`controller_id + 8`)
    pub fn led_controller_id(&self) -> u8 {
        knob_led_controller(self.controller_id)
    }

    pub fn led_ring_mode(&self) -> LedRingMode {
        self.led_ring_mode
    }

    /// Last committed position for a track
    pub fn position(&self, track: usize) -> Result<u8, SurfaceError> {
        check_track(track)?;
        Ok(self.positions[track])
    }

    pub fn positions(&self) -> &[u8; TRACK_COUNT] {
        &self.positions
    }

    /// Move the knob on `track` to `value`
    ///
    /// Sends `(0xB0 + track, controller_id, value)`. Both arguments are
    /// checked before sending; the stored position only changes once the send
    /// succeeded.
    pub fn set_position<S: MidiSink + ?Sized>(
        &mut self,
        sink: &mut S,
        track: usize,
        value: u8,
    ) -> Result<(), SurfaceError> {
        let status = knob_channel(CC_STATUS_BASE, track)?;
        check_value(value)?;

        sink.send(WireMessage::control_change(status, self.controller_id, value))?;
        self.positions[track] = value;
        Ok(())
    }

    /// Change the LED ring display style on `track`
    ///
    /// Leaves the stored position alone.
    pub fn set_led_ring_type<S: MidiSink + ?Sized>(
        &mut self,
        sink: &mut S,
        track: usize,
        mode: LedRingMode,
    ) -> Result<(), SurfaceError> {
        let status = knob_channel(CC_STATUS_BASE, track)?;

        sink.send(WireMessage::control_change(
            status,
            self.led_controller_id(),
            mode.as_byte(),
        ))?;
        self.led_ring_mode = mode;
        Ok(())
    }

    /// Raise the position by `delta`, pinning at 127
    ///
    /// Always sends, even when already at the rail. Returns the committed value.
    pub fn add_saturate<S: MidiSink + ?Sized>(
        &mut self,
        sink: &mut S,
        track: usize,
        delta: u32,
    ) -> Result<u8, SurfaceError> {
        let current = self.position(track)? as u32;
        let next = current.saturating_add(delta).min(CONTROLLER_MAX as u32) as u8;
        self.set_position(sink, track, next)?;
        Ok(next)
    }

    /// Lower the position by `delta`, pinning at 0
    ///
    /// Always sends, even when already at the rail. Returns the committed value.
    pub fn sub_saturate<S: MidiSink + ?Sized>(
        &mut self,
        sink: &mut S,
        track: usize,
        delta: u32,
    ) -> Result<u8, SurfaceError> {
        let current = self.position(track)? as u32;
        let next = current.saturating_sub(delta) as u8;
        self.set_position(sink, track, next)?;
        Ok(next)
    }

    /// Record a position reported by the hardware (knob turned by hand)
    ///
    /// Nothing is sent: the device already shows this value.
    pub fn sync_position(&mut self, track: usize, value: u8) -> Result<(), SurfaceError> {
        check_track(track)?;
        check_value(value)?;
        self.positions[track] = value;
        Ok(())
    }
}

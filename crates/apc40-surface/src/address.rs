//! APC40 address map
//!
//! Stateless translation between logical control addresses (track strip,
//! knob bank slot, 1-indexed clip grid cell) and the MIDI wire encoding.
//!
//! Wire layout:
//! - Knob value: CC on status `0xB0 + track`, controller = knob id
//! - Knob LED ring mode: CC on the same status, controller = knob id + 8
//! - Clip launch LED: Note On on status `0x90 + (x - 1)`, note = `0x35 + (y - 1)`
//!
//! Grid coordinates are always 1-indexed at this boundary. The 0-indexed
//! offset is folded into the channel and note numbers here and nowhere else.

use crate::error::SurfaceError;

/// Number of channel strips (one MIDI channel each)
pub const TRACK_COUNT: usize = 8;

/// Knobs per bank (device control and track control each have 8)
pub const KNOBS_PER_BANK: usize = 8;

/// Control Change status byte for channel 0
pub const CC_STATUS_BASE: u8 = 0xB0;

/// Note On status byte for channel 0
pub const NOTE_ON_STATUS_BASE: u8 = 0x90;

/// Note Off status byte for channel 0
pub const NOTE_OFF_STATUS_BASE: u8 = 0x80;

/// Offset from a knob's value controller to its LED ring controller
pub const LED_RING_OFFSET: u8 = 0x08;

/// Note of the top clip launch row (y = 1)
pub const CLIP_LAUNCH_BASE: u8 = 0x35;

/// First device control knob controller
pub const DEVICE_CONTROL_KNOB_BASE: u8 = 0x10;

/// First track control knob controller
pub const TRACK_CONTROL_KNOB_BASE: u8 = 0x30;

/// Clip grid width (tracks)
pub const GRID_COLUMNS: u8 = 8;

/// Clip grid height (scenes)
pub const GRID_ROWS: u8 = 5;

/// Largest 7-bit MIDI data value
pub const CONTROLLER_MAX: u8 = 127;

/// Positions above this rise, positions at or below it fall
pub const MIDPOINT: u8 = 63;

/// Which of the two knob banks a knob belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnobBank {
    /// Device control knobs (right side, controllers 0x10-0x17)
    DeviceControl,
    /// Track control knobs (top row, controllers 0x30-0x37)
    TrackControl,
}

impl KnobBank {
    pub const ALL: [KnobBank; 2] = [KnobBank::DeviceControl, KnobBank::TrackControl];

    /// First controller id in this bank
    pub fn base(self) -> u8 {
        match self {
            Self::DeviceControl => DEVICE_CONTROL_KNOB_BASE,
            Self::TrackControl => TRACK_CONTROL_KNOB_BASE,
        }
    }

    /// Controller id of the knob at `index` (0-7) within this bank
    pub fn controller_id(self, index: usize) -> Result<u8, SurfaceError> {
        if index >= KNOBS_PER_BANK {
            return Err(SurfaceError::out_of_range("knob index", index));
        }
        Ok(self.base() + index as u8)
    }
}

/// Reject track indices outside 0-7
pub fn check_track(track: usize) -> Result<(), SurfaceError> {
    if track >= TRACK_COUNT {
        return Err(SurfaceError::out_of_range("track", track));
    }
    Ok(())
}

/// Reject values that don't fit in a 7-bit data byte
pub fn check_value(value: u8) -> Result<(), SurfaceError> {
    if value > CONTROLLER_MAX {
        return Err(SurfaceError::out_of_range("controller value", value as usize));
    }
    Ok(())
}

/// Status byte for a per-track message: `base_channel + track`
pub fn knob_channel(base_channel: u8, track: usize) -> Result<u8, SurfaceError> {
    check_track(track)?;
    Ok(base_channel + track as u8)
}

/// LED ring controller paired with a knob's value controller
pub fn knob_led_controller(knob_id: u8) -> u8 {
    knob_id + LED_RING_OFFSET
}

/// Resolve a 1-indexed clip grid cell to its (status, note) pair
///
/// # Arguments
/// * `x` - Column (track), 1-8
/// * `y` - Row (scene), 1-5
pub fn grid_address(x: u8, y: u8) -> Result<(u8, u8), SurfaceError> {
    if !(1..=GRID_COLUMNS).contains(&x) {
        return Err(SurfaceError::out_of_range("grid column", x as usize));
    }
    if !(1..=GRID_ROWS).contains(&y) {
        return Err(SurfaceError::out_of_range("grid row", y as usize));
    }
    let channel = NOTE_ON_STATUS_BASE + (x - 1);
    let note = CLIP_LAUNCH_BASE + (y - 1);
    Ok((channel, note))
}

/// Inverse of [`grid_address`]
///
/// Takes the channel nibble (0-15) and note of an inbound note message and
/// returns the 1-indexed cell, or `None` if it isn't a clip launch button.
pub fn grid_cell(channel: u8, note: u8) -> Option<(u8, u8)> {
    if channel >= GRID_COLUMNS {
        return None;
    }
    let row = note.checked_sub(CLIP_LAUNCH_BASE)?;
    if row >= GRID_ROWS {
        return None;
    }
    Some((channel + 1, row + 1))
}

/// Find the knob whose value controller is `controller`
pub fn knob_slot(controller: u8) -> Option<(KnobBank, usize)> {
    KnobBank::ALL.into_iter().find_map(|bank| {
        let index = controller.checked_sub(bank.base())? as usize;
        (index < KNOBS_PER_BANK).then_some((bank, index))
    })
}

/// Find the knob whose LED ring controller is `controller`
pub fn led_ring_slot(controller: u8) -> Option<(KnobBank, usize)> {
    knob_slot(controller.checked_sub(LED_RING_OFFSET)?)
}

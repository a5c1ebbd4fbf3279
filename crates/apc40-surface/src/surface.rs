//! Full APC40 surface model
//!
//! [`ControlSurface`] owns every stateful widget: two banks of eight knobs, the
//! clip launch grid and the track control buttons. The animation driver calls
//! [`ControlSurface::initialize`] once and [`ControlSurface::tick`] on every
//! timer tick; the MIDI input callback calls [`ControlSurface::handle_inbound`].

use crate::address::{check_track, grid_cell, knob_slot, KnobBank, KNOBS_PER_BANK};
use crate::button::{ButtonState, TrackControlButton, DEFAULT_ON_VELOCITY};
use crate::error::SurfaceError;
use crate::grid::ClipGrid;
use crate::knob::{KnobState, LedRingMode};
use crate::message::{InboundEvent, InboundKind};
use crate::oscillation::{
    step_knob, ColorSource, OddPaletteColors, RandomReseed, ReseedSource, StepOutcome,
    DEFAULT_STEP,
};
use crate::transport::MidiSink;
use std::ops::RangeInclusive;

/// Driver policy for the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOptions {
    /// Track (channel strip) the knob animation runs on
    pub animated_track: usize,
    /// Saturating delta applied per tick
    pub step: u32,
    /// Ring style for the device control knobs
    pub device_ring_mode: LedRingMode,
    /// Ring style for the track control knobs
    pub track_ring_mode: LedRingMode,
    /// Note On velocity for the track control buttons
    pub button_on_velocity: u8,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            animated_track: 0,
            step: DEFAULT_STEP,
            device_ring_mode: LedRingMode::Pan,
            track_ring_mode: LedRingMode::Single,
            button_on_velocity: DEFAULT_ON_VELOCITY,
        }
    }
}

/// Decoded meaning of an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A knob was turned by hand
    KnobTurned {
        bank: KnobBank,
        index: usize,
        track: usize,
        value: u8,
    },
    /// A clip launch button went down
    ClipPressed { x: u8, y: u8, velocity: u8 },
    /// A clip launch button came up
    ClipReleased { x: u8, y: u8 },
    /// A track control button went down
    ButtonPressed(TrackControlButton),
    /// A track control button came up
    ButtonReleased(TrackControlButton),
    /// Nothing on the surface owns this address
    Unmapped(InboundKind),
}

/// Result of one animation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Knobs that moved without hitting a rail
    pub moved: usize,
    /// Knobs that hit a rail and were reseeded
    pub reseeded: usize,
}

/// The whole device model
pub struct ControlSurface {
    device_knobs: [KnobState; KNOBS_PER_BANK],
    track_knobs: [KnobState; KNOBS_PER_BANK],
    grid: ClipGrid,
    buttons: [ButtonState; 4],
    options: SurfaceOptions,
    reseed: Box<dyn ReseedSource + Send>,
    colors: Box<dyn ColorSource + Send>,
}

impl ControlSurface {
    /// Create a surface with explicit reseed and color sources
    pub fn new(
        options: SurfaceOptions,
        reseed: Box<dyn ReseedSource + Send>,
        colors: Box<dyn ColorSource + Send>,
    ) -> Result<Self, SurfaceError> {
        check_track(options.animated_track)?;

        let buttons = TrackControlButton::ALL.map(|button| {
            ButtonState::new(TrackControlButton::CHANNEL, button.note())
                .with_on_velocity(options.button_on_velocity)
        });

        Ok(Self {
            device_knobs: std::array::from_fn(|i| {
                KnobState::new(KnobBank::DeviceControl.base() + i as u8)
            }),
            track_knobs: std::array::from_fn(|i| {
                KnobState::new(KnobBank::TrackControl.base() + i as u8)
            }),
            grid: ClipGrid::new(),
            buttons,
            options,
            reseed,
            colors,
        })
    }

    /// Create a surface with random reseeds over `reseed_range` and random odd colors
    pub fn with_random_policy(
        options: SurfaceOptions,
        reseed_range: RangeInclusive<u8>,
    ) -> Result<Self, SurfaceError> {
        let reseed = RandomReseed::new(reseed_range)?;
        Self::new(options, Box::new(reseed), Box::new(OddPaletteColors::new()))
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    fn bank(&self, bank: KnobBank) -> &[KnobState; KNOBS_PER_BANK] {
        match bank {
            KnobBank::DeviceControl => &self.device_knobs,
            KnobBank::TrackControl => &self.track_knobs,
        }
    }

    fn bank_mut(&mut self, bank: KnobBank) -> &mut [KnobState; KNOBS_PER_BANK] {
        match bank {
            KnobBank::DeviceControl => &mut self.device_knobs,
            KnobBank::TrackControl => &mut self.track_knobs,
        }
    }

    pub fn knob(&self, bank: KnobBank, index: usize) -> Option<&KnobState> {
        self.bank(bank).get(index)
    }

    pub fn knob_mut(&mut self, bank: KnobBank, index: usize) -> Option<&mut KnobState> {
        self.bank_mut(bank).get_mut(index)
    }

    pub fn grid(&self) -> &ClipGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ClipGrid {
        &mut self.grid
    }

    pub fn button(&self, button: TrackControlButton) -> &ButtonState {
        &self.buttons[button.index()]
    }

    pub fn button_mut(&mut self, button: TrackControlButton) -> &mut ButtonState {
        &mut self.buttons[button.index()]
    }

    /// Send the initial ring style and a starting position for every knob
    ///
    /// Knobs are set up pairwise (device control i, then track control i) on
    /// the animated track. Starting positions come from the reseed source.
    pub fn initialize<S: MidiSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SurfaceError> {
        let track = self.options.animated_track;
        let device_mode = self.options.device_ring_mode;
        let track_mode = self.options.track_ring_mode;

        for i in 0..KNOBS_PER_BANK {
            let knob = &mut self.device_knobs[i];
            knob.set_led_ring_type(sink, track, device_mode)?;
            knob.set_position(sink, track, self.reseed.reseed())?;

            let knob = &mut self.track_knobs[i];
            knob.set_led_ring_type(sink, track, track_mode)?;
            knob.set_position(sink, track, self.reseed.reseed())?;
        }

        log::info!(
            "APC40: Surface initialized on track {} ({} knobs)",
            track,
            KNOBS_PER_BANK * 2
        );
        Ok(())
    }

    /// One animation step
    ///
    /// Refreshes the clip grid from the color source, then steps every device
    /// control knob and every track control knob once.
    pub fn tick<S: MidiSink + ?Sized>(&mut self, sink: &mut S) -> Result<TickSummary, SurfaceError> {
        let colors = &mut self.colors;
        self.grid.fill(sink, |x, y| colors.color(x, y))?;

        let track = self.options.animated_track;
        let step = self.options.step;
        let mut summary = TickSummary::default();

        for knob in self.device_knobs.iter_mut().chain(self.track_knobs.iter_mut()) {
            match step_knob(knob, sink, track, step, &mut *self.reseed)? {
                StepOutcome::Moved(_) => summary.moved += 1,
                StepOutcome::Reseeded(_) => summary.reseeded += 1,
            }
        }

        log::trace!(
            "APC40: Tick moved {} knobs, reseeded {}",
            summary.moved,
            summary.reseeded
        );
        Ok(summary)
    }

    /// Route an inbound message to the widget that owns its address
    ///
    /// Knob turns update the stored position without echoing anything back.
    pub fn handle_inbound(&mut self, event: &InboundEvent) -> SurfaceEvent {
        log::debug!("[MIDI IN] @{:.6} {:?}", event.delta_time, event.kind);

        let decoded = match event.kind {
            InboundKind::ControlChange {
                channel,
                controller,
                value,
            } => self.handle_knob(channel, controller, value),
            InboundKind::NoteOn {
                channel,
                note,
                velocity,
            } => self.handle_note(channel, note, Some(velocity)),
            InboundKind::NoteOff { channel, note, .. } => self.handle_note(channel, note, None),
        };

        let decoded = decoded.unwrap_or(SurfaceEvent::Unmapped(event.kind));
        log::debug!("[MIDI IN] -> {:?}", decoded);
        decoded
    }

    fn handle_knob(&mut self, channel: u8, controller: u8, value: u8) -> Option<SurfaceEvent> {
        let track = channel as usize;
        let (bank, index) = knob_slot(controller)?;
        let knob = self.knob_mut(bank, index)?;
        knob.sync_position(track, value).ok()?;
        Some(SurfaceEvent::KnobTurned {
            bank,
            index,
            track,
            value,
        })
    }

    fn handle_note(&mut self, channel: u8, note: u8, velocity: Option<u8>) -> Option<SurfaceEvent> {
        if let Some((x, y)) = grid_cell(channel, note) {
            return Some(match velocity {
                Some(velocity) => SurfaceEvent::ClipPressed { x, y, velocity },
                None => SurfaceEvent::ClipReleased { x, y },
            });
        }

        if channel != TrackControlButton::CHANNEL {
            return None;
        }
        let button = TrackControlButton::from_note(note)?;
        let pressed = velocity.is_some();
        self.button_mut(button).set_pressed(pressed);
        Some(if pressed {
            SurfaceEvent::ButtonPressed(button)
        } else {
            SurfaceEvent::ButtonReleased(button)
        })
    }
}

impl std::fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSurface")
            .field("device_knobs", &self.device_knobs)
            .field("track_knobs", &self.track_knobs)
            .field("grid", &self.grid)
            .field("buttons", &self.buttons)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::WireMessage;
    use crate::oscillation::{FixedColor, SequenceReseed};
    use crate::transport::RecordingSink;

    fn surface_with(reseeds: Vec<u8>) -> ControlSurface {
        let _ = env_logger::builder().is_test(true).try_init();
        ControlSurface::new(
            SurfaceOptions::default(),
            Box::new(SequenceReseed::new(reseeds)),
            Box::new(FixedColor(5)),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_animated_track() {
        let options = SurfaceOptions {
            animated_track: 8,
            ..SurfaceOptions::default()
        };
        let result = ControlSurface::new(
            options,
            Box::new(SequenceReseed::new(vec![60])),
            Box::new(FixedColor(1)),
        );
        assert!(result.unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_initialize_sends_ring_and_position_per_knob() {
        let mut surface = surface_with(vec![60]);
        let mut sink = RecordingSink::new();

        surface.initialize(&mut sink).unwrap();

        // 16 knobs, ring type + position each
        assert_eq!(sink.messages().len(), 32);
        assert_eq!(sink.messages()[0], WireMessage::new(0xB0, 0x18, 3));
        assert_eq!(sink.messages()[1], WireMessage::new(0xB0, 0x10, 60));
        assert_eq!(sink.messages()[2], WireMessage::new(0xB0, 0x38, 1));
        assert_eq!(sink.messages()[3], WireMessage::new(0xB0, 0x30, 60));

        for bank in KnobBank::ALL {
            for i in 0..KNOBS_PER_BANK {
                assert_eq!(surface.knob(bank, i).unwrap().position(0).unwrap(), 60);
            }
        }
    }

    #[test]
    fn test_tick_refreshes_grid_then_steps_knobs() {
        let mut surface = surface_with(vec![70]);
        let mut sink = RecordingSink::new();
        surface.initialize(&mut sink).unwrap();
        sink.clear();

        let summary = surface.tick(&mut sink).unwrap();

        assert_eq!(summary, TickSummary { moved: 16, reseeded: 0 });
        // 40 grid cells + 16 knob steps
        assert_eq!(sink.messages().len(), 56);
        assert_eq!(sink.messages()[0], WireMessage::new(0x90, 0x35, 5));
        assert_eq!(sink.messages()[40], WireMessage::new(0xB0, 0x10, 78));
        assert_eq!(surface.grid().color(8, 5).unwrap(), 5);
    }

    #[test]
    fn test_tick_reseeds_at_rails() {
        // Start every knob at 120, rising, so the first tick pins them at 127
        let mut seeds = vec![120; 16];
        seeds.push(58);
        let mut surface = surface_with(seeds);
        let mut sink = RecordingSink::new();
        surface.initialize(&mut sink).unwrap();
        sink.clear();

        let summary = surface.tick(&mut sink).unwrap();
        assert_eq!(summary.reseeded, 16);
        assert_eq!(
            surface.knob(KnobBank::DeviceControl, 0).unwrap().position(0).unwrap(),
            58
        );
        // 40 grid cells + 16 x (rail + reseed)
        assert_eq!(sink.messages().len(), 72);
    }

    #[test]
    fn test_tick_stops_on_transport_error() {
        let mut surface = surface_with(vec![60]);
        let mut sink = RecordingSink::failing();
        let err = surface.tick(&mut sink).unwrap_err();
        assert!(matches!(err, SurfaceError::Transport(_)));
    }

    #[test]
    fn test_handle_inbound_knob() {
        let mut surface = surface_with(vec![60]);
        let event = InboundEvent::parse(&[0xB3, 0x32, 99], 0.0).unwrap();

        let decoded = surface.handle_inbound(&event);
        assert_eq!(
            decoded,
            SurfaceEvent::KnobTurned {
                bank: KnobBank::TrackControl,
                index: 2,
                track: 3,
                value: 99,
            }
        );
        assert_eq!(
            surface.knob(KnobBank::TrackControl, 2).unwrap().position(3).unwrap(),
            99
        );
    }

    #[test]
    fn test_handle_inbound_clip() {
        let mut surface = surface_with(vec![60]);

        let press = InboundEvent::parse(&[0x97, 0x39, 0x7F], 0.0).unwrap();
        assert_eq!(
            surface.handle_inbound(&press),
            SurfaceEvent::ClipPressed { x: 8, y: 5, velocity: 0x7F }
        );

        let release = InboundEvent::parse(&[0x87, 0x39, 0x7F], 0.1).unwrap();
        assert_eq!(surface.handle_inbound(&release), SurfaceEvent::ClipReleased { x: 8, y: 5 });
    }

    #[test]
    fn test_handle_inbound_button() {
        let mut surface = surface_with(vec![60]);

        let press = InboundEvent::parse(&[0x90, 0x58, 0x7F], 0.0).unwrap();
        assert_eq!(
            surface.handle_inbound(&press),
            SurfaceEvent::ButtonPressed(TrackControlButton::SendA)
        );
        assert!(surface.button(TrackControlButton::SendA).is_pressed());

        let release = InboundEvent::parse(&[0x90, 0x58, 0x00], 0.0).unwrap();
        assert_eq!(
            surface.handle_inbound(&release),
            SurfaceEvent::ButtonReleased(TrackControlButton::SendA)
        );
        assert!(!surface.button(TrackControlButton::SendA).is_pressed());
    }

    #[test]
    fn test_handle_inbound_unmapped() {
        let mut surface = surface_with(vec![60]);

        // Crossfader CC
        let event = InboundEvent::parse(&[0xB0, 0x0F, 0x40], 0.0).unwrap();
        assert_eq!(surface.handle_inbound(&event), SurfaceEvent::Unmapped(event.kind));

        // Track control button note on a non-zero channel
        let event = InboundEvent::parse(&[0x93, 0x57, 0x7F], 0.0).unwrap();
        assert_eq!(surface.handle_inbound(&event), SurfaceEvent::Unmapped(event.kind));

        // Knob CC on a channel beyond the 8 strips
        let event = InboundEvent::parse(&[0xB9, 0x10, 0x40], 0.0).unwrap();
        assert_eq!(surface.handle_inbound(&event), SurfaceEvent::Unmapped(event.kind));
    }

    #[test]
    fn test_buttons_use_configured_velocity() {
        let options = SurfaceOptions {
            button_on_velocity: 127,
            ..SurfaceOptions::default()
        };
        let mut surface = ControlSurface::new(
            options,
            Box::new(SequenceReseed::new(vec![60])),
            Box::new(FixedColor(1)),
        )
        .unwrap();
        let mut sink = RecordingSink::new();

        surface.button_mut(TrackControlButton::SendC).on(&mut sink).unwrap();
        assert_eq!(sink.last(), Some(WireMessage::new(0x90, 0x5A, 127)));
        assert!(surface.button(TrackControlButton::SendC).is_on());
    }
}

//! Akai APC40 control surface support
//!
//! This crate provides:
//! - The APC40 address map (knob/grid/button addresses ⇄ MIDI channel and note/CC)
//! - Knob, button and clip grid state with saturating, bounds-checked updates
//! - Inbound message decoding via midly and dispatch to the owning widget
//! - MIDI port discovery and I/O via midir
//! - A YAML-backed driver config for the animation policy
//!
//! # Architecture
//!
//! ```text
//! animation loop → Apc40Controller::tick() → ControlSurface → MidiSink → midir → APC40
//! APC40 → midir callback → ControlSurface::handle_inbound() → flume channel → caller
//! ```
//!
//! The surface is shared between the caller's loop and the midir callback
//! thread behind a `Mutex`, so ticks and inbound events never interleave.

mod address;
mod button;
mod config;
mod error;
mod grid;
mod knob;
mod message;
pub mod midi;
mod oscillation;
mod surface;
mod transport;

pub use address::{
    grid_address, grid_cell, knob_channel, knob_led_controller, knob_slot, led_ring_slot,
    KnobBank, CC_STATUS_BASE, CLIP_LAUNCH_BASE, CONTROLLER_MAX, DEVICE_CONTROL_KNOB_BASE,
    GRID_COLUMNS, GRID_ROWS, KNOBS_PER_BANK, LED_RING_OFFSET, MIDPOINT, NOTE_OFF_STATUS_BASE,
    NOTE_ON_STATUS_BASE, TRACK_CONTROL_KNOB_BASE, TRACK_COUNT,
};
pub use button::{ButtonState, TrackControlButton, DEFAULT_ON_VELOCITY};
pub use config::{
    default_driver_config_path, load_driver_config, save_driver_config, DriverConfig,
};
pub use error::SurfaceError;
pub use grid::ClipGrid;
pub use knob::{KnobState, LedRingMode};
pub use message::{InboundEvent, InboundKind, WireMessage};
pub use oscillation::{
    step_knob, ColorSource, Direction, FixedColor, OddPaletteColors, RandomReseed,
    ReseedSource, SequenceReseed, StepOutcome,
};
pub use surface::{ControlSurface, SurfaceEvent, SurfaceOptions, TickSummary};
pub use transport::{MidiSink, RecordingSink};

use midi::{MidiConnection, MidiInputHandler, MidirSink};
use std::sync::{Arc, Mutex, MutexGuard};

/// Main APC40 controller
///
/// Owns the shared surface, the outbound sink and (when connected to real
/// hardware) the input handler.
pub struct Apc40Controller {
    /// Surface state, shared with the midir input callback
    surface: Arc<Mutex<ControlSurface>>,
    /// Outbound transport
    output: Box<dyn MidiSink + Send>,
    /// Input handler (owns midir connection), absent for offline use
    input_handler: Option<MidiInputHandler>,
}

impl Apc40Controller {
    /// Discover the APC40 and connect both directions
    ///
    /// Fails with `DeviceNotFound` if either the input or the output port is
    /// missing. Nothing is retried; the caller should abort.
    pub fn connect(config: &DriverConfig) -> Result<Self, SurfaceError> {
        let surface =
            ControlSurface::with_random_policy(config.surface_options(), config.reseed_range())?;
        let surface = Arc::new(Mutex::new(surface));

        // Output first so a missing output port doesn't leave a live input callback behind
        let output = MidiConnection::connect_output(&config.port_match)?;
        let input_handler = MidiInputHandler::connect(&config.port_match, surface.clone())?;

        log::info!("APC40: Connected to device matching '{}'", config.port_match);

        Ok(Self {
            surface,
            output: Box::new(MidirSink::new(output)),
            input_handler: Some(input_handler),
        })
    }

    /// Drive a surface through an arbitrary sink, without any input port
    ///
    /// Used for dry runs and tests.
    pub fn offline(surface: ControlSurface, output: Box<dyn MidiSink + Send>) -> Self {
        Self {
            surface: Arc::new(Mutex::new(surface)),
            output,
            input_handler: None,
        }
    }

    /// Check if an input port is attached
    pub fn has_input(&self) -> bool {
        self.input_handler.is_some()
    }

    /// Shared handle to the surface state
    pub fn surface(&self) -> Arc<Mutex<ControlSurface>> {
        self.surface.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ControlSurface>, SurfaceError> {
        self.surface.lock().map_err(|_| SurfaceError::StatePoisoned)
    }

    /// Send initial ring styles and positions for every knob
    pub fn initialize(&mut self) -> Result<(), SurfaceError> {
        let mut surface = self.surface.lock().map_err(|_| SurfaceError::StatePoisoned)?;
        surface.initialize(&mut *self.output)
    }

    /// Run one animation step
    pub fn tick(&mut self) -> Result<TickSummary, SurfaceError> {
        let mut surface = self.surface.lock().map_err(|_| SurfaceError::StatePoisoned)?;
        surface.tick(&mut *self.output)
    }

    /// Route an inbound event that didn't come through the midir callback
    pub fn handle_inbound(&self, event: &InboundEvent) -> Result<SurfaceEvent, SurfaceError> {
        midi::input::dispatch_inbound(&self.surface, event)
    }

    /// Turn all clip launch LEDs off
    pub fn clear_grid(&mut self) -> Result<(), SurfaceError> {
        let mut surface = self.surface.lock().map_err(|_| SurfaceError::StatePoisoned)?;
        surface.grid_mut().clear(&mut *self.output)
    }

    /// Current position of one knob on one track
    pub fn knob_position(
        &self,
        bank: KnobBank,
        index: usize,
        track: usize,
    ) -> Result<u8, SurfaceError> {
        let surface = self.lock()?;
        let knob = surface
            .knob(bank, index)
            .ok_or(SurfaceError::OutOfRange { what: "knob index", value: index })?;
        knob.position(track)
    }

    /// Drain events decoded by the input callback since the last call
    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        match &self.input_handler {
            Some(handler) => handler.drain_events().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink that counts sends and can be shared with the test body
    struct CountingSink(Arc<AtomicUsize>);

    impl MidiSink for CountingSink {
        fn send(&mut self, _message: WireMessage) -> Result<(), SurfaceError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn offline_controller(sent: Arc<AtomicUsize>) -> Apc40Controller {
        let surface = ControlSurface::new(
            SurfaceOptions::default(),
            Box::new(SequenceReseed::new(vec![65])),
            Box::new(FixedColor(3)),
        )
        .unwrap();
        Apc40Controller::offline(surface, Box::new(CountingSink(sent)))
    }

    #[test]
    fn test_offline_initialize_and_tick() {
        let sent = Arc::new(AtomicUsize::new(0));
        let mut controller = offline_controller(sent.clone());
        assert!(!controller.has_input());

        controller.initialize().unwrap();
        assert_eq!(sent.load(Ordering::Relaxed), 32);

        let summary = controller.tick().unwrap();
        assert_eq!(summary.moved, 16);
        assert_eq!(sent.load(Ordering::Relaxed), 32 + 56);
        assert_eq!(
            controller.knob_position(KnobBank::TrackControl, 7, 0).unwrap(),
            73
        );
    }

    #[test]
    fn test_offline_handle_inbound() {
        let controller = offline_controller(Arc::new(AtomicUsize::new(0)));
        let event = InboundEvent::parse(&[0xB2, 0x30, 0x10], 0.0).unwrap();

        let decoded = controller.handle_inbound(&event).unwrap();
        assert!(matches!(decoded, SurfaceEvent::KnobTurned { track: 2, .. }));
        assert_eq!(controller.knob_position(KnobBank::TrackControl, 0, 2).unwrap(), 0x10);
        assert!(controller.drain_events().is_empty());
    }

    #[test]
    fn test_knob_position_bad_index() {
        let controller = offline_controller(Arc::new(AtomicUsize::new(0)));
        assert!(controller
            .knob_position(KnobBank::DeviceControl, 8, 0)
            .unwrap_err()
            .is_out_of_range());
    }

    #[test]
    fn test_clear_grid() {
        let sent = Arc::new(AtomicUsize::new(0));
        let mut controller = offline_controller(sent.clone());
        controller.clear_grid().unwrap();
        assert_eq!(sent.load(Ordering::Relaxed), 40);
    }
}

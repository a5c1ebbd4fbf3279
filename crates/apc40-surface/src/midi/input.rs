//! MIDI input handling
//!
//! Receives raw MIDI bytes from the midir callback, parses them with midly,
//! dispatches them into the shared surface and forwards the decoded
//! [`SurfaceEvent`] to the caller via a flume channel.

use crate::error::SurfaceError;
use crate::message::InboundEvent;
use crate::surface::{ControlSurface, SurfaceEvent};
use super::connection::MidiConnection;
use flume::{Receiver, Sender};
use midir::MidiInputConnection;
use std::sync::{Arc, Mutex};

/// Callback data passed to midir
struct CallbackData {
    surface: Arc<Mutex<ControlSurface>>,
    event_tx: Sender<SurfaceEvent>,
    /// Timestamp (µs) of the previous message, for delta times
    last_timestamp: Option<u64>,
}

/// MIDI input handler
///
/// Owns the midir connection and processes incoming MIDI messages.
pub struct MidiInputHandler {
    /// The midir connection (kept alive for the duration)
    _connection: MidiInputConnection<CallbackData>,
    /// Decoded events for the caller
    event_rx: Receiver<SurfaceEvent>,
}

impl MidiInputHandler {
    /// Connect to the input port matching `port_match`
    ///
    /// Every inbound message is dispatched into `surface` on the midir thread.
    pub fn connect(
        port_match: &str,
        surface: Arc<Mutex<ControlSurface>>,
    ) -> Result<Self, SurfaceError> {
        let (midi_in, port, port_name) = MidiConnection::find_input_port(port_match)?;

        let (event_tx, event_rx) = flume::bounded(256);
        let callback_data = CallbackData {
            surface,
            event_tx,
            last_timestamp: None,
        };

        let connection = midi_in
            .connect(&port, "apc40-midi-input", Self::midi_callback, callback_data)
            .map_err(|e| SurfaceError::Connection(e.to_string()))?;

        log::info!("APC40: Input handler connected to {}", port_name);

        Ok(Self {
            _connection: connection,
            event_rx,
        })
    }

    /// The midir callback function
    ///
    /// Called from the MIDI driver thread whenever a message is received.
    /// Must be fast and non-blocking.
    fn midi_callback(timestamp: u64, data: &[u8], callback_data: &mut CallbackData) {
        let delta_time = delta_seconds(callback_data.last_timestamp, timestamp);
        callback_data.last_timestamp = Some(timestamp);

        let event = match InboundEvent::parse(data, delta_time) {
            Some(e) => e,
            None => {
                log::trace!("[MIDI IN] ignored {:02x?}", data);
                return;
            }
        };

        let decoded = match dispatch_inbound(&callback_data.surface, &event) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("MIDI: Dropping inbound event: {}", e);
                return;
            }
        };

        // Send to caller (non-blocking)
        if callback_data.event_tx.try_send(decoded).is_err() {
            log::warn!("MIDI: Event channel full, dropping event");
        }
    }

    /// Try to receive a pending event (non-blocking)
    pub fn try_recv(&self) -> Option<SurfaceEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Drain all pending events
    pub fn drain_events(&self) -> impl Iterator<Item = SurfaceEvent> + '_ {
        std::iter::from_fn(|| self.try_recv())
    }
}

/// Seconds between two midir timestamps (microseconds)
fn delta_seconds(previous: Option<u64>, now: u64) -> f64 {
    match previous {
        Some(prev) => now.saturating_sub(prev) as f64 / 1_000_000.0,
        None => 0.0,
    }
}

/// Lock the shared surface and route one inbound event
pub(crate) fn dispatch_inbound(
    surface: &Mutex<ControlSurface>,
    event: &InboundEvent,
) -> Result<SurfaceEvent, SurfaceError> {
    let mut surface = surface.lock().map_err(|_| SurfaceError::StatePoisoned)?;
    Ok(surface.handle_inbound(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::KnobBank;
    use crate::oscillation::{FixedColor, SequenceReseed};
    use crate::surface::SurfaceOptions;

    fn shared_surface() -> Arc<Mutex<ControlSurface>> {
        let surface = ControlSurface::new(
            SurfaceOptions::default(),
            Box::new(SequenceReseed::new(vec![60])),
            Box::new(FixedColor(1)),
        )
        .unwrap();
        Arc::new(Mutex::new(surface))
    }

    #[test]
    fn test_delta_seconds() {
        assert_eq!(delta_seconds(None, 5_000), 0.0);
        assert_eq!(delta_seconds(Some(1_000_000), 1_250_000), 0.25);
        // Clock going backwards never gives a negative delta
        assert_eq!(delta_seconds(Some(2_000), 1_000), 0.0);
    }

    #[test]
    fn test_dispatch_updates_shared_surface() {
        let surface = shared_surface();
        let event = InboundEvent::parse(&[0xB1, 0x14, 0x22], 0.0).unwrap();

        let decoded = dispatch_inbound(&surface, &event).unwrap();
        assert!(matches!(decoded, SurfaceEvent::KnobTurned { track: 1, value: 0x22, .. }));

        let guard = surface.lock().unwrap();
        assert_eq!(
            guard.knob(KnobBank::DeviceControl, 4).unwrap().position(1).unwrap(),
            0x22
        );
    }

    #[test]
    fn test_dispatch_from_other_thread() {
        let surface = shared_surface();
        let remote = surface.clone();

        std::thread::spawn(move || {
            let event = InboundEvent::parse(&[0x90, 0x57, 0x7F], 0.0).unwrap();
            dispatch_inbound(&remote, &event).unwrap();
        })
        .join()
        .unwrap();

        let guard = surface.lock().unwrap();
        assert!(guard.button(crate::button::TrackControlButton::Pan).is_pressed());
    }

    #[test]
    fn test_dispatch_poisoned_lock() {
        let surface = shared_surface();
        let poisoner = surface.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the surface lock");
        })
        .join();

        let event = InboundEvent::parse(&[0x90, 0x57, 0x7F], 0.0).unwrap();
        assert!(matches!(
            dispatch_inbound(&surface, &event),
            Err(SurfaceError::StatePoisoned)
        ));
    }
}

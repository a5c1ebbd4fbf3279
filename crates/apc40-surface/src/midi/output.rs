//! MIDI output over a midir connection

use crate::error::SurfaceError;
use crate::message::WireMessage;
use crate::transport::MidiSink;
use midir::MidiOutputConnection;

/// [`MidiSink`] that writes to a midir output port
pub struct MidirSink {
    connection: MidiOutputConnection,
}

impl MidirSink {
    pub fn new(connection: MidiOutputConnection) -> Self {
        Self { connection }
    }

    /// Close the port
    pub fn close(self) {
        let _ = self.connection.close();
        log::info!("APC40: Output port closed");
    }
}

impl MidiSink for MidirSink {
    fn send(&mut self, message: WireMessage) -> Result<(), SurfaceError> {
        log::trace!("[MIDI OUT] {}", message);
        self.connection.send(message.as_bytes()).map_err(|e| {
            log::warn!("MIDI output: Failed to send {}: {}", message, e);
            SurfaceError::Transport(e.to_string())
        })
    }
}

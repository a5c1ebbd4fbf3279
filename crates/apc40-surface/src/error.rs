//! Error type for surface operations
//!
//! Every fallible operation in this crate returns [`SurfaceError`]. Range
//! checks run before anything is handed to the transport, so an `OutOfRange`
//! error never leaves a half-sent update behind.

use crate::midi::connection::PortDirection;

/// Error type for APC40 surface operations
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// Track index, controller value, or grid coordinate outside its domain
    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: usize },

    /// Port discovery found no port whose name contains the pattern
    #[error("No MIDI {direction} port found matching pattern: {pattern}")]
    DeviceNotFound {
        pattern: String,
        direction: PortDirection,
    },

    /// midir could not be initialized or the port could not be opened
    #[error("MIDI connection error: {0}")]
    Connection(String),

    /// The send primitive failed (device unplugged, etc.)
    #[error("MIDI transport error: {0}")]
    Transport(String),

    /// The shared surface lock was poisoned by a panicking holder
    #[error("Surface state lock poisoned")]
    StatePoisoned,
}

impl SurfaceError {
    pub(crate) fn out_of_range(what: &'static str, value: usize) -> Self {
        Self::OutOfRange { what, value }
    }

    /// Check if this is a range violation
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

//! MIDI protocol backend
//!
//! Handles APC40 port discovery, inbound callback dispatch, and outbound
//! sends via midir.

pub mod connection;
pub mod input;
pub mod output;

pub use connection::{select_port, MidiConnection, PortDirection};
pub use input::MidiInputHandler;
pub use output::MidirSink;

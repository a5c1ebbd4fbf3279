//! MIDI port discovery and connection
//!
//! Uses midir for cross-platform MIDI I/O (ALSA on Linux, CoreMIDI on macOS, WinMM on Windows).
//! Both an input and an output port are required; a missing port is a fatal
//! [`SurfaceError::DeviceNotFound`] and is not retried.

use crate::error::SurfaceError;
use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputConnection};
use std::fmt;

/// Which side of the device a port belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Pick the first port whose name contains `pattern` (case-insensitive)
pub fn select_port(
    names: &[String],
    pattern: &str,
    direction: PortDirection,
) -> Result<usize, SurfaceError> {
    let pattern_lower = pattern.to_lowercase();
    names
        .iter()
        .position(|name| name.to_lowercase().contains(&pattern_lower))
        .ok_or_else(|| SurfaceError::DeviceNotFound {
            pattern: pattern.to_string(),
            direction,
        })
}

/// Port lookup helpers over midir
pub struct MidiConnection;

impl MidiConnection {
    /// Find the input port matching `port_match`
    ///
    /// Returns the MidiInput so the caller can connect with its own callback.
    pub fn find_input_port(
        port_match: &str,
    ) -> Result<(MidiInput, MidiInputPort, String), SurfaceError> {
        let midi_in = MidiInput::new("apc40-midi-in")
            .map_err(|e| SurfaceError::Connection(e.to_string()))?;

        let ports = midi_in.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_in.port_name(port).unwrap_or_default())
            .collect();

        let index = select_port(&names, port_match, PortDirection::Input)?;
        let port_name = names[index].clone();
        log::info!("APC40: Found input port: {}", port_name);

        Ok((midi_in, ports[index].clone(), port_name))
    }

    /// Find and connect to the output port matching `port_match`
    pub fn connect_output(port_match: &str) -> Result<MidiOutputConnection, SurfaceError> {
        let midi_out = MidiOutput::new("apc40-midi-out")
            .map_err(|e| SurfaceError::Connection(e.to_string()))?;

        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_out.port_name(port).unwrap_or_default())
            .collect();

        let index = select_port(&names, port_match, PortDirection::Output)?;
        log::info!("APC40: Found output port: {}", names[index]);

        midi_out
            .connect(&ports[index], "apc40-midi-output")
            .map_err(|e| SurfaceError::Connection(e.to_string()))
    }

    /// List all available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>, SurfaceError> {
        let midi_in = MidiInput::new("apc40-midi-list")
            .map_err(|e| SurfaceError::Connection(e.to_string()))?;

        let ports: Vec<String> = midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect();

        Ok(ports)
    }

    /// List all available MIDI output ports
    pub fn list_output_ports() -> Result<Vec<String>, SurfaceError> {
        let midi_out = MidiOutput::new("apc40-midi-list")
            .map_err(|e| SurfaceError::Connection(e.to_string()))?;

        let ports: Vec<String> = midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect();

        Ok(ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_first_match() {
        let ports = names(&[
            "Midi Through:Midi Through Port-0 14:0",
            "Akai APC40:Akai APC40 MIDI 1 20:0",
            "Akai APC40:Akai APC40 MIDI 2 20:1",
        ]);
        assert_eq!(select_port(&ports, "APC40", PortDirection::Input).unwrap(), 1);
    }

    #[test]
    fn test_select_is_case_insensitive() {
        let ports = names(&["akai apc40 [hw:2,0,0]"]);
        assert_eq!(select_port(&ports, "APC40", PortDirection::Output).unwrap(), 0);
    }

    #[test]
    fn test_select_device_not_found() {
        let ports = names(&["Launchpad Mini MK3 [hw:1,0,0]"]);
        let err = select_port(&ports, "APC40", PortDirection::Output).unwrap_err();
        match err {
            SurfaceError::DeviceNotFound { pattern, direction } => {
                assert_eq!(pattern, "APC40");
                assert_eq!(direction, PortDirection::Output);
            }
            other => panic!("Expected DeviceNotFound, got {:?}", other),
        }

        assert!(select_port(&[], "APC40", PortDirection::Input).is_err());
    }

    #[test]
    fn test_list_ports() {
        // This test just verifies we can enumerate ports without crashing
        // Actual port availability depends on the system
        let _input_ports = MidiConnection::list_input_ports();
        let _output_ports = MidiConnection::list_output_ports();
    }
}

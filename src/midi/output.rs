// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output port via `midir`.

use midir::{MidiOutput, MidiOutputConnection};
use tracing::{info, warn};

use super::messages;
use crate::error::{Error, Result};
use crate::sound::NoteSink;

const CLIENT_NAME: &str = "fpr-tracker";

/// Names of the available MIDI output ports
pub fn list_ports() -> Vec<String> {
    match MidiOutput::new(CLIENT_NAME) {
        Ok(midi_out) => midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Index of the port to open: the first whose name contains `wanted`
/// (case-insensitive), otherwise the first port. `None` when there are no ports.
pub fn choose_port(names: &[String], wanted: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    let Some(wanted) = wanted else {
        return Some(0);
    };
    let needle = wanted.to_lowercase();
    match names.iter().position(|n| n.to_lowercase().contains(&needle)) {
        Some(index) => Some(index),
        None => {
            warn!(wanted, fallback = %names[0], "no MIDI port matches, using the first one");
            Some(0)
        }
    }
}

/// Note sink writing to an external MIDI device on channel 1
pub struct MidiPortSink {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiPortSink {
    /// Connect to the first port whose name contains `name`
    /// (case-insensitive), falling back to the first port.
    pub fn connect(name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| Error::Midi(format!("Failed to create MIDI output: {}", e)))?;

        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_default())
            .collect();

        let index = choose_port(&names, name)
            .ok_or_else(|| Error::Midi("No MIDI output ports available".to_string()))?;

        let port_name = names[index].clone();
        let connection = midi_out
            .connect(&ports[index], "fpr-tracker-out")
            .map_err(|e| Error::Midi(format!("Failed to connect to {}: {}", port_name, e)))?;

        info!(port = %port_name, "connected MIDI output");
        Ok(Self {
            connection,
            port_name,
        })
    }

    /// Name of the connected port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| Error::Midi(format!("Failed to send to {}: {}", self.port_name, e)))
    }
}

impl NoteSink for MidiPortSink {
    fn note_on(&mut self, pitch: u8) -> Result<()> {
        self.send(&[messages::NOTE_ON, pitch & 0x7F, messages::DEFAULT_VELOCITY])
    }

    fn note_off(&mut self, pitch: u8) -> Result<()> {
        self.send(&[messages::NOTE_OFF, pitch & 0x7F, messages::DEFAULT_VELOCITY])
    }

    fn program_change(&mut self, program: u8) -> Result<()> {
        self.send(&[messages::PROGRAM_CHANGE, program & 0x7F])
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

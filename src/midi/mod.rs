// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI conversion and output.
//!
//! This module provides:
//! - Quantized import from standard MIDI files into a beat grid
//! - Per-beat export back to a type 0 MIDI file
//! - A `midir` port implementing the note sink

pub mod export;
pub mod import;
pub mod output;

pub use export::{export_events, ExportOptions, MidiExporter};
pub use import::{events_from_smf, import_bytes, import_file, quantize, ImportOptions};
pub use output::{choose_port, list_ports, MidiPortSink};

/// What a timed message does to the beat grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Note On with non-zero velocity
    NoteOn(u8),
    /// Note Off, or Note On with zero velocity
    NoteOff(u8),
    /// Program change
    ProgramChange(u8),
    /// Any other channel message
    Other,
}

/// A channel message with its delta time in ticks since the previous message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    /// Ticks since the previous message in the stream
    pub delta: u32,
    /// Message content
    pub kind: MessageKind,
}

impl TimedMessage {
    /// Note On after `delta` ticks
    pub fn note_on(delta: u32, key: u8) -> Self {
        Self {
            delta,
            kind: MessageKind::NoteOn(key),
        }
    }

    /// Note Off after `delta` ticks
    pub fn note_off(delta: u32, key: u8) -> Self {
        Self {
            delta,
            kind: MessageKind::NoteOff(key),
        }
    }

    /// Program change after `delta` ticks
    pub fn program_change(delta: u32, program: u8) -> Self {
        Self {
            delta,
            kind: MessageKind::ProgramChange(program),
        }
    }
}

/// MIDI message constants
pub mod messages {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    /// Velocity used for every note; the hardware has no dynamics
    pub const DEFAULT_VELOCITY: u8 = 64;
}

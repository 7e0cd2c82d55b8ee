// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sound output for manual note triggers and playback.
//!
//! Everything that makes a sound goes through the [`NoteSink`] trait. The
//! backend is picked once at startup:
//! - an external MIDI device (`midir`)
//! - pre-rendered WAV samples, one per pitch (`cpal` + `hound`)
//! - nothing at all

pub mod samples;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::midi::MidiPortSink;

pub use samples::SampleSink;

/// Something that can sound a pitch
pub trait NoteSink: Send {
    /// Start sounding `pitch`
    fn note_on(&mut self, pitch: u8) -> Result<()>;

    /// Stop sounding `pitch`
    fn note_off(&mut self, pitch: u8) -> Result<()>;

    /// Select an instrument
    fn program_change(&mut self, program: u8) -> Result<()>;

    /// Name for logs and the status line
    fn name(&self) -> &str {
        "sink"
    }
}

/// Sink shared by the editor and the playback thread
pub type SharedSink = Arc<Mutex<Box<dyn NoteSink>>>;

/// Wrap a sink for sharing
pub fn shared<S: NoteSink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink) as Box<dyn NoteSink>))
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NoteSink for NullSink {
    fn note_on(&mut self, _pitch: u8) -> Result<()> {
        Ok(())
    }

    fn note_off(&mut self, _pitch: u8) -> Result<()> {
        Ok(())
    }

    fn program_change(&mut self, _program: u8) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Which sound backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundBackend {
    /// External MIDI device
    Midi,
    /// WAV samples
    Samples,
    /// No sound
    None,
}

impl std::str::FromStr for SoundBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "midi" => Ok(SoundBackend::Midi),
            "samples" | "wav" => Ok(SoundBackend::Samples),
            "none" | "silent" => Ok(SoundBackend::None),
            other => Err(format!("unknown sound backend '{}'", other)),
        }
    }
}

/// Sound settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Backend to open
    pub backend: SoundBackend,
    /// MIDI port name filter (first port when unset)
    pub port: Option<String>,
    /// General MIDI program sent on startup and written on export
    pub program: u8,
    /// Directory holding `<pitch>.wav` files
    pub sample_dir: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            backend: SoundBackend::Midi,
            port: None,
            program: 10,
            sample_dir: PathBuf::from("res/wav"),
        }
    }
}

/// Open the configured backend
///
/// A backend that cannot be opened is logged and replaced by [`NullSink`]
/// so the editor stays usable without sound hardware.
pub fn open_sink(config: &SoundConfig, pitches: &[u8]) -> SharedSink {
    let opened: Result<Box<dyn NoteSink>> = match config.backend {
        SoundBackend::Midi => MidiPortSink::connect(config.port.as_deref()).and_then(|mut sink| {
            sink.program_change(config.program)?;
            Ok(Box::new(sink) as Box<dyn NoteSink>)
        }),
        SoundBackend::Samples => SampleSink::open(&config.sample_dir, pitches)
            .map(|sink| Box::new(sink) as Box<dyn NoteSink>),
        SoundBackend::None => Ok(Box::new(NullSink)),
    };

    match opened {
        Ok(sink) => Arc::new(Mutex::new(sink)),
        Err(e) => {
            warn!(backend = ?config.backend, error = %e, "sound backend unavailable, running silent");
            shared(NullSink)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// One message seen by a [`RecordingSink`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SinkEvent {
        On(u8),
        Off(u8),
        Program(u8),
    }

    /// Sink that remembers what it was asked to play
    #[derive(Debug, Default, Clone)]
    pub struct RecordingSink {
        pub events: Arc<Mutex<Vec<SinkEvent>>>,
    }

    impl RecordingSink {
        pub fn log(&self) -> Vec<SinkEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl NoteSink for RecordingSink {
        fn note_on(&mut self, pitch: u8) -> Result<()> {
            self.events.lock().unwrap().push(SinkEvent::On(pitch));
            Ok(())
        }

        fn note_off(&mut self, pitch: u8) -> Result<()> {
            self.events.lock().unwrap().push(SinkEvent::Off(pitch));
            Ok(())
        }

        fn program_change(&mut self, program: u8) -> Result<()> {
            self.events.lock().unwrap().push(SinkEvent::Program(program));
            Ok(())
        }
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tracker and MIDI converter for Fisher-Price music box records.
//!
//! A record is a grid of 16 pitch tracks by a variable number of beats. This
//! crate edits, stores, converts and plays such grids:
//! - [`sequence`]: the grid, its transforms and the `.fpr` file format
//! - [`midi`]: quantized import from and export to standard MIDI files
//! - [`sequencer`]: cancellable background playback with progress reports
//! - [`sound`]: note sinks (MIDI port, WAV samples, silence)
//! - [`ui`]: the terminal editor
//! - [`config`]: YAML settings

pub mod config;
pub mod error;
pub mod midi;
pub mod sequence;
pub mod sequencer;
pub mod sound;
pub mod ui;

pub use error::{Error, FormatError, Result};
pub use sequence::{Sequence, BEAT_COUNT, MAX_BEATS, NOTES, TRACK_COUNT};

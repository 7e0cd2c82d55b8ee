// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Quantized import of standard MIDI files.
//!
//! The importer has no notion of tempo. All tracks of the file are merged into
//! one chronological stream, meta events are dropped, and the stream is walked
//! with a beat cursor: a Note On lands on the current beat, and any message
//! arriving a non-zero number of ticks after its predecessor moves the cursor
//! on by exactly one beat afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use midly::{Format, MidiMessage, Smf, TrackEventKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{MessageKind, TimedMessage};
use crate::error::{Error, Result};
use crate::sequence::{Sequence, BEAT_COUNT, MAX_BEATS};

/// How MIDI pitches and timing map onto the record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Semitones added to every incoming key
    pub transpose: i8,
    /// Pitches the record cannot play, mapped to a neighbour it can
    pub substitutions: BTreeMap<u8, u8>,
    /// Do not advance past a beat that has no note yet
    pub skip_empty_beats: bool,
    /// Stop once the cursor reaches this many beats (at most `MAX_BEATS`)
    pub max_beats: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            transpose: 0,
            substitutions: BTreeMap::new(),
            skip_empty_beats: false,
            max_beats: BEAT_COUNT,
        }
    }
}

impl ImportOptions {
    /// Files written for the Kikkerland 15 music box (musicboxmaniacs.com)
    ///
    /// That box sits an octave below the record player, and the record
    /// player has no F5, which is moved down to E5.
    pub fn kikkerland15() -> Self {
        Self {
            transpose: 12,
            substitutions: BTreeMap::from([(77, 76)]),
            ..Self::default()
        }
    }

    /// Enable or disable silence compaction
    pub fn with_skip_empty_beats(mut self, skip: bool) -> Self {
        self.skip_empty_beats = skip;
        self
    }

    /// Reject a beat limit no record file can hold
    pub fn validate(&self) -> Result<()> {
        if self.max_beats > MAX_BEATS {
            return Err(Error::Setting(format!(
                "max_beats {} is above the {} beat limit",
                self.max_beats, MAX_BEATS
            )));
        }
        Ok(())
    }

    /// Pitch on the record for an incoming key
    pub fn map_pitch(&self, key: u8) -> u8 {
        let shifted = (key as i16 + self.transpose as i16).clamp(0, 127) as u8;
        self.substitutions.get(&shifted).copied().unwrap_or(shifted)
    }
}

/// Flatten a parsed file into a single stream of channel messages
///
/// Parallel tracks are merged by absolute tick (earlier tracks first on
/// ties); sequential files are played track after track. Meta and sysex
/// events are dropped before deltas are computed.
pub fn events_from_smf(smf: &Smf) -> Vec<TimedMessage> {
    let mut timeline: Vec<(u64, MessageKind)> = Vec::new();
    let mut track_start = 0u64;

    for track in &smf.tracks {
        let mut tick = track_start;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Midi { message, .. } = event.kind {
                timeline.push((tick, message_kind(message)));
            }
        }
        if smf.header.format == Format::Sequential {
            track_start = tick;
        }
    }

    // Stable: equal ticks keep track order
    timeline.sort_by_key(|&(tick, _)| tick);

    let mut previous = 0u64;
    timeline
        .into_iter()
        .map(|(tick, kind)| {
            let delta = (tick - previous).min(u32::MAX as u64) as u32;
            previous = tick;
            TimedMessage { delta, kind }
        })
        .collect()
}

fn message_kind(message: MidiMessage) -> MessageKind {
    match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => MessageKind::NoteOn(key.as_int()),
        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
            MessageKind::NoteOff(key.as_int())
        }
        MidiMessage::ProgramChange { program } => MessageKind::ProgramChange(program.as_int()),
        _ => MessageKind::Other,
    }
}

/// Walk a message stream into a new record
///
/// The record is as long as the cursor travelled, and always covers the last
/// note. Import stops silently once `max_beats` is reached. A pitch with no
/// track aborts the import with `UnsupportedPitch`.
pub fn quantize<I>(events: I, options: &ImportOptions) -> Result<Sequence>
where
    I: IntoIterator<Item = TimedMessage>,
{
    let max_beats = options.max_beats.clamp(1, MAX_BEATS);
    let mut seq = Sequence::new(max_beats);
    let mut beat = 0usize;
    let mut end = 0usize;

    for event in events {
        if beat >= max_beats {
            debug!(max_beats, "record full, dropping remaining events");
            break;
        }

        if let MessageKind::NoteOn(key) = event.kind {
            let pitch = options.map_pitch(key);
            let track = seq
                .track_for_pitch(pitch)
                .ok_or(Error::UnsupportedPitch { pitch, beat })?;
            seq.set_note(beat, track, true);
            end = end.max(beat + 1);
        }

        if event.delta > 0 && !(options.skip_empty_beats && seq.is_silent(beat)) {
            beat += 1;
        }
    }

    seq.resize(beat.max(end).clamp(1, max_beats));
    Ok(seq)
}

/// Import a standard MIDI file held in memory
pub fn import_bytes(bytes: &[u8], options: &ImportOptions) -> Result<Sequence> {
    let smf = Smf::parse(bytes).map_err(|e| Error::Midi(format!("Failed to parse MIDI: {}", e)))?;
    quantize(events_from_smf(&smf), options)
}

/// Import a standard MIDI file from disk
///
/// The record is titled after the file and will save next to it as `.fpr`.
pub fn import_file<P: AsRef<Path>>(path: P, options: &ImportOptions) -> Result<Sequence> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let mut seq = import_bytes(&bytes, options)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    seq.title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    seq.comment = format!("Imported from {}", file_name);
    seq.source_path = Some(path.with_extension("fpr"));

    info!(
        path = %path.display(),
        beats = seq.beats_count(),
        notes = seq.note_count(),
        "imported MIDI file"
    );
    Ok(seq)
}

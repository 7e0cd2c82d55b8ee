// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Each beat becomes a burst of zero-delta Note Ons followed by a single
//! Note Off that carries the whole beat length, so a re-import lands every
//! note back on its beat.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use tracing::info;

use super::{messages, MessageKind, TimedMessage};
use crate::error::Result;
use crate::sequence::Sequence;

/// Export settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// General MIDI program sent before the first beat
    pub program: u8,
    /// PPQN; one beat is one quarter note
    pub ticks_per_beat: u16,
    /// Fixed tempo written to the file
    pub tempo: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            program: 10,
            ticks_per_beat: 480,
            tempo: 120.0,
        }
    }
}

/// Per-beat message stream for a record
///
/// Silent beats still get their advance marker so they survive a re-import.
pub fn export_events(seq: &Sequence, ticks_per_beat: u32) -> Vec<TimedMessage> {
    let mut events = Vec::with_capacity(seq.beats_count() + seq.note_count());
    for beat in 0..seq.beats_count() {
        for pitch in seq.active_pitches(beat) {
            events.push(TimedMessage::note_on(0, pitch));
        }
        events.push(TimedMessage::note_off(ticks_per_beat, 0));
    }
    events
}

/// Track event for a channel 1 message, `None` for anything else
fn channel_event<'a>(message: TimedMessage) -> Option<TrackEvent<'a>> {
    let vel = u7::new(messages::DEFAULT_VELOCITY);
    let message_kind = match message.kind {
        MessageKind::NoteOn(key) => MidiMessage::NoteOn { key: u7::new(key & 0x7F), vel },
        MessageKind::NoteOff(key) => MidiMessage::NoteOff { key: u7::new(key & 0x7F), vel },
        MessageKind::ProgramChange(program) => MidiMessage::ProgramChange {
            program: u7::new(program & 0x7F),
        },
        MessageKind::Other => return None,
    };
    Some(TrackEvent {
        delta: u28::new(message.delta.min(0x0FFF_FFFF)),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: message_kind,
        },
    })
}

fn meta_event(message: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(message),
    }
}

/// Type 0 MIDI file writer for records
pub struct MidiExporter {
    options: ExportOptions,
}

impl MidiExporter {
    /// Create an exporter with default settings
    pub fn new() -> Self {
        Self::with_options(ExportOptions::default())
    }

    /// Create an exporter with explicit settings
    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Current settings
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Set the program change sent at the start
    pub fn set_program(&mut self, program: u8) {
        self.options.program = program & 0x7F;
    }

    /// Set PPQN
    pub fn set_ticks_per_beat(&mut self, ticks: u16) {
        self.options.ticks_per_beat = ticks.clamp(1, 0x7FFF);
    }

    /// Export to file
    pub fn export<P: AsRef<Path>>(&self, seq: &Sequence, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(File::create(path)?);
        self.write(seq, &mut file)?;
        file.flush()?;
        info!(path = %path.display(), beats = seq.beats_count(), "exported MIDI file");
        Ok(())
    }

    /// Export to bytes
    pub fn export_to_bytes(&self, seq: &Sequence) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write(seq, &mut buffer);
        buffer
    }

    /// Write MIDI data to writer
    pub fn write<W: Write>(&self, seq: &Sequence, writer: &mut W) -> io::Result<()> {
        self.smf(seq).write_std(writer)
    }

    /// Single-track file: track name, tempo and program, then the beats
    pub fn smf<'a>(&self, seq: &'a Sequence) -> Smf<'a> {
        let ticks_per_beat = self.options.ticks_per_beat.clamp(1, 0x7FFF);
        let mut track: Track<'a> = Vec::with_capacity(seq.beats_count() + seq.note_count() + 4);

        if !seq.title.is_empty() {
            track.push(meta_event(MetaMessage::TrackName(seq.title.as_bytes())));
        }
        let microseconds = (60_000_000.0 / self.options.tempo.max(1.0)) as u32;
        track.push(meta_event(MetaMessage::Tempo(u24::new(microseconds.min(0xFF_FFFF)))));
        track.extend(channel_event(TimedMessage::program_change(0, self.options.program)));
        track.extend(
            export_events(seq, ticks_per_beat as u32)
                .into_iter()
                .filter_map(channel_event),
        );
        track.push(meta_event(MetaMessage::EndOfTrack));

        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(ticks_per_beat)),
        ));
        smf.tracks.push(track);
        smf
    }
}

impl Default for MidiExporter {
    fn default() -> Self {
        Self::new()
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for the tracker
//!
//! These tests verify that the grid, file format, MIDI conversion and
//! playback work together through the public API.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use fpr_tracker::config::TrackerConfig;
use fpr_tracker::midi::{import_bytes, import_file, ImportOptions, MidiExporter};
use fpr_tracker::sequencer::{PlaybackConfig, Progress, Scheduler};
use fpr_tracker::sound::{shared, NoteSink};
use fpr_tracker::{Error, FormatError, Result, Sequence, BEAT_COUNT, NOTES};

/// Sink remembering every note on, for checking what playback sounded
#[derive(Clone, Default)]
struct CaptureSink {
    notes: Arc<Mutex<Vec<u8>>>,
}

impl NoteSink for CaptureSink {
    fn note_on(&mut self, pitch: u8) -> Result<()> {
        self.notes.lock().unwrap().push(pitch);
        Ok(())
    }

    fn note_off(&mut self, _pitch: u8) -> Result<()> {
        Ok(())
    }

    fn program_change(&mut self, _program: u8) -> Result<()> {
        Ok(())
    }
}

/// First bars of "Au clair de la lune" on the record's tracks
fn tune() -> Sequence {
    let melody = [1, 1, 1, 2, 3, 2, 1, 3, 2, 2, 1];
    let mut seq = Sequence::new(melody.len() + 3).with_title("Au clair de la lune");
    seq.comment = "traditional".to_string();
    for (beat, &track) in melody.iter().enumerate() {
        seq.set_note(beat, track, true);
    }
    // a chord at the end, after two silent beats
    seq.set_note(melody.len() + 2, 0, true);
    seq.set_note(melody.len() + 2, 7, true);
    seq
}

fn same_cells(a: &Sequence, b: &Sequence) -> bool {
    a.beats_count() == b.beats_count()
        && (0..a.beats_count()).all(|beat| a.get_beats(beat) == b.get_beats(beat))
}

/// Save and load through a real file
#[test]
fn test_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lune.fpr");

    let original = tune().with_source_path(&path);
    original.save().unwrap();

    let loaded = Sequence::load(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.title, "Au clair de la lune");
    assert_eq!(loaded.comment, "traditional");
}

/// A damaged file is rejected and reload keeps the edited grid
#[test]
fn test_damaged_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("damaged.fpr");
    tune().save_to(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 1);
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        Sequence::load(&path),
        Err(Error::Format(FormatError::Truncated))
    ));

    let mut edited = Sequence::new(5).with_source_path(&path);
    edited.set_note(4, 4, true);
    assert!(edited.reload().is_err());
    assert_eq!(edited.beats_count(), 5);
    assert!(edited.has_note(4, 4));
}

/// Grid edits survive the file format
#[test]
fn test_transform_then_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifted.fpr");

    let mut seq = tune();
    let beats = seq.beats_count();
    seq.shift_right(0);
    seq.shift_left(3);
    seq.save_to(&path).unwrap();

    let loaded = Sequence::load(&path).unwrap();
    assert_eq!(loaded.beats_count(), beats);
    assert!(loaded.is_silent(0));
    assert!(loaded.has_note(1, 1));
    assert!(same_cells(&loaded, &seq));
}

/// Export to a MIDI file and import it back
#[test]
fn test_midi_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mid = dir.path().join("lune.mid");

    let original = tune();
    MidiExporter::new().export(&original, &mid).unwrap();

    let imported = import_file(&mid, &ImportOptions::default()).unwrap();
    assert!(same_cells(&imported, &original));
    assert_eq!(imported.title, "lune");
    assert_eq!(imported.comment, "Imported from lune.mid");
    assert_eq!(imported.source_path, Some(dir.path().join("lune.fpr")));
}

/// Silence compaction drops empty beats between notes
#[test]
fn test_import_skipping_empty_beats() {
    let mut seq = Sequence::new(6);
    seq.set_note(0, 3, true);
    seq.set_note(3, 5, true);
    seq.set_note(5, 9, true);
    let bytes = MidiExporter::new().export_to_bytes(&seq);

    let options = ImportOptions::default().with_skip_empty_beats(true);
    let imported = import_bytes(&bytes, &options).unwrap();

    assert_eq!(imported.beats_count(), 3);
    assert!(imported.has_note(0, 3));
    assert!(imported.has_note(1, 5));
    assert!(imported.has_note(2, 9));
}

/// The Kikkerland preset moves notes up an octave
#[test]
fn test_kikkerland_import() {
    let mut low = Sequence::new(2);
    low.set_note(0, 0, true); // G4 becomes G5
    low.set_note(1, 2, true); // D5 becomes D6
    let bytes = MidiExporter::new().export_to_bytes(&low);

    let imported = import_bytes(&bytes, &ImportOptions::kikkerland15()).unwrap();
    assert_eq!(imported.active_pitches(0), vec![79]);
    assert_eq!(imported.active_pitches(1), vec![86]);

    // D7 has no octave above it on the record
    let mut high = Sequence::new(1);
    high.set_note(0, 15, true);
    let bytes = MidiExporter::new().export_to_bytes(&high);
    assert!(matches!(
        import_bytes(&bytes, &ImportOptions::kikkerland15()),
        Err(Error::UnsupportedPitch { pitch: 110, beat: 0 })
    ));
}

/// Long files are cut at one full disc
#[test]
fn test_import_stops_at_disc_capacity() {
    let mut long = Sequence::new(BEAT_COUNT + 20);
    for beat in 0..long.beats_count() {
        long.set_note(beat, beat % NOTES.len(), true);
    }
    let bytes = MidiExporter::new().export_to_bytes(&long);

    let imported = import_bytes(&bytes, &ImportOptions::default()).unwrap();
    assert_eq!(imported.beats_count(), BEAT_COUNT);
    assert!(imported.has_note(BEAT_COUNT - 1, (BEAT_COUNT - 1) % NOTES.len()));
}

/// Import settings come from the config file
#[test]
fn test_config_drives_import() {
    let config = TrackerConfig::from_yaml(
        r#"
import:
  transpose: -12
  max_beats: 4
"#,
    )
    .unwrap();

    let mut seq = Sequence::new(8);
    seq.set_note(0, 7, true); // C6 becomes C5
    let bytes = MidiExporter::new().export_to_bytes(&seq);

    let imported = import_bytes(&bytes, &config.import).unwrap();
    assert_eq!(imported.beats_count(), 4);
    assert_eq!(imported.active_pitches(0), vec![72]);
}

/// Play a record loaded from disk through a mock sink
#[test]
fn test_playback_of_saved_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lune.fpr");
    tune().save_to(&path).unwrap();

    let seq = Sequence::load(&path).unwrap();
    let expected: Vec<u8> = (0..seq.beats_count())
        .flat_map(|beat| seq.active_pitches(beat))
        .collect();
    let beats = seq.beats_count();

    let sink = CaptureSink::default();
    let config = PlaybackConfig {
        disc_seconds: 0.05,
        ..PlaybackConfig::default()
    };
    let mut scheduler = Scheduler::new(shared(sink.clone()), config);
    scheduler.start(Arc::new(RwLock::new(seq)), 0).unwrap();
    scheduler.wait();

    let progress = scheduler.drain_progress();
    assert_eq!(progress.len(), beats + 1);
    assert_eq!(progress.last(), Some(&Progress::Finished));
    assert_eq!(*sink.notes.lock().unwrap(), expected);
}

/// Edits made while playing are heard on later beats
#[test]
fn test_edit_during_playback() {
    let sequence = Arc::new(RwLock::new(Sequence::new(40)));
    let sink = CaptureSink::default();
    let mut scheduler = Scheduler::new(shared(sink.clone()), PlaybackConfig::fixed(0.01));

    scheduler.start(Arc::clone(&sequence), 0).unwrap();
    loop {
        match scheduler.recv_progress_timeout(Duration::from_secs(5)) {
            Some(Progress::Beat(beat)) if beat >= 2 => break,
            Some(_) => continue,
            None => panic!("no progress from playback"),
        }
    }
    sequence.write().unwrap().set_note(39, 6, true);
    scheduler.wait();

    assert_eq!(*sink.notes.lock().unwrap(), vec![NOTES[6]]);
}

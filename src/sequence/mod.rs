// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat-indexed note grid for a pinned music box record.
//!
//! A record is a `tracks × beats` matrix of booleans. Each track is one pin
//! row with a fixed MIDI pitch taken from the note table; each beat is one
//! slot along the disc. There is no tempo, velocity or duration: a note is
//! either present at a beat or not.

pub mod fpr;
pub mod transform;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Pin rows on a Fisher-Price record
pub const TRACK_COUNT: usize = 16;

/// Beats on a full disc; also the MIDI import limit
pub const BEAT_COUNT: usize = 86;

/// Longest record the file format can hold
pub const MAX_BEATS: usize = u16::MAX as usize;

/// MIDI pitch of each track, low to high (G4 C5 D5 E5 G5 A5 B5 C6 D6 E6 F6 G6 A6 B6 C7 D7)
pub const NOTES: [u8; TRACK_COUNT] = [
    67, 72, 74, 76, 79, 81, 83, 84, 86, 88, 89, 91, 93, 95, 96, 98,
];

/// A music box tune: note grid plus metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Pitch of each track
    note_table: Vec<u8>,
    /// One column of `tracks_count` cells per beat
    cells: Vec<Vec<bool>>,
    /// Tune title
    pub title: String,
    /// Free-form comment
    pub comment: String,
    /// Where the tune is saved, if anywhere
    pub source_path: Option<PathBuf>,
}

impl Sequence {
    /// Create an empty record using the FPR note table
    pub fn new(beats_count: usize) -> Self {
        Self::with_note_table(beats_count, NOTES.to_vec())
    }

    /// Create an empty record with a custom note table
    ///
    /// # Panics
    /// If `beats_count` is zero, the table is empty, or the pitches are not
    /// strictly increasing or strictly decreasing.
    pub fn with_note_table(beats_count: usize, note_table: Vec<u8>) -> Self {
        assert!(beats_count >= 1, "a record needs at least one beat");
        assert!(!note_table.is_empty(), "a record needs at least one track");
        let ascending = note_table.windows(2).all(|w| w[0] < w[1]);
        let descending = note_table.windows(2).all(|w| w[0] > w[1]);
        assert!(
            ascending || descending,
            "note table must be strictly monotonic: {:?}",
            note_table
        );

        let tracks_count = note_table.len();
        Self {
            note_table,
            cells: vec![vec![false; tracks_count]; beats_count],
            title: String::new(),
            comment: String::new(),
            source_path: None,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the save location
    pub fn with_source_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Number of tracks (pin rows)
    pub fn tracks_count(&self) -> usize {
        self.note_table.len()
    }

    /// Number of beats
    pub fn beats_count(&self) -> usize {
        self.cells.len()
    }

    /// Track pitches
    pub fn note_table(&self) -> &[u8] {
        &self.note_table
    }

    /// MIDI pitch of a track
    pub fn pitch(&self, track: usize) -> u8 {
        self.note_table[track]
    }

    /// First track playing `pitch`
    pub fn track_for_pitch(&self, pitch: u8) -> Option<usize> {
        self.note_table.iter().position(|&p| p == pitch)
    }

    /// Whether the cell is set
    ///
    /// # Panics
    /// If `beat` or `track` is out of range.
    pub fn has_note(&self, beat: usize, track: usize) -> bool {
        self.assert_in_range(beat, track);
        self.cells[beat][track]
    }

    /// Whether the cell is set, or `OutOfRange`
    pub fn checked_note(&self, beat: usize, track: usize) -> Result<bool> {
        self.cells
            .get(beat)
            .and_then(|column| column.get(track))
            .copied()
            .ok_or(Error::OutOfRange { beat, track })
    }

    /// Write a cell
    ///
    /// # Panics
    /// If `beat` or `track` is out of range.
    pub fn set_note(&mut self, beat: usize, track: usize, value: bool) {
        self.assert_in_range(beat, track);
        self.cells[beat][track] = value;
    }

    /// Toggle a cell
    ///
    /// # Panics
    /// If `beat` or `track` is out of range.
    pub fn reverse_note(&mut self, beat: usize, track: usize) {
        self.assert_in_range(beat, track);
        let cell = &mut self.cells[beat][track];
        *cell = !*cell;
    }

    /// All tracks at `beat`, ordered by track index
    ///
    /// # Panics
    /// If `beat` is out of range.
    pub fn get_beats(&self, beat: usize) -> &[bool] {
        assert!(
            beat < self.beats_count(),
            "beat {} out of range ({} beats)",
            beat,
            self.beats_count()
        );
        &self.cells[beat]
    }

    /// All tracks at `beat`, or `None` past the end
    pub fn column(&self, beat: usize) -> Option<&[bool]> {
        self.cells.get(beat).map(Vec::as_slice)
    }

    /// True when no track is set at `beat`
    pub fn is_silent(&self, beat: usize) -> bool {
        !self.get_beats(beat).iter().any(|&on| on)
    }

    /// Pitches to trigger at `beat`
    pub fn active_pitches(&self, beat: usize) -> Vec<u8> {
        self.get_beats(beat)
            .iter()
            .zip(&self.note_table)
            .filter(|&(&on, _)| on)
            .map(|(_, &pitch)| pitch)
            .collect()
    }

    /// Total number of set cells
    pub fn note_count(&self) -> usize {
        self.cells
            .iter()
            .map(|column| column.iter().filter(|&&on| on).count())
            .sum()
    }

    /// Grow or truncate to `new_beats_count` beats
    ///
    /// Growth appends silent beats; truncation drops the trailing beats.
    ///
    /// # Panics
    /// If `new_beats_count` is zero.
    pub fn resize(&mut self, new_beats_count: usize) {
        assert!(new_beats_count >= 1, "a record needs at least one beat");
        let tracks_count = self.tracks_count();
        self.cells
            .resize_with(new_beats_count, || vec![false; tracks_count]);
    }

    /// Grow to at least `beats_count` beats
    pub fn ensure_beats(&mut self, beats_count: usize) {
        if beats_count > self.beats_count() {
            self.resize(beats_count);
        }
    }

    fn assert_in_range(&self, beat: usize, track: usize) {
        assert!(
            beat < self.beats_count() && track < self.tracks_count(),
            "cell ({}, {}) out of range ({} beats x {} tracks)",
            beat,
            track,
            self.beats_count(),
            self.tracks_count()
        );
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Vec<bool>> {
        &mut self.cells
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(BEAT_COUNT)
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Structural edits: inserting and removing beats at a pivot.

use super::Sequence;

impl Sequence {
    /// Insert a silent beat at `pivot`, moving later beats one slot right
    ///
    /// The record grows by one beat so no trailing data is lost.
    ///
    /// # Panics
    /// If `pivot` is out of range.
    pub fn shift_right(&mut self, pivot: usize) {
        self.assert_pivot(pivot);
        let tracks_count = self.tracks_count();
        self.columns_mut().insert(pivot, vec![false; tracks_count]);
    }

    /// Remove the beat at `pivot`, moving later beats one slot left
    ///
    /// A one-beat record keeps its single beat, cleared.
    ///
    /// # Panics
    /// If `pivot` is out of range.
    pub fn shift_left(&mut self, pivot: usize) {
        self.assert_pivot(pivot);
        let tracks_count = self.tracks_count();
        let columns = self.columns_mut();
        columns.remove(pivot);
        if columns.is_empty() {
            columns.push(vec![false; tracks_count]);
        }
    }

    fn assert_pivot(&self, pivot: usize) {
        assert!(
            pivot < self.beats_count(),
            "pivot beat {} out of range ({} beats)",
            pivot,
            self.beats_count()
        );
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pin grid display widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use super::editor::EditorState;
use crate::sequence::Sequence;

const NOTE_CH: &str = "•";
const EMPTY_CH: &str = "_";
const MARKER_CH: &str = "▲";

/// Columns used by the tone labels to the right of the grid
pub const LABEL_WIDTH: u16 = 8;

/// Convert a MIDI note number to a name with its solfège syllable
pub fn tone_label(note: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    const SOLFEGE: [&str; 12] = ["Do", "", "Ré", "", "Mi", "Fa", "", "Sol", "", "La", "", "Si"];
    let octave = (note / 12) as i8 - 1;
    let class = (note % 12) as usize;
    format!("{}{} {}", NAMES[class], octave, SOLFEGE[class])
        .trim_end()
        .to_string()
}

/// Widget drawing the visible window of a record
///
/// One row per track and one column per beat, the tone of each row on the
/// right and the playback marker underneath.
pub struct GridWidget<'a> {
    sequence: &'a Sequence,
    editor: &'a EditorState,
    block: Option<Block<'a>>,
}

impl<'a> GridWidget<'a> {
    /// Create a grid widget
    pub fn new(sequence: &'a Sequence, editor: &'a EditorState) -> Self {
        Self {
            sequence,
            editor,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn cell_style(&self, beat: usize, on: bool, is_cursor: bool) -> Style {
        let style = if on {
            Style::default().fg(Color::Red).bg(Color::Yellow)
        } else if beat % 2 == 0 {
            Style::default().bg(Color::Cyan)
        } else {
            Style::default().bg(Color::Black)
        };
        if is_cursor {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        }
    }
}

impl Widget for GridWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block.clone() {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let ed = self.editor;
        let beats_count = self.sequence.beats_count();
        let rows = ed.tracks_count.min(self.sequence.tracks_count());
        let columns = ed.viewport_beats.min(area.width as usize);

        for row in 0..rows.min(area.height as usize) {
            let track = ed.track_for_row(row);
            let y = area.y + row as u16;

            for col in 0..columns {
                let beat = ed.display_from + col;
                if beat >= beats_count {
                    break;
                }
                let on = self.sequence.has_note(beat, track);
                let is_cursor = row == ed.cursor_row && col == ed.cursor_col;
                let symbol = if on { NOTE_CH } else { EMPTY_CH };
                buf.set_string(
                    area.x + col as u16,
                    y,
                    symbol,
                    self.cell_style(beat, on, is_cursor),
                );
            }

            let label_x = area.x + columns as u16 + 1;
            if label_x < area.right() {
                let label_style = if row == ed.cursor_row {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                let width = (area.right() - label_x) as usize;
                let label = tone_label(self.sequence.pitch(track));
                buf.set_stringn(label_x, y, label, width, label_style);
            }
        }

        // start marker, or the beat being played
        let marker_y = area.y + rows as u16;
        if marker_y < area.bottom() {
            let (beat, style) = match ed.play_position {
                Some(beat) => (beat, Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                None => (ed.player_start_at, Style::default()),
            };
            if let Some(col) = beat.checked_sub(ed.display_from).filter(|&c| c < columns) {
                buf.set_string(area.x + col as u16, marker_y, MARKER_CH, style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(buf: &Buffer, x: u16, y: u16) -> &str {
        buf[(x, y)].symbol()
    }

    #[test]
    fn test_tone_label() {
        assert_eq!(tone_label(67), "G4 Sol");
        assert_eq!(tone_label(74), "D5 Ré");
        assert_eq!(tone_label(98), "D7 Ré");
        assert_eq!(tone_label(61), "C#4");
    }

    #[test]
    fn test_renders_notes_descending() {
        let mut seq = Sequence::new(8);
        seq.set_note(0, 15, true); // top row when descending
        seq.set_note(3, 0, true); // bottom row

        let editor = EditorState::new(16, 8);
        let area = Rect::new(0, 0, 8 + 1 + LABEL_WIDTH, 17);
        let mut buf = Buffer::empty(area);
        GridWidget::new(&seq, &editor).render(area, &mut buf);

        assert_eq!(symbol(&buf, 0, 0), NOTE_CH);
        assert_eq!(symbol(&buf, 1, 0), EMPTY_CH);
        assert_eq!(symbol(&buf, 3, 15), NOTE_CH);
        assert_eq!(symbol(&buf, 3, 14), EMPTY_CH);

        // tone labels after a one column gap
        assert_eq!(symbol(&buf, 9, 0), "D");
        assert_eq!(symbol(&buf, 9, 15), "G");

        // start marker under beat 0
        assert_eq!(symbol(&buf, 0, 16), MARKER_CH);
    }

    #[test]
    fn test_renders_window_only() {
        let mut seq = Sequence::new(20);
        seq.set_note(12, 0, true);

        let mut editor = EditorState::new(16, 5);
        editor.tone_descending = false;
        editor.display_from = 10;
        editor.play_position = Some(14);

        let area = Rect::new(0, 0, 5 + 1 + LABEL_WIDTH, 17);
        let mut buf = Buffer::empty(area);
        GridWidget::new(&seq, &editor).render(area, &mut buf);

        assert_eq!(symbol(&buf, 2, 0), NOTE_CH);
        assert_eq!(symbol(&buf, 4, 16), MARKER_CH);
        assert_eq!(symbol(&buf, 0, 16), " ");
    }

    #[test]
    fn test_beats_past_the_end_are_blank() {
        let seq = Sequence::new(3);
        let editor = EditorState::new(16, 6);
        let area = Rect::new(0, 0, 6 + 1 + LABEL_WIDTH, 17);
        let mut buf = Buffer::empty(area);
        GridWidget::new(&seq, &editor).render(area, &mut buf);

        assert_eq!(symbol(&buf, 2, 0), EMPTY_CH);
        assert_eq!(symbol(&buf, 3, 0), " ");
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editor cursor, viewport and key bindings.
//!
//! The grid on screen is a window of `viewport_beats` columns starting at
//! `display_from`. The cursor lives inside that window; moving it past an
//! edge scrolls the window instead. Rows run high tone to low tone unless
//! `tone_descending` is off.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};

/// How long a status message stays visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Editor input mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Grid navigation and commands
    #[default]
    Normal,
    /// Editing the title; holds the text typed so far
    Title(String),
}

/// Something the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    /// Nothing bound to the key
    None,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageLeft,
    PageRight,
    Home,
    End,
    /// Flip the note under the cursor
    ToggleNote,
    /// Insert an empty beat at the cursor
    ShiftRight,
    /// Remove the beat at the cursor
    ShiftLeft,
    /// Sound the note under the cursor
    PlayNote,
    /// Sound every note of the cursor's beat
    PlayBeat,
    /// Start or stop playback
    TogglePlay,
    /// Move the start marker to the cursor
    MarkStart,
    StartEarlier,
    StartLater,
    EditTitle,
    Save,
    Reload,
    Export,
    Quit,
}

/// Map a key press in normal mode to an action
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> EditorAction {
    match (code, modifiers) {
        (KeyCode::Left, KeyModifiers::SHIFT) | (KeyCode::PageUp, _) => EditorAction::PageLeft,
        (KeyCode::Right, KeyModifiers::SHIFT) | (KeyCode::PageDown, _) => EditorAction::PageRight,
        (KeyCode::Up, _) => EditorAction::MoveUp,
        (KeyCode::Down, _) => EditorAction::MoveDown,
        (KeyCode::Left, _) => EditorAction::MoveLeft,
        (KeyCode::Right, _) => EditorAction::MoveRight,
        (KeyCode::Home, _) => EditorAction::Home,
        (KeyCode::End, _) => EditorAction::End,

        (KeyCode::Char('c'), KeyModifiers::CONTROL) => EditorAction::Quit,
        (KeyCode::Char(c), _) => match c {
            ' ' => EditorAction::ToggleNote,
            '+' => EditorAction::ShiftRight,
            '-' => EditorAction::ShiftLeft,
            't' => EditorAction::PlayNote,
            'r' => EditorAction::PlayBeat,
            'p' => EditorAction::TogglePlay,
            'o' => EditorAction::MarkStart,
            'u' => EditorAction::StartEarlier,
            'i' => EditorAction::StartLater,
            'e' => EditorAction::EditTitle,
            's' => EditorAction::Save,
            'l' => EditorAction::Reload,
            'x' => EditorAction::Export,
            'q' => EditorAction::Quit,
            _ => EditorAction::None,
        },

        _ => EditorAction::None,
    }
}

/// Cursor, viewport and transient display state of the editor
#[derive(Debug, Clone)]
pub struct EditorState {
    /// Cursor row on screen (0 = top)
    pub cursor_row: usize,
    /// Cursor column inside the viewport
    pub cursor_col: usize,
    /// First beat shown
    pub display_from: usize,
    /// Number of beat columns shown
    pub viewport_beats: usize,
    /// Rows on screen
    pub tracks_count: usize,
    /// Beat playback starts from
    pub player_start_at: usize,
    /// Highest tone on the top row
    pub tone_descending: bool,
    /// Beat last reported by a running playback
    pub play_position: Option<usize>,
    /// Current input mode
    pub mode: EditMode,
    status: Option<(String, Instant)>,
}

impl EditorState {
    /// Create an editor for `tracks_count` rows with a window of `viewport_beats`
    pub fn new(tracks_count: usize, viewport_beats: usize) -> Self {
        Self {
            cursor_row: 0,
            cursor_col: 0,
            display_from: 0,
            viewport_beats: viewport_beats.max(1),
            tracks_count: tracks_count.max(1),
            player_start_at: 0,
            tone_descending: true,
            play_position: None,
            mode: EditMode::Normal,
            status: None,
        }
    }

    /// Beat under the cursor
    pub fn cursor_beat(&self) -> usize {
        self.display_from + self.cursor_col
    }

    /// Track under the cursor
    pub fn cursor_track(&self) -> usize {
        self.track_for_row(self.cursor_row)
    }

    /// Track drawn on screen row `row`
    pub fn track_for_row(&self, row: usize) -> usize {
        if self.tone_descending {
            self.tracks_count - 1 - row
        } else {
            row
        }
    }

    /// Screen row of `track`
    pub fn row_for_track(&self, track: usize) -> usize {
        // the mapping is its own inverse
        self.track_for_row(track)
    }

    pub fn move_up(&mut self) {
        self.cursor_row = self.cursor_row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.tracks_count {
            self.cursor_row += 1;
        }
    }

    /// Move left, scrolling the window at its left edge
    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.display_from > 0 {
            self.display_from -= 1;
        }
    }

    /// Move right, scrolling the window at its right edge
    pub fn move_right(&mut self, beats_count: usize) {
        if self.cursor_col + 1 < self.viewport_beats {
            self.cursor_col += 1;
        } else if self.display_from + self.viewport_beats < beats_count {
            self.display_from += 1;
        }
    }

    /// Scroll one window back
    pub fn page_left(&mut self) {
        self.display_from = self.display_from.saturating_sub(self.viewport_beats);
    }

    /// Scroll one window forward, stopping where the last window starts
    pub fn page_right(&mut self, beats_count: usize) {
        let last_window = beats_count.saturating_sub(self.viewport_beats);
        self.display_from = (self.display_from + self.viewport_beats).min(last_window);
    }

    /// Jump to the first beat
    pub fn home(&mut self) {
        self.display_from = 0;
        self.cursor_col = 0;
    }

    /// Jump to the last beat
    pub fn end(&mut self, beats_count: usize) {
        self.display_from = beats_count.saturating_sub(self.viewport_beats);
        self.cursor_col = self.viewport_beats.min(beats_count).saturating_sub(1);
    }

    /// Change the window width, keeping the cursor beat visible
    pub fn set_viewport(&mut self, viewport_beats: usize) {
        let viewport_beats = viewport_beats.max(1);
        if viewport_beats == self.viewport_beats {
            return;
        }
        let beat = self.cursor_beat();
        self.viewport_beats = viewport_beats;
        if self.cursor_col >= viewport_beats {
            self.cursor_col = viewport_beats - 1;
            self.display_from = beat - self.cursor_col;
        }
    }

    /// Pull the window, cursor and start marker back inside a record that shrank
    pub fn fit(&mut self, beats_count: usize) {
        let last_window = beats_count.saturating_sub(self.viewport_beats);
        if self.display_from > last_window {
            self.display_from = last_window;
        }
        if self.cursor_beat() >= beats_count {
            self.cursor_col = beats_count.saturating_sub(1).saturating_sub(self.display_from);
        }
        if self.player_start_at >= beats_count {
            self.player_start_at = beats_count.saturating_sub(1);
        }
    }

    /// Set the start marker; ignored outside the record
    pub fn set_player_start(&mut self, beat: usize, beats_count: usize) {
        if beat < beats_count {
            self.player_start_at = beat;
        }
    }

    pub fn player_start_later(&mut self, beats_count: usize) {
        self.set_player_start(self.player_start_at + 1, beats_count);
    }

    pub fn player_start_earlier(&mut self) {
        if self.player_start_at > 0 {
            self.player_start_at -= 1;
        }
    }

    /// Show a message on the status line
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    /// Current status message, if it has not expired
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TIMEOUT)
            .map(|(message, _)| message.as_str())
    }

    /// Start editing the title from `current`
    pub fn begin_title_edit(&mut self, current: &str) {
        self.mode = EditMode::Title(current.to_string());
    }

    /// Feed a key to the title editor
    ///
    /// Returns the new title when Enter is pressed. Esc abandons the edit.
    pub fn edit_title(&mut self, code: KeyCode) -> Option<String> {
        let EditMode::Title(text) = &mut self.mode else {
            return None;
        };
        match code {
            KeyCode::Char(c) => {
                text.push(c);
                None
            }
            KeyCode::Backspace => {
                text.pop();
                None
            }
            KeyCode::Enter => {
                let title = text.trim().to_string();
                self.mode = EditMode::Normal;
                Some(title)
            }
            KeyCode::Esc => {
                self.mode = EditMode::Normal;
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> EditorState {
        EditorState::new(16, 10)
    }

    #[test]
    fn test_key_map() {
        assert_eq!(map_key(KeyCode::Left, KeyModifiers::NONE), EditorAction::MoveLeft);
        assert_eq!(map_key(KeyCode::Left, KeyModifiers::SHIFT), EditorAction::PageLeft);
        assert_eq!(map_key(KeyCode::PageDown, KeyModifiers::NONE), EditorAction::PageRight);
        assert_eq!(map_key(KeyCode::Char(' '), KeyModifiers::NONE), EditorAction::ToggleNote);
        assert_eq!(map_key(KeyCode::Char('+'), KeyModifiers::SHIFT), EditorAction::ShiftRight);
        assert_eq!(map_key(KeyCode::Char('p'), KeyModifiers::NONE), EditorAction::TogglePlay);
        assert_eq!(map_key(KeyCode::Char('c'), KeyModifiers::CONTROL), EditorAction::Quit);
        assert_eq!(map_key(KeyCode::Char('z'), KeyModifiers::NONE), EditorAction::None);
        assert_eq!(map_key(KeyCode::F(1), KeyModifiers::NONE), EditorAction::None);
    }

    #[test]
    fn test_descending_row_mapping() {
        let mut ed = editor();
        assert_eq!(ed.cursor_track(), 15);
        ed.cursor_row = 15;
        assert_eq!(ed.cursor_track(), 0);
        assert_eq!(ed.row_for_track(3), 12);

        ed.tone_descending = false;
        assert_eq!(ed.cursor_track(), 15);
        assert_eq!(ed.row_for_track(3), 3);
    }

    #[test]
    fn test_vertical_moves_stay_on_grid() {
        let mut ed = editor();
        ed.move_up();
        assert_eq!(ed.cursor_row, 0);
        for _ in 0..20 {
            ed.move_down();
        }
        assert_eq!(ed.cursor_row, 15);
    }

    #[test]
    fn test_horizontal_moves_scroll_at_edges() {
        let mut ed = editor();
        for _ in 0..9 {
            ed.move_right(30);
        }
        assert_eq!((ed.cursor_col, ed.display_from), (9, 0));

        ed.move_right(30);
        assert_eq!((ed.cursor_col, ed.display_from), (9, 1));
        assert_eq!(ed.cursor_beat(), 10);

        for _ in 0..50 {
            ed.move_right(30);
        }
        assert_eq!(ed.display_from, 20);
        assert_eq!(ed.cursor_beat(), 29);

        for _ in 0..9 {
            ed.move_left();
        }
        assert_eq!((ed.cursor_col, ed.display_from), (0, 20));
        ed.move_left();
        assert_eq!((ed.cursor_col, ed.display_from), (0, 19));
    }

    #[test]
    fn test_paging() {
        let mut ed = editor();
        ed.page_right(25);
        assert_eq!(ed.display_from, 10);
        ed.page_right(25);
        assert_eq!(ed.display_from, 15);
        ed.page_left();
        assert_eq!(ed.display_from, 5);
        ed.page_left();
        assert_eq!(ed.display_from, 0);

        // a record narrower than the window never scrolls
        ed.page_right(4);
        assert_eq!(ed.display_from, 0);
    }

    #[test]
    fn test_home_and_end() {
        let mut ed = editor();
        ed.end(86);
        assert_eq!(ed.display_from, 76);
        assert_eq!(ed.cursor_beat(), 85);

        ed.home();
        assert_eq!(ed.cursor_beat(), 0);

        ed.end(4);
        assert_eq!(ed.cursor_beat(), 3);
    }

    #[test]
    fn test_player_start_marker() {
        let mut ed = editor();
        ed.set_player_start(12, 20);
        assert_eq!(ed.player_start_at, 12);
        ed.set_player_start(20, 20);
        assert_eq!(ed.player_start_at, 12);

        ed.player_start_later(13);
        assert_eq!(ed.player_start_at, 12);
        ed.player_start_earlier();
        assert_eq!(ed.player_start_at, 11);

        ed.player_start_at = 0;
        ed.player_start_earlier();
        assert_eq!(ed.player_start_at, 0);
    }

    #[test]
    fn test_fit_after_shrink() {
        let mut ed = editor();
        ed.end(40);
        ed.player_start_at = 39;
        ed.fit(35);
        assert_eq!(ed.display_from, 25);
        assert_eq!(ed.cursor_beat(), 34);
        assert_eq!(ed.player_start_at, 34);
    }

    #[test]
    fn test_set_viewport_keeps_cursor_beat() {
        let mut ed = editor();
        ed.cursor_col = 8;
        ed.display_from = 4;
        ed.set_viewport(5);
        assert_eq!(ed.cursor_col, 4);
        assert_eq!(ed.cursor_beat(), 12);

        ed.set_viewport(40);
        assert_eq!(ed.cursor_beat(), 12);
    }

    #[test]
    fn test_title_editing() {
        let mut ed = editor();
        ed.begin_title_edit("Waltz");
        assert_eq!(ed.edit_title(KeyCode::Backspace), None);
        assert_eq!(ed.edit_title(KeyCode::Char('e')), None);
        assert_eq!(ed.edit_title(KeyCode::Char('s')), None);
        assert_eq!(ed.edit_title(KeyCode::Enter), Some("Waltes".to_string()));
        assert_eq!(ed.mode, EditMode::Normal);

        ed.begin_title_edit("Keep");
        ed.edit_title(KeyCode::Char('!'));
        assert_eq!(ed.edit_title(KeyCode::Esc), None);
        assert_eq!(ed.mode, EditMode::Normal);

        // ignored outside title mode
        assert_eq!(ed.edit_title(KeyCode::Enter), None);
    }

    #[test]
    fn test_status_message() {
        let mut ed = editor();
        assert_eq!(ed.status(), None);
        ed.set_status("Saved");
        assert_eq!(ed.status(), Some("Saved"));
    }
}

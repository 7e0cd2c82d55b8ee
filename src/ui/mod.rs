// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal editor for records.
//!
//! Provides a ratatui-based grid editor. The interactive loop polls for keys
//! with a short timeout, drains playback progress without blocking and
//! redraws, so the grid stays editable while a record plays.

pub mod editor;
pub mod grid;

pub use editor::{map_key, EditMode, EditorAction, EditorState};
pub use grid::{tone_label, GridWidget, LABEL_WIDTH};

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing::{info, warn};

use crate::midi::MidiExporter;
use crate::sequence::Sequence;
use crate::sequencer::{PlayerState, Progress, Scheduler};

/// Everything the editor works on, without the terminal
pub struct Session {
    sequence: Arc<RwLock<Sequence>>,
    /// Cursor and display state
    pub editor: EditorState,
    scheduler: Scheduler,
    exporter: MidiExporter,
    running: bool,
}

impl Session {
    /// Create a session editing `sequence`
    pub fn new(sequence: Sequence, scheduler: Scheduler, exporter: MidiExporter) -> Self {
        let editor = EditorState::new(sequence.tracks_count(), sequence.beats_count());
        Self {
            sequence: Arc::new(RwLock::new(sequence)),
            editor,
            scheduler,
            exporter,
            running: true,
        }
    }

    /// Shared handle on the record
    pub fn sequence(&self) -> Arc<RwLock<Sequence>> {
        Arc::clone(&self.sequence)
    }

    fn read(&self) -> RwLockReadGuard<'_, Sequence> {
        self.sequence.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Sequence> {
        self.sequence.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The playback scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Check if the loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feed one key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        if matches!(self.editor.mode, EditMode::Title(_)) {
            if let Some(title) = self.editor.edit_title(key.code) {
                info!(title = %title, "title changed");
                self.write().title = title;
            }
            return;
        }
        let action = map_key(key.code, key.modifiers);
        self.apply(action);
    }

    /// Carry out an editor action
    pub fn apply(&mut self, action: EditorAction) {
        let beats_count = self.read().beats_count();
        let ed = &mut self.editor;

        match action {
            EditorAction::None => {}
            EditorAction::MoveUp => ed.move_up(),
            EditorAction::MoveDown => ed.move_down(),
            EditorAction::MoveLeft => ed.move_left(),
            EditorAction::MoveRight => ed.move_right(beats_count),
            EditorAction::PageLeft => ed.page_left(),
            EditorAction::PageRight => ed.page_right(beats_count),
            EditorAction::Home => ed.home(),
            EditorAction::End => ed.end(beats_count),

            EditorAction::ToggleNote => {
                let (beat, track) = (ed.cursor_beat(), ed.cursor_track());
                let mut seq = self.write();
                seq.ensure_beats(beat + 1);
                seq.reverse_note(beat, track);
            }
            EditorAction::ShiftRight => {
                let beat = ed.cursor_beat();
                if beat < beats_count {
                    self.write().shift_right(beat);
                }
            }
            EditorAction::ShiftLeft => {
                let beat = ed.cursor_beat();
                if beat < beats_count {
                    let mut seq = self.write();
                    seq.shift_left(beat);
                    let remaining = seq.beats_count();
                    drop(seq);
                    self.editor.fit(remaining);
                }
            }

            EditorAction::PlayNote => {
                let track = ed.cursor_track();
                let pitch = self.read().pitch(track);
                self.sound(&[pitch]);
            }
            EditorAction::PlayBeat => {
                let beat = ed.cursor_beat();
                let pitches = {
                    let seq = self.read();
                    seq.column(beat).map(|_| seq.active_pitches(beat))
                };
                if let Some(pitches) = pitches {
                    self.sound(&pitches);
                }
            }
            EditorAction::TogglePlay => self.toggle_play(),

            EditorAction::MarkStart => {
                let beat = ed.cursor_beat();
                ed.set_player_start(beat, beats_count);
            }
            EditorAction::StartEarlier => ed.player_start_earlier(),
            EditorAction::StartLater => ed.player_start_later(beats_count),

            EditorAction::EditTitle => {
                let title = self.read().title.clone();
                self.editor.begin_title_edit(&title);
            }
            EditorAction::Save => self.save(),
            EditorAction::Reload => self.reload(),
            EditorAction::Export => self.export(),
            EditorAction::Quit => self.quit(),
        }
    }

    /// Trigger pitches on the playback sink
    fn sound(&self, pitches: &[u8]) {
        let mut sink = self
            .scheduler
            .sink()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for &pitch in pitches {
            if let Err(e) = sink.note_on(pitch) {
                warn!(pitch, error = %e, "note trigger failed");
            }
        }
    }

    fn toggle_play(&mut self) {
        let start = self.editor.player_start_at;
        match self.scheduler.toggle(self.sequence(), start) {
            Ok(PlayerState::Playing) => self.editor.set_status(format!("Playing from beat {}", start)),
            Ok(PlayerState::Idle) => {
                self.editor.play_position = None;
                self.editor.set_status("Stopped");
            }
            Err(e) => {
                warn!(error = %e, "playback failed to start");
                self.editor.set_status(format!("Playback failed: {}", e));
            }
        }
    }

    fn save(&mut self) {
        let result = self.read().save();
        match result {
            Ok(()) => {
                let path = self.read().source_path.clone().unwrap_or_default();
                self.editor.set_status(format!("Saved {}", path.display()));
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                self.editor.set_status(format!("Save failed: {}", e));
            }
        }
    }

    fn reload(&mut self) {
        let result = self.write().reload();
        match result {
            Ok(()) => {
                let beats_count = self.read().beats_count();
                self.editor.fit(beats_count);
                self.editor.set_status("Reloaded");
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.editor.set_status(format!("Reload failed: {}", e));
            }
        }
    }

    /// File the `x` key exports to: `<title>.mid` next to the record
    pub fn export_path(&self) -> PathBuf {
        let seq = self.read();
        let name = if seq.title.trim().is_empty() {
            "untitled"
        } else {
            seq.title.trim()
        };
        let file = format!("{}.mid", name);
        match seq.source_path.as_ref().and_then(|p| p.parent()) {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }

    fn export(&mut self) {
        let path = self.export_path();
        let result = self.exporter.export(&self.read(), &path);
        match result {
            Ok(()) => self.editor.set_status(format!("Exported {}", path.display())),
            Err(e) => {
                warn!(error = %e, "export failed");
                self.editor.set_status(format!("Export failed: {}", e));
            }
        }
    }

    /// Stop playback and leave the loop
    pub fn quit(&mut self) {
        self.scheduler.stop();
        self.running = false;
    }

    /// Apply all waiting playback reports to the display
    pub fn poll_progress(&mut self) {
        for report in self.scheduler.drain_progress() {
            match report {
                Progress::Beat(beat) => self.editor.play_position = Some(beat),
                Progress::Finished => self.editor.play_position = None,
            }
        }
    }
}

/// Terminal UI application
pub struct App {
    session: Session,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Input poll interval
    frame: Duration,
}

impl App {
    /// Take over the terminal
    pub fn new(session: Session, frame: Duration) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            session,
            terminal,
            frame,
        })
    }

    /// Run until the user quits
    pub fn run(&mut self) -> Result<()> {
        while self.session.is_running() {
            self.draw().context("Failed to draw the editor")?;

            if event::poll(self.frame)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.session.handle_key(key);
                    }
                }
            }
            self.session.poll_progress();
        }
        Ok(())
    }

    /// Draw the UI
    pub fn draw(&mut self) -> io::Result<()> {
        let session = &mut self.session;
        self.terminal.draw(|frame| render(frame, session))?;
        Ok(())
    }

    /// Cleanup terminal on drop
    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.session.quit();
        let _ = self.cleanup();
    }
}

fn render(frame: &mut Frame, session: &mut Session) {
    let area = frame.area();
    let tracks = session.editor.tracks_count as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(tracks + 3), // Grid + marker row
            Constraint::Length(1),          // Title editor / status
            Constraint::Length(1),          // Key help
            Constraint::Min(0),
        ])
        .split(area);

    // Fit the window to the terminal width
    let viewport = chunks[0].width.saturating_sub(2 + 1 + LABEL_WIDTH).max(1);
    session.editor.set_viewport(viewport as usize);

    let seq = session.read();
    let title = if seq.title.is_empty() {
        " untitled ".to_string()
    } else {
        format!(" {} ", seq.title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_bottom(Line::from(format!(
            " beat {}/{} ",
            session.editor.cursor_beat() + 1,
            seq.beats_count()
        )));
    frame.render_widget(GridWidget::new(&seq, &session.editor).block(block), chunks[0]);
    drop(seq);

    render_status_line(frame, chunks[1], session);
    render_help_line(frame, chunks[2]);
}

fn render_status_line(frame: &mut Frame, area: Rect, session: &Session) {
    let line = match &session.editor.mode {
        EditMode::Title(text) => Line::from(vec![
            Span::styled(" Title: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(text.clone()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]),
        EditMode::Normal => {
            let playing = if session.scheduler().is_playing() {
                Span::styled(" ▶ PLAY ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::styled(" ■ STOP ", Style::default().fg(Color::Yellow))
            };
            let message = session.editor.status().unwrap_or_default().to_string();
            Line::from(vec![
                playing,
                Span::styled(
                    format!(" start {} ", session.editor.player_start_at + 1),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(message, Style::default().fg(Color::Yellow)),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help_line(frame: &mut Frame, area: Rect) {
    let help = Span::styled(
        " Space: Note | +/-: Shift | t/r: Hear | p: Play | o/u/i: Start | e: Title | s/l: Save/Load | x: Export | q: Quit",
        Style::default().fg(Color::DarkGray),
    );
    frame.render_widget(Paragraph::new(help), area);
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Background playback with progress reporting.
//!
//! A playback run walks the record one beat at a time on its own thread:
//! note on for every set track, wait one beat, note off, then report the beat
//! on a channel. The editor drains that channel on its own schedule and never
//! waits on the playback thread. Cancellation is cooperative and takes effect
//! at the next beat boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::PlaybackConfig;
use crate::error::Result;
use crate::sequence::Sequence;
use crate::sound::SharedSink;

/// Progress report from a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// This beat has been played
    Beat(usize),
    /// The run reached the end of the record
    Finished,
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No playback thread running
    Idle,
    /// A playback thread is walking the record
    Playing,
}

/// Shared stop flag polled once per beat
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at the next beat boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Walk `sequence` from `start_beat` to the end, sounding each beat on `sink`
///
/// Sends `Progress::Beat` after each beat in increasing order and
/// `Progress::Finished` once the end is reached. Returns `false` without
/// sending `Finished` if `cancel` fired or the progress receiver went away.
/// Sink failures are logged and playback carries on.
pub fn play_beats(
    sequence: &RwLock<Sequence>,
    start_beat: usize,
    beat_duration: Duration,
    sink: &SharedSink,
    cancel: &CancelToken,
    progress: &Sender<Progress>,
) -> bool {
    let end = sequence
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .beats_count();

    for beat in start_beat..end {
        if cancel.is_cancelled() {
            debug!(beat, "playback cancelled");
            return false;
        }

        // Copy the column so edits are not blocked while the beat sounds
        let pitches = {
            let seq = sequence.read().unwrap_or_else(PoisonError::into_inner);
            seq.column(beat).map(|_| seq.active_pitches(beat))
        };
        let Some(pitches) = pitches else {
            debug!(beat, "record shrank during playback");
            break;
        };

        trigger(sink, &pitches, true);
        thread::sleep(beat_duration);
        trigger(sink, &pitches, false);

        if progress.send(Progress::Beat(beat)).is_err() {
            return false;
        }
    }

    let _ = progress.send(Progress::Finished);
    true
}

fn trigger(sink: &SharedSink, pitches: &[u8], on: bool) {
    if pitches.is_empty() {
        return;
    }
    let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
    for &pitch in pitches {
        let result = if on {
            sink.note_on(pitch)
        } else {
            sink.note_off(pitch)
        };
        if let Err(e) = result {
            warn!(pitch, on, error = %e, "note trigger failed");
        }
    }
}

struct PlaybackRun {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Starts, stops and reports on playback runs, one at a time
pub struct Scheduler {
    sink: SharedSink,
    config: PlaybackConfig,
    run: Option<PlaybackRun>,
    progress: Option<Receiver<Progress>>,
}

impl Scheduler {
    /// Create an idle scheduler
    pub fn new(sink: SharedSink, config: PlaybackConfig) -> Self {
        Self {
            sink,
            config,
            run: None,
            progress: None,
        }
    }

    /// Playback timing
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Change timing; applies from the next run
    pub fn set_config(&mut self, config: PlaybackConfig) {
        self.config = config;
    }

    /// The sink used for playback
    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Start playing from `start_beat`, stopping any current run first
    pub fn start(&mut self, sequence: Arc<RwLock<Sequence>>, start_beat: usize) -> Result<()> {
        self.stop();

        let beats = sequence
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .beats_count();
        let beat_duration = self.config.beat_duration(beats)?;

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let sink = Arc::clone(&self.sink);

        let handle = thread::Builder::new()
            .name("fpr-playback".to_string())
            .spawn(move || {
                if play_beats(&sequence, start_beat, beat_duration, &sink, &token, &tx) {
                    debug!("playback finished");
                }
            })?;

        info!(start_beat, beats, ?beat_duration, "playback started");
        self.run = Some(PlaybackRun { cancel, handle });
        self.progress = Some(rx);
        Ok(())
    }

    /// Cancel the current run and wait for its thread to exit
    ///
    /// Reports the run queued before it stopped are discarded.
    pub fn stop(&mut self) {
        self.progress = None;
        if let Some(run) = self.run.take() {
            let was_running = !run.handle.is_finished();
            run.cancel.cancel();
            if run.handle.join().is_err() {
                warn!("playback thread panicked");
            }
            if was_running {
                info!("playback stopped");
            }
        }
    }

    /// Wait for the current run to reach the end
    pub fn wait(&mut self) {
        if let Some(run) = self.run.take() {
            if run.handle.join().is_err() {
                warn!("playback thread panicked");
            }
        }
    }

    /// Current state
    pub fn state(&self) -> PlayerState {
        match &self.run {
            Some(run) if !run.handle.is_finished() => PlayerState::Playing,
            _ => PlayerState::Idle,
        }
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state() == PlayerState::Playing
    }

    /// Stop if playing, otherwise start from `start_beat`
    pub fn toggle(&mut self, sequence: Arc<RwLock<Sequence>>, start_beat: usize) -> Result<PlayerState> {
        if self.is_playing() {
            self.stop();
            Ok(PlayerState::Idle)
        } else {
            self.start(sequence, start_beat)?;
            Ok(PlayerState::Playing)
        }
    }

    /// Next progress report, if one is waiting (non-blocking)
    pub fn try_progress(&self) -> Option<Progress> {
        self.progress.as_ref()?.try_recv().ok()
    }

    /// All progress reports waiting, oldest first (non-blocking)
    pub fn drain_progress(&self) -> Vec<Progress> {
        let mut reports = Vec::new();
        while let Some(report) = self.try_progress() {
            reports.push(report);
        }
        reports
    }

    /// Block up to `timeout` for the next progress report
    pub fn recv_progress_timeout(&self, timeout: Duration) -> Option<Progress> {
        self.progress.as_ref()?.recv_timeout(timeout).ok()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pre-rendered sample playback via cpal.
//!
//! Each pitch of the record has a recording named `<pitch>.wav`. A note on
//! starts a fresh voice from the top of that recording; music box notes ring
//! out on their own, so note off does nothing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{debug, info, warn};

use super::NoteSink;
use crate::error::{Error, Result};

/// Voices beyond this count steal the oldest one
const MAX_VOICES: usize = 32;

/// A mono recording
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Mono frames in -1.0..=1.0
    pub frames: Vec<f32>,
    /// Recording sample rate in Hz
    pub sample_rate: u32,
}

/// Load a WAV file, mixing all channels down to mono
pub fn load_sample<P: AsRef<Path>>(path: P) -> Result<Sample> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| Error::Audio(format!("Failed to open {}: {}", path.display(), e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(format!("Failed to read {}: {}", path.display(), e)))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(format!("Failed to read {}: {}", path.display(), e)))?
        }
    };

    let frames = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok(Sample {
        frames,
        sample_rate: spec.sample_rate,
    })
}

/// Load `<dir>/<pitch>.wav` for every pitch that has a file
pub fn load_bank<P: AsRef<Path>>(dir: P, pitches: &[u8]) -> HashMap<u8, Arc<Sample>> {
    let dir = dir.as_ref();
    let mut bank = HashMap::new();
    for &pitch in pitches {
        let path = dir.join(format!("{}.wav", pitch));
        match load_sample(&path) {
            Ok(sample) => {
                bank.insert(pitch, Arc::new(sample));
            }
            Err(e) => warn!(pitch, error = %e, "sample not loaded"),
        }
    }
    bank
}

/// A sample being played
#[derive(Debug, Clone)]
struct Voice {
    sample: Arc<Sample>,
    position: f64,
    step: f64,
}

impl Voice {
    fn new(sample: Arc<Sample>, output_rate: u32) -> Self {
        let step = sample.sample_rate as f64 / output_rate.max(1) as f64;
        Self {
            sample,
            position: 0.0,
            step,
        }
    }

    fn finished(&self) -> bool {
        self.position as usize >= self.sample.frames.len()
    }

    fn next_frame(&mut self) -> f32 {
        let value = self
            .sample
            .frames
            .get(self.position as usize)
            .copied()
            .unwrap_or(0.0);
        self.position += self.step;
        value
    }
}

/// Sum all voices into an interleaved buffer and drop finished ones
fn mix(voices: &mut Vec<Voice>, buffer: &mut [f32], channels: usize) {
    for frame in buffer.chunks_mut(channels.max(1)) {
        let value: f32 = voices.iter_mut().map(Voice::next_frame).sum();
        frame.fill(value.clamp(-1.0, 1.0));
    }
    voices.retain(|voice| !voice.finished());
}

/// Note sink playing WAV samples on the default output device
pub struct SampleSink {
    bank: HashMap<u8, Arc<Sample>>,
    voices: Arc<Mutex<Vec<Voice>>>,
    output_rate: u32,
    /// Dropping this ends the stream thread
    stop: Option<Sender<()>>,
    stream_thread: Option<JoinHandle<()>>,
}

impl SampleSink {
    /// Load samples for `pitches` from `dir` and open the output device
    pub fn open<P: AsRef<Path>>(dir: P, pitches: &[u8]) -> Result<Self> {
        let dir = dir.as_ref();
        let bank = load_bank(dir, pitches);
        if bank.is_empty() {
            return Err(Error::Audio(format!("no samples found in {}", dir.display())));
        }

        let voices = Arc::new(Mutex::new(Vec::new()));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        // cpal streams are not Send, so one thread owns the stream for its lifetime
        let stream_voices = Arc::clone(&voices);
        let stream_thread = thread::Builder::new()
            .name("fpr-samples".to_string())
            .spawn(move || match build_stream(stream_voices) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        let output_rate = ready_rx
            .recv()
            .map_err(|_| Error::Audio("audio thread exited during startup".to_string()))??;

        info!(dir = %dir.display(), samples = bank.len(), output_rate, "sample playback ready");
        Ok(Self {
            bank,
            voices,
            output_rate,
            stop: Some(stop_tx),
            stream_thread: Some(stream_thread),
        })
    }

    /// Number of pitches with a sample
    pub fn sample_count(&self) -> usize {
        self.bank.len()
    }
}

fn build_stream(voices: Arc<Mutex<Vec<Voice>>>) -> Result<(Stream, u32)> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("No audio device available".to_string()))?;

    let supported_config = device
        .default_output_config()
        .map_err(|e| Error::Audio(format!("Failed to get default config: {}", e)))?;

    let stream_config: StreamConfig = supported_config.config();
    let channels = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    *sample = 0.0;
                }
                if let Ok(mut voices) = voices.lock() {
                    mix(&mut voices, data, channels);
                }
            },
            move |err| {
                warn!(error = %err, "audio stream error");
            },
            None,
        )
        .map_err(|e| Error::Audio(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| Error::Audio(format!("Failed to start stream: {}", e)))?;

    Ok((stream, sample_rate))
}

impl NoteSink for SampleSink {
    fn note_on(&mut self, pitch: u8) -> Result<()> {
        let Some(sample) = self.bank.get(&pitch) else {
            debug!(pitch, "no sample for pitch");
            return Ok(());
        };
        let mut voices = self
            .voices
            .lock()
            .map_err(|_| Error::Audio("Failed to acquire voice lock".to_string()))?;
        if voices.len() >= MAX_VOICES {
            voices.remove(0);
        }
        voices.push(Voice::new(Arc::clone(sample), self.output_rate));
        Ok(())
    }

    fn note_off(&mut self, _pitch: u8) -> Result<()> {
        Ok(())
    }

    fn program_change(&mut self, _program: u8) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "samples"
    }
}

impl Drop for SampleSink {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}

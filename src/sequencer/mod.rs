// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time playback of a record.
//!
//! This module provides:
//! - Beat timing (a full disc always takes the same wall-clock time)
//! - A background scheduler with progress reporting and cancellation

pub mod scheduler;

pub use scheduler::{play_beats, CancelToken, PlayerState, Progress, Scheduler};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Playback timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Seconds for one turn of the disc
    pub disc_seconds: f64,
    /// Spread the record over a whole turn of the disc
    pub whole_disc: bool,
    /// Beat length when `whole_disc` is off
    pub beat_seconds: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            disc_seconds: 25.0,
            whole_disc: true,
            beat_seconds: 0.5,
        }
    }
}

impl PlaybackConfig {
    /// Fixed beat length, independent of record length
    pub fn fixed(beat_seconds: f64) -> Self {
        Self {
            whole_disc: false,
            beat_seconds,
            ..Self::default()
        }
    }

    /// Time between two beats of a record with `beats_count` beats
    ///
    /// Negative and NaN lengths count as zero. Lengths too large for a
    /// `Duration` are a `Timing` error.
    pub fn beat_duration(&self, beats_count: usize) -> Result<Duration> {
        if self.whole_disc {
            seconds_to_duration(self.disc_seconds / beats_count.max(1) as f64)
        } else {
            seconds_to_duration(self.beat_seconds)
        }
    }

    /// Check both lengths, whichever mode is active
    pub fn validate(&self) -> Result<()> {
        seconds_to_duration(self.disc_seconds)?;
        seconds_to_duration(self.beat_seconds)?;
        Ok(())
    }
}

fn seconds_to_duration(seconds: f64) -> Result<Duration> {
    let clamped = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
    Duration::try_from_secs_f64(clamped)
        .map_err(|_| Error::Timing(format!("{} seconds is not a usable beat length", seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_disc_scales_with_length() {
        let config = PlaybackConfig::default();
        assert_eq!(config.beat_duration(100).unwrap(), Duration::from_millis(250));
        assert_eq!(config.beat_duration(50).unwrap(), Duration::from_millis(500));

        // a full disc always lasts disc_seconds
        let beats = 86;
        let total = config.beat_duration(beats).unwrap().as_secs_f64() * beats as f64;
        assert!((total - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_beat() {
        let config = PlaybackConfig::fixed(0.5);
        assert_eq!(config.beat_duration(10).unwrap(), Duration::from_millis(500));
        assert_eq!(config.beat_duration(1000).unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_beats_does_not_divide_by_zero() {
        let config = PlaybackConfig::default();
        assert_eq!(config.beat_duration(0).unwrap(), Duration::from_secs(25));
    }

    #[test]
    fn test_unusable_lengths_are_errors() {
        for seconds in [f64::INFINITY, 1e30] {
            let config = PlaybackConfig::fixed(seconds);
            assert!(matches!(config.beat_duration(86), Err(Error::Timing(_))));
            assert!(config.validate().is_err());
        }

        let config = PlaybackConfig {
            disc_seconds: f64::INFINITY,
            ..PlaybackConfig::default()
        };
        assert!(matches!(config.beat_duration(86), Err(Error::Timing(_))));
    }

    #[test]
    fn test_negative_and_nan_lengths_are_zero() {
        assert_eq!(PlaybackConfig::fixed(-1.0).beat_duration(4).unwrap(), Duration::ZERO);
        assert_eq!(PlaybackConfig::fixed(f64::NAN).beat_duration(4).unwrap(), Duration::ZERO);
        assert!(PlaybackConfig::default().validate().is_ok());
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tracker configuration.
//!
//! Settings live in one YAML file. Every section and field has a default,
//! so a missing or partial file still gives a working tracker; command line
//! flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::midi::ImportOptions;
use crate::sequencer::PlaybackConfig;
use crate::sound::SoundConfig;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fpr-tracker.yaml";

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Sound backend selection
    pub sound: SoundConfig,
    /// Playback timing
    pub playback: PlaybackConfig,
    /// Editor display
    pub display: DisplayConfig,
    /// Pitch mapping when the editor opens a MIDI file
    pub import: ImportOptions,
    /// Pitch mapping for the `import` command
    ///
    /// Defaults to the Kikkerland 15 preset. A `convert` section in the file
    /// replaces the preset as a whole; fields it leaves out take the plain
    /// import defaults.
    pub convert: ImportOptions,
    /// Log output
    pub log: LogConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sound: SoundConfig::default(),
            playback: PlaybackConfig::default(),
            display: DisplayConfig::default(),
            import: ImportOptions::default(),
            convert: ImportOptions::kikkerland15(),
            log: LogConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Load `path` if given, else the default file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Parse a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // an empty document is valid and means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would only fail later, during playback or import
    pub fn validate(&self) -> Result<()> {
        self.playback.validate().context("Invalid playback section")?;
        self.import.validate().context("Invalid import section")?;
        self.convert.validate().context("Invalid convert section")?;
        Ok(())
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save the configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }
}

/// Editor display settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Draw the lowest tone on the top row
    pub low_first: bool,
    /// Input poll interval in milliseconds
    pub frame_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            low_first: false,
            frame_ms: 10,
        }
    }
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file used while the editor owns the terminal
    pub file: PathBuf,
    /// Maximum level: error, warn, info, debug or trace
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("fpr-tracker.log"),
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Parsed level, `info` when the text is not a level name
    pub fn max_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

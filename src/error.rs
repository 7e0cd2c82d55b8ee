// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types shared by the sequence, codec, MIDI and sound layers.

use thiserror::Error;

/// Library result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the tracker library
#[derive(Debug, Error)]
pub enum Error {
    /// Cell access outside the grid
    #[error("beat {beat} / track {track} is outside the grid")]
    OutOfRange { beat: usize, track: usize },

    /// Corrupt or incompatible .fpr file
    #[error("invalid fpr file: {0}")]
    Format(#[from] FormatError),

    /// MIDI import met a pitch that no track can play
    #[error("pitch {pitch} at beat {beat} has no track on this record")]
    UnsupportedPitch { pitch: u8, beat: usize },

    /// MIDI file or port failure
    #[error("MIDI error: {0}")]
    Midi(String),

    /// Beat length that cannot be slept for
    #[error("invalid timing: {0}")]
    Timing(String),

    /// Setting outside what a record can hold
    #[error("invalid setting: {0}")]
    Setting(String),

    /// Sample backend failure
    #[error("audio error: {0}")]
    Audio(String),

    /// Underlying file or device I/O
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Structural problems found while decoding an .fpr file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("missing FPR1 signature")]
    BadMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("unsupported track count {0}")]
    UnsupportedTrackCount(u8),
    #[error("record has no beats")]
    NoBeats,
    #[error("file is truncated")]
    Truncated,
    #[error("unused track bits set at beat {0}")]
    NonZeroPadding(usize),
    #[error("{0} unexpected bytes after the last beat")]
    TrailingBytes(usize),
    #[error("title or comment is not valid UTF-8")]
    InvalidText,
    #[error("{0} is too long to store")]
    TooLong(&'static str),
    #[error("only the standard record note table can be stored")]
    ForeignNoteTable,
}

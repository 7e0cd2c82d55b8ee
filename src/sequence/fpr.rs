// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Binary `.fpr` record file codec.
//!
//! Layout (integers big-endian):
//!
//! ```text
//! "FPR1"            4 bytes  signature
//! version           u8       = 1
//! tracks            u8       = 16
//! beats             u16      >= 1
//! title             u16 length + UTF-8
//! comment           u16 length + UTF-8
//! cells             beats * ceil(tracks / 8) bytes, track t = byte t/8, bit t%8
//! ```
//!
//! Decoding is strict: short input, trailing bytes and stray padding bits
//! are all rejected.
//!
//! The pitches are not stored. Every file is read back with [`NOTES`], so
//! encoding a record built on another note table is an error.

use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, info};

use super::{Sequence, NOTES, TRACK_COUNT};
use crate::error::{Error, FormatError, Result};

/// File signature
pub const MAGIC: &[u8; 4] = b"FPR1";

/// Current format version
pub const VERSION: u8 = 1;

/// Bytes holding one beat column
fn column_bytes(tracks_count: usize) -> usize {
    (tracks_count + 7) / 8
}

/// Serialize a record
pub fn encode(seq: &Sequence) -> Result<Vec<u8>> {
    if seq.note_table() != NOTES.as_slice() {
        return Err(FormatError::ForeignNoteTable.into());
    }
    let beats = u16::try_from(seq.beats_count()).map_err(|_| FormatError::TooLong("record"))?;
    let tracks = u8::try_from(seq.tracks_count()).map_err(|_| FormatError::TooLong("track list"))?;

    let stride = column_bytes(seq.tracks_count());
    let mut out = Vec::with_capacity(16 + seq.title.len() + seq.comment.len() + stride * seq.beats_count());
    out.write_all(MAGIC)?;
    out.write_u8(VERSION)?;
    out.write_u8(tracks)?;
    out.write_u16::<BigEndian>(beats)?;
    write_text(&mut out, &seq.title, "title")?;
    write_text(&mut out, &seq.comment, "comment")?;

    for beat in 0..seq.beats_count() {
        let mut column = vec![0u8; stride];
        for (track, &on) in seq.get_beats(beat).iter().enumerate() {
            if on {
                column[track / 8] |= 1 << (track % 8);
            }
        }
        out.write_all(&column)?;
    }

    Ok(out)
}

/// Deserialize a record
pub fn decode(bytes: &[u8]) -> Result<Sequence> {
    let mut reader = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(FormatError::BadMagic.into());
    }

    let version = reader.read_u8().map_err(truncated)?;
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version).into());
    }

    let tracks = reader.read_u8().map_err(truncated)?;
    if tracks as usize != TRACK_COUNT {
        return Err(FormatError::UnsupportedTrackCount(tracks).into());
    }

    let beats = reader.read_u16::<BigEndian>().map_err(truncated)? as usize;
    if beats == 0 {
        return Err(FormatError::NoBeats.into());
    }

    let title = read_text(&mut reader)?;
    let comment = read_text(&mut reader)?;

    let mut seq = Sequence::new(beats);
    seq.title = title;
    seq.comment = comment;

    let tracks = tracks as usize;
    let stride = column_bytes(tracks);
    let mut column = vec![0u8; stride];
    for beat in 0..beats {
        reader.read_exact(&mut column).map_err(truncated)?;
        for track in 0..tracks {
            if column[track / 8] & (1 << (track % 8)) != 0 {
                seq.set_note(beat, track, true);
            }
        }
        // Bits above the last track must be clear
        let used_bits = tracks - (stride - 1) * 8;
        if used_bits < 8 && column[stride - 1] >> used_bits != 0 {
            return Err(FormatError::NonZeroPadding(beat).into());
        }
    }

    let remaining = bytes.len() - reader.position() as usize;
    if remaining > 0 {
        return Err(FormatError::TrailingBytes(remaining).into());
    }

    Ok(seq)
}

fn write_text(out: &mut Vec<u8>, text: &str, what: &'static str) -> Result<()> {
    let len = u16::try_from(text.len()).map_err(|_| FormatError::TooLong(what))?;
    out.write_u16::<BigEndian>(len)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

fn read_text(reader: &mut Cursor<&[u8]>) -> Result<String> {
    let len = reader.read_u16::<BigEndian>().map_err(truncated)? as usize;
    let mut raw = vec![0u8; len];
    reader.read_exact(&mut raw).map_err(truncated)?;
    String::from_utf8(raw).map_err(|_| FormatError::InvalidText.into())
}

fn truncated(_: io::Error) -> Error {
    FormatError::Truncated.into()
}

impl Sequence {
    /// Read a record from disk
    ///
    /// The returned record remembers `path` as its source.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let mut seq = decode(&bytes)?;
        seq.source_path = Some(path.to_path_buf());
        info!(path = %path.display(), beats = seq.beats_count(), "loaded record");
        Ok(seq)
    }

    /// Write the record to `path`
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = encode(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(&bytes)?;
        info!(path = %path.display(), beats = self.beats_count(), "saved record");
        Ok(())
    }

    /// Write the record to its source path
    pub fn save(&self) -> Result<()> {
        let path = self.source_path.as_ref().ok_or_else(|| {
            Error::Io(io::Error::new(io::ErrorKind::NotFound, "record has no file name"))
        })?;
        self.save_to(path)
    }

    /// Replace this record with the copy on disk
    ///
    /// On failure the in-memory record is left untouched.
    pub fn reload(&mut self) -> Result<()> {
        let path = self.source_path.clone().ok_or_else(|| {
            Error::Io(io::Error::new(io::ErrorKind::NotFound, "record has no file name"))
        })?;
        let loaded = Self::load(&path)?;
        debug!(path = %path.display(), "reloaded record");
        *self = loaded;
        Ok(())
    }
}

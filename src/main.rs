// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fpr_tracker::config::{LogConfig, TrackerConfig};
use fpr_tracker::midi::{import_file, list_ports, ImportOptions, MidiExporter};
use fpr_tracker::sequencer::{PlaybackConfig, Scheduler};
use fpr_tracker::sound::{open_sink, SoundBackend};
use fpr_tracker::ui::{App, Session};
use fpr_tracker::{Sequence, BEAT_COUNT};

/// Tracker for Fisher-Price music box records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// .fpr file to open (created on first save if missing)
    #[arg(long)]
    fpr: Option<PathBuf>,

    /// Start from a MIDI file instead
    #[arg(long)]
    mid: Option<PathBuf>,

    /// Title of a new tune
    #[arg(long)]
    title: Option<String>,

    /// Name (or part of it) of the MIDI output port
    #[arg(long)]
    port: Option<String>,

    /// General MIDI program for playback and export
    #[arg(long)]
    program: Option<u8>,

    /// Draw low pitch notes first
    #[arg(long)]
    low: bool,

    /// Sound backend: midi, samples or none
    #[arg(long)]
    audio: Option<SoundBackend>,

    /// Fixed seconds per beat instead of one full disc turn
    #[arg(long)]
    beat_seconds: Option<f64>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a MIDI file to .fpr
    Import {
        /// MIDI file to read
        #[arg(long)]
        mid: PathBuf,
        /// Output file (defaults to the MIDI name with .fpr)
        #[arg(long)]
        fpr: Option<PathBuf>,
        /// Do not advance past beats without a note
        #[arg(long)]
        noempty: bool,
        /// Take pitches as they are instead of the `convert` mapping
        /// (Kikkerland 15 unless the config file says otherwise)
        #[arg(long)]
        raw: bool,
    },
    /// Convert a .fpr file to MIDI
    Export {
        /// Record to read
        #[arg(long)]
        fpr: PathBuf,
        /// Output file (defaults to the record name with .mid)
        #[arg(long)]
        mid: Option<PathBuf>,
        /// General MIDI program
        #[arg(long)]
        program: Option<u8>,
        /// Only export the first N beats
        #[arg(long)]
        beats: Option<usize>,
    },
    /// List MIDI output ports
    Ports,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = TrackerConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Some(Command::Import {
            ref mid,
            ref fpr,
            noempty,
            raw,
        }) => {
            init_logging(&config.log, false)?;
            import(&config, mid, fpr.as_deref(), noempty, raw)
        }
        Some(Command::Export {
            ref fpr,
            ref mid,
            program,
            beats,
        }) => {
            init_logging(&config.log, false)?;
            export(&config, fpr, mid.as_deref(), program, beats)
        }
        Some(Command::Ports) => {
            let ports = list_ports();
            if ports.is_empty() {
                println!("No MIDI output ports found");
            }
            for (i, name) in ports.iter().enumerate() {
                println!("{}: {}", i, name);
            }
            Ok(())
        }
        None => {
            init_logging(&config.log, true)?;
            run_editor(&args, config)
        }
    }
}

/// Install the fmt subscriber: a log file while the editor owns the terminal,
/// stderr otherwise
fn init_logging(log: &LogConfig, to_file: bool) -> Result<()> {
    let level = log.max_level();
    if to_file {
        let file = File::create(&log.file)
            .with_context(|| format!("Failed to create log file: {:?}", log.file))?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(level)
            .init();
    }
    Ok(())
}

fn import(
    config: &TrackerConfig,
    mid: &Path,
    fpr: Option<&Path>,
    noempty: bool,
    raw: bool,
) -> Result<()> {
    let convert = &config.convert;
    let options = if raw {
        ImportOptions {
            max_beats: convert.max_beats,
            ..ImportOptions::default()
        }
    } else {
        convert.clone()
    };
    let options = options.with_skip_empty_beats(noempty || convert.skip_empty_beats);

    let seq = import_file(mid, &options)
        .with_context(|| format!("Failed to import {}", mid.display()))?;
    let out = match fpr {
        Some(path) => path.to_path_buf(),
        None => mid.with_extension("fpr"),
    };
    seq.save_to(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "{} -> {} ({} beats, {} notes)",
        mid.display(),
        out.display(),
        seq.beats_count(),
        seq.note_count()
    );
    Ok(())
}

fn export(
    config: &TrackerConfig,
    fpr: &Path,
    mid: Option<&Path>,
    program: Option<u8>,
    beats: Option<usize>,
) -> Result<()> {
    let mut seq = Sequence::load(fpr).with_context(|| format!("Failed to load {}", fpr.display()))?;
    if let Some(beats) = beats.filter(|&b| b >= 1 && b < seq.beats_count()) {
        info!(beats, "truncating before export");
        seq.resize(beats);
    }

    let mut exporter = MidiExporter::new();
    exporter.set_program(program.unwrap_or(config.sound.program));

    let out = match mid {
        Some(path) => path.to_path_buf(),
        None => fpr.with_extension("mid"),
    };
    exporter
        .export(&seq, &out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("{} -> {} ({} beats)", fpr.display(), out.display(), seq.beats_count());
    Ok(())
}

fn run_editor(args: &Args, mut config: TrackerConfig) -> Result<()> {
    // command line flags win over the config file
    if let Some(port) = &args.port {
        config.sound.port = Some(port.clone());
    }
    if let Some(program) = args.program {
        config.sound.program = program;
    }
    if let Some(backend) = args.audio {
        config.sound.backend = backend;
    }
    if let Some(seconds) = args.beat_seconds {
        let playback = PlaybackConfig::fixed(seconds);
        playback.validate().context("Invalid --beat-seconds")?;
        config.playback = playback;
    }
    if args.low {
        config.display.low_first = true;
    }

    let mut seq = if let Some(path) = &args.fpr {
        if path.exists() {
            Sequence::load(path).with_context(|| format!("Failed to load {}", path.display()))?
        } else {
            Sequence::default().with_source_path(path)
        }
    } else if let Some(mid) = &args.mid {
        import_file(mid, &config.import)
            .with_context(|| format!("Failed to import {}", mid.display()))?
    } else {
        let title = args.title.clone().unwrap_or_else(|| "untitled".to_string());
        Sequence::new(BEAT_COUNT).with_source_path(format!("{}.fpr", title))
    };
    if let Some(title) = &args.title {
        seq.title = title.clone();
    }
    if seq.beats_count() < BEAT_COUNT {
        seq.resize(BEAT_COUNT);
    }

    let sink = open_sink(&config.sound, seq.note_table());
    let scheduler = Scheduler::new(sink, config.playback);
    let mut exporter = MidiExporter::new();
    exporter.set_program(config.sound.program);

    let mut session = Session::new(seq, scheduler, exporter);
    session.editor.tone_descending = !config.display.low_first;

    info!(backend = ?config.sound.backend, "editor started");
    let mut app = App::new(session, Duration::from_millis(config.display.frame_ms.max(1)))
        .context("Failed to set up the terminal")?;
    app.run()
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for the tracker
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - .fpr encoding and decoding
//! - MIDI quantization on import
//! - MIDI file export
//! - Grid shifts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fpr_tracker::midi::{export_events, quantize, ImportOptions, MidiExporter};
use fpr_tracker::sequence::fpr::{decode, encode};
use fpr_tracker::{Sequence, TRACK_COUNT};

/// A busy record: a note on most beats, chords every fourth beat
fn busy_record(beats: usize) -> Sequence {
    let mut seq = Sequence::new(beats).with_title("benchmark");
    for beat in 0..beats {
        if beat % 7 != 6 {
            seq.set_note(beat, (beat * 5) % TRACK_COUNT, true);
        }
        if beat % 4 == 0 {
            seq.set_note(beat, 0, true);
            seq.set_note(beat, 7, true);
        }
    }
    seq
}

/// Benchmark the .fpr codec
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("fpr");

    for beats in [86, 1000, 10000].iter() {
        let seq = busy_record(*beats);
        let bytes = encode(&seq).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", beats), &seq, |b, seq| {
            b.iter(|| black_box(encode(black_box(seq)).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("decode", beats), &bytes, |b, bytes| {
            b.iter(|| black_box(decode(black_box(bytes)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark quantizing a message stream into a grid
fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize");

    for beats in [86, 1000].iter() {
        let events = export_events(&busy_record(*beats), 480);
        let options = ImportOptions {
            max_beats: *beats,
            ..ImportOptions::default()
        };
        let compact = options.clone().with_skip_empty_beats(true);

        group.bench_with_input(BenchmarkId::new("plain", beats), &events, |b, events| {
            b.iter(|| black_box(quantize(events.iter().cloned(), &options).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("skip_empty", beats), &events, |b, events| {
            b.iter(|| black_box(quantize(events.iter().cloned(), &compact).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark writing a standard MIDI file
fn bench_export(c: &mut Criterion) {
    let exporter = MidiExporter::new();
    let seq = busy_record(86);

    c.bench_function("midi_export_full_disc", |b| {
        b.iter(|| black_box(exporter.export_to_bytes(black_box(&seq))))
    });
}

/// Benchmark inserting and removing beats at the start of a long record
fn bench_shift(c: &mut Criterion) {
    c.bench_function("shift_right_left_10000", |b| {
        b.iter_batched(
            || busy_record(10000),
            |mut seq| {
                seq.shift_right(0);
                seq.shift_left(0);
                black_box(seq.beats_count())
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_codec, bench_quantize, bench_export, bench_shift);

criterion_main!(benches);

//! Benchmarks for parsing, classification, and report rendering.
//!
//! Run with: cargo bench
//!
//! None of these spawn FFmpeg; batches are built in memory.

use std::hint::black_box;
use std::path::PathBuf;

use criterion::Criterion;
use audiolevel::{
    BatchResult, MediaFile, Measurement, Record, RecordOutcome, classify, parse_measurement,
    render_csv, render_html, render_json, summarize,
};

const VOLUMEDETECT_REPORT: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'talk.mp4':
  Duration: 00:42:17.31, start: 0.000000, bitrate: 1204 kb/s
  Stream #0:0(und): Video: h264 (High), yuv420p, 1920x1080, 1071 kb/s, 30 fps
  Stream #0:1(und): Audio: aac (LC), 48000 Hz, stereo, fltp, 128 kb/s
[Parsed_volumedetect_0 @ 0x55d0c8f0] n_samples: 243581440
[Parsed_volumedetect_0 @ 0x55d0c8f0] mean_volume: -33.7 dB
[Parsed_volumedetect_0 @ 0x55d0c8f0] max_volume: -6.2 dB
[Parsed_volumedetect_0 @ 0x55d0c8f0] histogram_6db: 14
[Parsed_volumedetect_0 @ 0x55d0c8f0] histogram_7db: 231
";

fn synthetic_batch(files: usize) -> BatchResult {
    let records = (0..files)
        .map(|index| {
            let file = MediaFile::new(format!("recordings/session_{index:04}.mp4"));
            let outcome = if index % 17 == 0 {
                RecordOutcome::Failed {
                    error: "tool exited with exit status: 1: moov atom not found".to_string(),
                }
            } else {
                let mean_db = -60.0 + (index % 55) as f64;
                RecordOutcome::Measured {
                    measurement: Measurement {
                        mean_db,
                        peak_db: mean_db + 20.0,
                    },
                    tier: classify(mean_db),
                }
            };
            Record {
                file,
                outcome,
                correction: None,
            }
        })
        .collect();

    BatchResult {
        input: PathBuf::from("recordings"),
        records,
        correction: None,
    }
}

fn benchmark_parse_measurement(criterion: &mut Criterion) {
    criterion.bench_function("parse volumedetect report", |bencher| {
        bencher.iter(|| parse_measurement(black_box(VOLUMEDETECT_REPORT)).unwrap());
    });
}

fn benchmark_classify(criterion: &mut Criterion) {
    let levels: Vec<f64> = (0..1_000).map(|index| -70.0 + index as f64 * 0.07).collect();

    criterion.bench_function("classify 1000 levels", |bencher| {
        bencher.iter(|| {
            for level in &levels {
                black_box(classify(black_box(*level)));
            }
        });
    });
}

fn benchmark_reports(criterion: &mut Criterion) {
    let result = synthetic_batch(500);
    let summary = summarize(&result);

    let mut group = criterion.benchmark_group("reports (500 files)");
    group.bench_function("summarize", |bencher| {
        bencher.iter(|| summarize(black_box(&result)));
    });
    group.bench_function("html", |bencher| {
        bencher.iter(|| render_html(black_box(&result), &summary));
    });
    group.bench_function("csv", |bencher| {
        bencher.iter(|| render_csv(black_box(&result)).unwrap());
    });
    group.bench_function("json", |bencher| {
        bencher.iter(|| render_json(black_box(&result), &summary).unwrap());
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_parse_measurement,
    benchmark_classify,
    benchmark_reports,
);
criterion::criterion_main!(benches);

//! # audiolevel
//!
//! Batch-measure the loudness of media files, sort them into loudness tiers,
//! and optionally write volume-corrected copies.
//!
//! `audiolevel` drives an external `ffmpeg` binary: its `volumedetect`
//! filter measures the mean and peak level of each file, and its `volume`
//! filter applies the gain of a correction. Results are gathered into a
//! [`BatchResult`] that can be summarized and exported as CSV, JSON, or a
//! self-contained HTML page.
//!
//! ## Quick Start
//!
//! ### Measure a Directory
//!
//! ```no_run
//! use audiolevel::{AnalysisOptions, BatchAnalyzer, FfmpegTool, summarize};
//!
//! let analyzer = BatchAnalyzer::new(FfmpegTool::locate()?, AnalysisOptions::new());
//! let result = analyzer.run("recordings/".as_ref())?;
//! for record in &result.records {
//!     match (record.measurement(), record.tier()) {
//!         (Some(measurement), Some(tier)) => {
//!             println!("{}: {:.1} dB [{tier}]", record.file.display_name(), measurement.mean_db)
//!         }
//!         _ => println!("{}: {}", record.file.display_name(), record.error().unwrap_or("?")),
//!     }
//! }
//! print!("{}", summarize(&result));
//! # Ok::<(), audiolevel::AudioLevelError>(())
//! ```
//!
//! ### Normalize and Export
//!
//! ```no_run
//! use audiolevel::{
//!     AnalysisOptions, BatchAnalyzer, CorrectionMode, FfmpegTool, ReportSelection,
//!     summarize, write_reports,
//! };
//!
//! let options = AnalysisOptions::new()
//!     .with_parallelism(8)
//!     .with_correction(CorrectionMode::Normalize { target_db: -24.0 });
//! let analyzer = BatchAnalyzer::new(FfmpegTool::locate()?, options);
//! let result = analyzer.run("recordings/".as_ref())?;
//!
//! let summary = summarize(&result);
//! let selection = ReportSelection { html: true, csv: true, json: true };
//! write_reports(&result, &summary, "recordings/".as_ref(), selection)?;
//! # Ok::<(), audiolevel::AudioLevelError>(())
//! ```
//!
//! ## Features
//!
//! - **Measurement**: mean and peak dBFS per file, parsed from FFmpeg's
//!   `volumedetect` report
//! - **Classification**: six ordered tiers from "very low" to "high"
//! - **Correction**: normalize to a target mean level or apply a fixed
//!   boost, written next to the source in `normalized_*dB/` or
//!   `boosted_*dB/`, with a clipping advisory when the peak would exceed 0 dB
//! - **Batching**: bounded worker pool, per-file failure isolation,
//!   deterministic output order, progress callbacks
//! - **Reports**: CSV, JSON (readable back with [`parse_json`]), and HTML
//!
//! ## Requirements
//!
//! An `ffmpeg` binary must be available, either on `PATH` or at a path given
//! to [`FfmpegTool::new`].

pub mod batch;
pub mod classification;
pub mod configuration;
pub mod correction;
pub mod discovery;
pub mod error;
pub mod export;
pub mod html;
pub mod measurement;
pub mod progress;
pub mod report;
pub mod tool;

pub use batch::{BatchAnalyzer, BatchResult, CorrectionStatus, Record, RecordOutcome};
pub use classification::{Tier, classify};
pub use configuration::{AnalysisOptions, DEFAULT_PARALLELISM, MAX_PARALLELISM};
pub use correction::{
    ClippingWarning, CorrectionJob, CorrectionMode, CorrectionOutcome, correct,
    is_output_directory_name,
};
pub use discovery::{AUDIO_EXTENSIONS, MediaFile, VIDEO_EXTENSIONS, discover};
pub use error::AudioLevelError;
pub use export::{
    CSV_REPORT_NAME, HTML_REPORT_NAME, JSON_REPORT_NAME, JsonReport, RecordRow, ReportSelection,
    RowStatus, parse_json, render_csv, render_json, write_reports,
};
pub use html::render_html;
pub use measurement::{
    MAX_VOLUME, MEAN_VOLUME, Marker, Measurement, ParseFailure, extract, parse_measurement,
};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use report::{Summary, TierCount, summarize};
pub use tool::{FfmpegLogLevel, FfmpegTool, MediaTool, ToolOutput};

//! Error types for the `audiolevel` crate.
//!
//! This module defines [`AudioLevelError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry the file path they
//! concern and the diagnostic text produced by the external tool, so a batch
//! can record them per file without additional logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `audiolevel` operations.
///
/// Only [`Discovery`](AudioLevelError::Discovery),
/// [`ToolNotFound`](AudioLevelError::ToolNotFound) and
/// [`InvalidOptions`](AudioLevelError::InvalidOptions) abort a batch. The
/// per-file variants are captured into the corresponding
/// [`Record`](crate::Record) instead of being returned from
/// [`BatchAnalyzer::run`](crate::BatchAnalyzer::run).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AudioLevelError {
    /// The input path could not be enumerated.
    #[error("Failed to read input at {path}: {reason}")]
    Discovery {
        /// Path that was passed to the batch.
        path: PathBuf,
        /// Underlying reason the discovery failed.
        reason: String,
    },

    /// The external media tool could not be located.
    #[error("External tool `{tool}` was not found on PATH")]
    ToolNotFound {
        /// Name or path of the binary that was looked up.
        tool: String,
    },

    /// Loudness could not be measured for a file.
    #[error("Failed to measure {path}: {reason}")]
    Extraction {
        /// File being measured.
        path: PathBuf,
        /// Tool diagnostic (stderr tail) or parse failure.
        reason: String,
    },

    /// Normalization was requested for a file without a measurement.
    #[error("No measurement available for {path}; normalization needs one")]
    MissingMeasurement {
        /// File that was to be normalized.
        path: PathBuf,
    },

    /// The gain-adjusted copy could not be written.
    #[error("Failed to correct {path}: {reason}")]
    Correction {
        /// Source file of the correction.
        path: PathBuf,
        /// Tool diagnostic or I/O reason.
        reason: String,
    },

    /// The supplied options are contradictory or out of range.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The worker pool could not be started.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// JSON export or re-parse failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV export failed.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl AudioLevelError {
    /// Returns `true` for errors that concern a single file and are recorded
    /// rather than aborting a batch.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            AudioLevelError::Extraction { .. }
                | AudioLevelError::MissingMeasurement { .. }
                | AudioLevelError::Correction { .. }
        )
    }
}

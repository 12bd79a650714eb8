//! Batch configuration.
//!
//! [`AnalysisOptions`] is a builder that threads the worker count, discovery
//! settings, the optional correction mode, and a progress callback through
//! [`BatchAnalyzer`](crate::BatchAnalyzer) without polluting every function
//! signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use audiolevel::{AnalysisOptions, CorrectionMode, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {}/{}", info.operation, info.current, info.total);
//!     }
//! }
//!
//! let options = AnalysisOptions::new()
//!     .with_parallelism(8)
//!     .with_recursive(true)
//!     .with_correction(CorrectionMode::Normalize { target_db: -24.0 })
//!     .with_progress(Arc::new(LogProgress));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::correction::CorrectionMode;
use crate::discovery::{AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::error::AudioLevelError;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Workers used when none are configured.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Upper bound on the worker count. Each worker runs one external process.
pub const MAX_PARALLELISM: usize = 64;

/// Configuration for a batch run.
///
/// All fields have sensible defaults: four workers, non-recursive discovery
/// of the built-in extensions, previous correction output skipped, no
/// correction, no progress callback.
#[derive(Clone)]
pub struct AnalysisOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Size of the worker pool.
    pub(crate) parallelism: usize,
    /// Descend into subdirectories.
    pub(crate) recursive: bool,
    /// Skip `normalized_*dB` / `boosted_*dB` directories.
    pub(crate) exclude_output_directories: bool,
    /// Correction applied to every measured file.
    pub(crate) correction: Option<CorrectionMode>,
    /// Lower-case extensions, without the dot.
    pub(crate) extensions: Vec<String>,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("has_progress", &true)
            .field("parallelism", &self.parallelism)
            .field("recursive", &self.recursive)
            .field("exclude_output_directories", &self.exclude_output_directories)
            .field("correction", &self.correction)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            parallelism: DEFAULT_PARALLELISM,
            recursive: false,
            exclude_output_directories: true,
            correction: None,
            extensions: VIDEO_EXTENSIONS
                .iter()
                .chain(AUDIO_EXTENSIONS.iter())
                .map(|extension| extension.to_string())
                .collect(),
        }
    }

    /// Attach a progress callback, invoked once per completed file.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set the number of parallel workers.
    ///
    /// Clamped to `1..=MAX_PARALLELISM`.
    #[must_use]
    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers.clamp(1, MAX_PARALLELISM);
        self
    }

    /// Descend into subdirectories during discovery. Defaults to `false`.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Control whether earlier correction output directories are skipped
    /// during discovery. Defaults to `true`.
    #[must_use]
    pub fn with_exclude_output_directories(mut self, exclude: bool) -> Self {
        self.exclude_output_directories = exclude;
        self
    }

    /// Correct every successfully measured file.
    #[must_use]
    pub fn with_correction(mut self, mode: CorrectionMode) -> Self {
        self.correction = Some(mode);
        self
    }

    /// Replace the set of extensions picked up from directories.
    ///
    /// Leading dots are stripped and case is ignored.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|extension| extension.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Size of the worker pool.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Whether discovery descends into subdirectories.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// The configured correction, if any.
    pub fn correction(&self) -> Option<CorrectionMode> {
        self.correction
    }

    /// Extensions picked up from directories.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), AudioLevelError> {
        if self.extensions.iter().all(|extension| extension.is_empty()) {
            return Err(AudioLevelError::InvalidOptions(
                "at least one file extension is required".to_string(),
            ));
        }

        match self.correction {
            Some(CorrectionMode::Normalize { target_db }) if !target_db.is_finite() => {
                Err(AudioLevelError::InvalidOptions(format!(
                    "normalize target {target_db} is not finite"
                )))
            }
            Some(CorrectionMode::Boost { gain_db }) if !gain_db.is_finite() => Err(
                AudioLevelError::InvalidOptions(format!("boost gain {gain_db} is not finite")),
            ),
            _ => Ok(()),
        }
    }
}

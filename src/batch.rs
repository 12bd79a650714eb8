//! Batch coordination.
//!
//! [`BatchAnalyzer`] discovers the input files, measures each one on a
//! fixed-size worker pool, classifies the result, and optionally corrects the
//! file right after its measurement. Every file is independent: a failure is
//! recorded in that file's [`Record`] and the rest of the batch carries on.
//!
//! Workers tag each result with the file's discovery index, so
//! [`BatchResult::records`] is in discovery order whatever order the
//! external commands finish in.
//!
//! # Example
//!
//! ```no_run
//! use audiolevel::{AnalysisOptions, BatchAnalyzer, FfmpegTool};
//!
//! let analyzer = BatchAnalyzer::new(FfmpegTool::locate()?, AnalysisOptions::new());
//! let result = analyzer.run("recordings/".as_ref())?;
//! println!("{} ok, {} failed", result.succeeded(), result.failed());
//! # Ok::<(), audiolevel::AudioLevelError>(())
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::ThreadPoolBuilder;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

use crate::classification::{Tier, classify};
use crate::configuration::AnalysisOptions;
use crate::correction::{
    ClippingWarning, CorrectionJob, CorrectionMode, CorrectionOutcome, correct,
};
use crate::discovery::{MediaFile, discover};
use crate::error::AudioLevelError;
use crate::measurement::{Measurement, extract};
use crate::progress::{OperationType, ProgressTracker};
use crate::tool::MediaTool;

/// Result of measuring one file: either a measurement with its tier, or the
/// reason it failed. Never both.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The tool reported both levels.
    Measured {
        /// Mean and peak level.
        measurement: Measurement,
        /// Tier derived from the mean level.
        tier: Tier,
    },
    /// The file could not be measured.
    Failed {
        /// Why.
        error: String,
    },
}

/// Result of correcting one file.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionStatus {
    /// The corrected copy was written.
    Written(CorrectionOutcome),
    /// The correction failed; the source is untouched.
    Failed {
        /// Why.
        error: String,
    },
}

/// Everything the batch learned about one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The input file.
    pub file: MediaFile,
    /// Measurement or failure.
    pub outcome: RecordOutcome,
    /// Set when a correction was requested and the measurement succeeded.
    pub correction: Option<CorrectionStatus>,
}

impl Record {
    /// The measurement, if the file was measured.
    pub fn measurement(&self) -> Option<&Measurement> {
        match &self.outcome {
            RecordOutcome::Measured { measurement, .. } => Some(measurement),
            RecordOutcome::Failed { .. } => None,
        }
    }

    /// The tier, if the file was measured.
    pub fn tier(&self) -> Option<Tier> {
        match &self.outcome {
            RecordOutcome::Measured { tier, .. } => Some(*tier),
            RecordOutcome::Failed { .. } => None,
        }
    }

    /// The failure reason, if the file was not measured.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RecordOutcome::Measured { .. } => None,
            RecordOutcome::Failed { error } => Some(error),
        }
    }

    /// Returns `true` when the file was measured.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Measured { .. })
    }

    /// Clipping advisory of a written correction.
    pub fn clipping_warning(&self) -> Option<&ClippingWarning> {
        match &self.correction {
            Some(CorrectionStatus::Written(outcome)) => outcome.clipping.as_ref(),
            _ => None,
        }
    }
}

/// The records of a batch, in discovery order, plus aggregate counts.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Path the batch was run on.
    pub input: PathBuf,
    /// One record per discovered file.
    pub records: Vec<Record>,
    /// Correction that was requested, if any.
    pub correction: Option<CorrectionMode>,
}

impl BatchResult {
    /// Number of records.
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Records with a measurement.
    pub fn successes(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|record| record.is_success())
    }

    /// Records without a measurement.
    pub fn failures(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|record| !record.is_success())
    }

    /// Number of measured files.
    pub fn succeeded(&self) -> usize {
        self.successes().count()
    }

    /// Number of files that could not be measured.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Returns `true` when no file was discovered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean levels of the measured files, in record order.
    pub fn mean_levels(&self) -> Vec<f64> {
        self.successes()
            .filter_map(Record::measurement)
            .map(|measurement| measurement.mean_db)
            .collect()
    }

    /// Average mean level over measured files.
    pub fn average_mean_db(&self) -> Option<f64> {
        let levels = self.mean_levels();
        (!levels.is_empty()).then(|| levels.iter().sum::<f64>() / levels.len() as f64)
    }

    /// Lowest mean level over measured files.
    pub fn min_mean_db(&self) -> Option<f64> {
        self.mean_levels().into_iter().reduce(f64::min)
    }

    /// Highest mean level over measured files.
    pub fn max_mean_db(&self) -> Option<f64> {
        self.mean_levels().into_iter().reduce(f64::max)
    }

    /// Corrections that were written.
    pub fn corrections_written(&self) -> impl Iterator<Item = &CorrectionOutcome> {
        self.records.iter().filter_map(|record| match &record.correction {
            Some(CorrectionStatus::Written(outcome)) => Some(outcome),
            _ => None,
        })
    }

    /// Corrections that failed, with their file.
    pub fn correction_failures(&self) -> impl Iterator<Item = (&MediaFile, &str)> {
        self.records.iter().filter_map(|record| match &record.correction {
            Some(CorrectionStatus::Failed { error }) => Some((&record.file, error.as_str())),
            _ => None,
        })
    }

    /// Clipping advisories of written corrections.
    pub fn warnings(&self) -> Vec<&ClippingWarning> {
        self.records
            .iter()
            .filter_map(Record::clipping_warning)
            .collect()
    }

    /// Every per-file problem as `(file, message)`: measurement failures,
    /// correction failures, then clipping advisories.
    pub fn errors(&self) -> Vec<(&MediaFile, String)> {
        let measurement_errors = self
            .records
            .iter()
            .filter_map(|record| record.error().map(|error| (&record.file, error.to_string())));
        let correction_errors = self
            .correction_failures()
            .map(|(file, error)| (file, format!("correction failed: {error}")));
        let clipping = self.records.iter().filter_map(|record| {
            record.clipping_warning().map(|warning| {
                let message =
                    format!("clipping: projected peak {:+.1} dB", warning.projected_peak_db());
                (&record.file, message)
            })
        });

        measurement_errors.chain(correction_errors).chain(clipping).collect()
    }
}

/// Runs batches against one [`MediaTool`].
pub struct BatchAnalyzer {
    tool: Arc<dyn MediaTool>,
    options: AnalysisOptions,
}

impl BatchAnalyzer {
    /// Create an analyzer.
    pub fn new(tool: impl MediaTool + 'static, options: AnalysisOptions) -> Self {
        Self::with_shared_tool(Arc::new(tool), options)
    }

    /// Create an analyzer around an already shared tool.
    pub fn with_shared_tool(tool: Arc<dyn MediaTool>, options: AnalysisOptions) -> Self {
        Self { tool, options }
    }

    /// The options this analyzer runs with.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Discover `input` and process every file found.
    ///
    /// Fails only when the options are invalid, the input cannot be
    /// enumerated, or the worker pool cannot start. An empty directory gives
    /// an empty [`BatchResult`].
    pub fn run(&self, input: &Path) -> Result<BatchResult, AudioLevelError> {
        self.options.validate()?;
        let files = discover(input, &self.options)?;
        self.run_files(input, files)
    }

    /// Process an explicit file list. `records` keep the order of `files`.
    pub fn run_files(
        &self,
        input: &Path,
        files: Vec<MediaFile>,
    ) -> Result<BatchResult, AudioLevelError> {
        self.options.validate()?;

        let total = files.len();
        // Corrections must never write over a file that is itself part of the batch.
        let inputs: HashSet<PathBuf> = files.iter().map(|file| file.path.clone()).collect();
        let measurements = ProgressTracker::new(
            Arc::clone(&self.options.progress),
            OperationType::Measurement,
            total as u64,
        );
        let corrections = ProgressTracker::new(
            Arc::clone(&self.options.progress),
            OperationType::Correction,
            0,
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.options.parallelism)
            .thread_name(|index| format!("audiolevel-worker-{index}"))
            .build()
            .map_err(|error| AudioLevelError::WorkerPool(error.to_string()))?;

        log::info!(
            "Processing {total} file(s) with {} worker(s)",
            self.options.parallelism
        );

        let tagged: Vec<(usize, Record)> = pool.install(|| {
            files
                .into_par_iter()
                .with_max_len(1)
                .enumerate()
                .map(|(index, file)| {
                    (index, self.process(file, &inputs, &measurements, &corrections))
                })
                .collect()
        });

        let mut slots: Vec<Option<Record>> = (0..total).map(|_| None).collect();
        for (index, record) in tagged {
            slots[index] = Some(record);
        }
        let records: Vec<Record> = slots.into_iter().flatten().collect();

        let result = BatchResult {
            input: input.to_path_buf(),
            records,
            correction: self.options.correction,
        };

        log::info!(
            "Measured {}/{} file(s), {} failed, {} correction(s) written",
            result.succeeded(),
            measurements.completed(),
            result.failed(),
            corrections.completed()
        );

        Ok(result)
    }

    fn process(
        &self,
        file: MediaFile,
        inputs: &HashSet<PathBuf>,
        measurements: &ProgressTracker,
        corrections: &ProgressTracker,
    ) -> Record {
        let measured = extract(self.tool.as_ref(), &file.path);
        measurements.advance(Some(&file.path));

        let measurement = match measured {
            Ok(measurement) => measurement,
            Err(error) => {
                log::warn!("{error}");
                return Record {
                    file,
                    outcome: RecordOutcome::Failed {
                        error: failure_reason(error),
                    },
                    correction: None,
                };
            }
        };

        let correction = self.options.correction.map(|mode| {
            corrections.expect_more(1);
            let status = self.correct_file(&file, mode, measurement, inputs);
            corrections.advance(Some(&file.path));
            status
        });

        Record {
            outcome: RecordOutcome::Measured {
                measurement,
                tier: classify(measurement.mean_db),
            },
            file,
            correction,
        }
    }

    fn correct_file(
        &self,
        file: &MediaFile,
        mode: CorrectionMode,
        measurement: Measurement,
        inputs: &HashSet<PathBuf>,
    ) -> CorrectionStatus {
        let outcome = CorrectionJob::new(file.clone(), mode, Some(measurement)).and_then(|job| {
            let output = job.output_path()?;
            if inputs.contains(&output) {
                return Err(AudioLevelError::Correction {
                    path: file.path.clone(),
                    reason: format!("output would overwrite input file {}", output.display()),
                });
            }
            correct(self.tool.as_ref(), &job)
        });

        match outcome {
            Ok(outcome) => CorrectionStatus::Written(outcome),
            Err(error) => {
                log::warn!("{error}");
                CorrectionStatus::Failed {
                    error: failure_reason(error),
                }
            }
        }
    }
}

/// The part of a per-file error worth showing next to the file name.
fn failure_reason(error: AudioLevelError) -> String {
    match error {
        AudioLevelError::Extraction { reason, .. } | AudioLevelError::Correction { reason, .. } => {
            reason
        }
        other => other.to_string(),
    }
}

//! Volume correction.
//!
//! A [`CorrectionMode`] says how much gain a file should receive:
//! [`Normalize`](CorrectionMode::Normalize) moves its mean level to a target,
//! [`Boost`](CorrectionMode::Boost) adds a fixed amount. [`correct`] re-encodes
//! the file through a [`MediaTool`] into a subdirectory next to it, named after
//! the mode, keeping the original file name. The source file is never touched.
//!
//! # Example
//!
//! ```no_run
//! use audiolevel::{CorrectionJob, CorrectionMode, FfmpegTool, MediaFile, Measurement, correct};
//!
//! let tool = FfmpegTool::locate()?;
//! let file = MediaFile::new("talks/intro.mp4");
//! let measurement = Measurement { mean_db: -40.0, peak_db: -12.0 };
//! let job = CorrectionJob::new(file, CorrectionMode::Normalize { target_db: -24.0 }, Some(measurement))?;
//! assert_eq!(job.computed_gain, 16.0);
//!
//! let outcome = correct(&tool, &job)?;
//! println!("wrote {}", outcome.output.display());
//! # Ok::<(), audiolevel::AudioLevelError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::MediaFile;
use crate::error::AudioLevelError;
use crate::measurement::Measurement;
use crate::tool::MediaTool;

/// Number of stderr lines kept in a correction error.
const DIAGNOSTIC_TAIL_LINES: usize = 3;

/// Prefix of normalization output directories.
pub const NORMALIZED_PREFIX: &str = "normalized_";
/// Prefix of boost output directories.
pub const BOOSTED_PREFIX: &str = "boosted_";

/// How the gain of a corrected copy is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionMode {
    /// Gain = `target_db - mean_db`. Needs a measurement.
    Normalize {
        /// Desired mean level in dBFS.
        target_db: f64,
    },
    /// Gain = `gain_db`, whatever the measured level.
    Boost {
        /// Fixed gain in dB.
        gain_db: f64,
    },
}

impl CorrectionMode {
    /// Build a mode from the two mutually exclusive command-line values.
    ///
    /// Returns `Ok(None)` when neither is set and
    /// [`AudioLevelError::InvalidOptions`] when both are.
    pub fn from_flags(
        normalize_target: Option<f64>,
        boost_gain: Option<f64>,
    ) -> Result<Option<Self>, AudioLevelError> {
        match (normalize_target, boost_gain) {
            (Some(_), Some(_)) => Err(AudioLevelError::InvalidOptions(
                "normalize and boost cannot be combined".to_string(),
            )),
            (Some(target_db), None) => Ok(Some(CorrectionMode::Normalize { target_db })),
            (None, Some(gain_db)) => Ok(Some(CorrectionMode::Boost { gain_db })),
            (None, None) => Ok(None),
        }
    }

    /// Gain to apply to a file with the given measurement.
    pub fn gain_for(
        &self,
        path: &Path,
        measurement: Option<&Measurement>,
    ) -> Result<f64, AudioLevelError> {
        match *self {
            CorrectionMode::Normalize { target_db } => measurement
                .map(|measurement| target_db - measurement.mean_db)
                .ok_or_else(|| AudioLevelError::MissingMeasurement {
                    path: path.to_path_buf(),
                }),
            CorrectionMode::Boost { gain_db } => Ok(gain_db),
        }
    }

    /// Name of the output subdirectory, e.g. `normalized_24dB` or
    /// `boosted_+10dB`.
    ///
    /// Normalize names drop the sign, so targets of +24 and -24 dB share
    /// `normalized_24dB`. Levels are printed to one decimal, so two values
    /// that round alike (23.44 and 23.4) also share a directory.
    pub fn directory_name(&self) -> String {
        match *self {
            CorrectionMode::Normalize { target_db } => {
                format!("{NORMALIZED_PREFIX}{}dB", format_decibels(target_db.abs(), false))
            }
            CorrectionMode::Boost { gain_db } => {
                format!("{BOOSTED_PREFIX}{}dB", format_decibels(gain_db, true))
            }
        }
    }

    /// Output subdirectory for files living in `parent`.
    pub fn output_directory(&self, parent: &Path) -> PathBuf {
        parent.join(self.directory_name())
    }
}

impl Display for CorrectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CorrectionMode::Normalize { target_db } => {
                write!(f, "normalize to {} dB", format_decibels(*target_db, false))
            }
            CorrectionMode::Boost { gain_db } => {
                write!(f, "boost by {} dB", format_decibels(*gain_db, true))
            }
        }
    }
}

/// Whole numbers print without decimals, anything else with one.
fn format_decibels(value: f64, signed: bool) -> String {
    let whole = value.fract() == 0.0;
    match (whole, signed) {
        (true, true) => format!("{:+}", value as i64),
        (true, false) => format!("{}", value as i64),
        (false, true) => format!("{value:+.1}"),
        (false, false) => format!("{value:.1}"),
    }
}

/// Returns `true` for directory names produced by
/// [`CorrectionMode::directory_name`].
pub fn is_output_directory_name(name: &str) -> bool {
    let stripped = name
        .strip_prefix(NORMALIZED_PREFIX)
        .or_else(|| name.strip_prefix(BOOSTED_PREFIX));
    match stripped.and_then(|rest| rest.strip_suffix("dB")) {
        Some(value) => !value.is_empty() && value.parse::<f64>().is_ok(),
        None => false,
    }
}

/// One pending correction: a file, its mode, and the gain already computed
/// from its measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionJob {
    /// File to correct.
    pub file: MediaFile,
    /// Requested mode.
    pub mode: CorrectionMode,
    /// Gain in dB that will be applied.
    pub computed_gain: f64,
    /// Measurement the gain was derived from, used for the clipping check.
    pub measurement: Option<Measurement>,
}

impl CorrectionJob {
    /// Compute the gain for `file` under `mode`.
    ///
    /// Fails with [`AudioLevelError::MissingMeasurement`] when normalizing
    /// without a measurement.
    pub fn new(
        file: MediaFile,
        mode: CorrectionMode,
        measurement: Option<Measurement>,
    ) -> Result<Self, AudioLevelError> {
        let computed_gain = mode.gain_for(&file.path, measurement.as_ref())?;
        Ok(Self {
            file,
            mode,
            computed_gain,
            measurement,
        })
    }

    /// Where the corrected copy will be written.
    pub fn output_path(&self) -> Result<PathBuf, AudioLevelError> {
        let file_name = self
            .file
            .path
            .file_name()
            .ok_or_else(|| AudioLevelError::Correction {
                path: self.file.path.clone(),
                reason: "path has no file name".to_string(),
            })?;
        let parent = self.file.path.parent().unwrap_or_else(|| Path::new(""));
        Ok(self.mode.output_directory(parent).join(file_name))
    }

    /// Clipping advisory, if the gain pushes the measured peak above 0 dB.
    pub fn clipping_warning(&self) -> Option<ClippingWarning> {
        let measurement = self.measurement?;
        let warning = ClippingWarning {
            path: self.file.path.clone(),
            peak_db: measurement.peak_db,
            gain_db: self.computed_gain,
        };
        (warning.projected_peak_db() > 0.0).then_some(warning)
    }
}

/// Non-fatal advisory: the corrected copy is expected to clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippingWarning {
    /// Source file.
    pub path: PathBuf,
    /// Measured peak level.
    pub peak_db: f64,
    /// Applied gain.
    pub gain_db: f64,
}

impl ClippingWarning {
    /// Peak level after the gain.
    pub fn projected_peak_db(&self) -> f64 {
        self.peak_db + self.gain_db
    }
}

impl Display for ClippingWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}: peak {:.1} dB {:+.1} dB gain = {:+.1} dB, output will clip",
            self.path.display(),
            self.peak_db,
            self.gain_db,
            self.projected_peak_db()
        )
    }
}

/// A correction that produced its output file.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutcome {
    /// Source file.
    pub source: PathBuf,
    /// Corrected copy.
    pub output: PathBuf,
    /// Gain that was applied.
    pub gain_db: f64,
    /// Set when the output is expected to clip.
    pub clipping: Option<ClippingWarning>,
}

/// Run one correction job.
///
/// Creates the mode subdirectory if needed. Fails with
/// [`AudioLevelError::Correction`] when the tool cannot run or exits non-zero;
/// a partially written output is removed in that case.
pub fn correct(
    tool: &dyn MediaTool,
    job: &CorrectionJob,
) -> Result<CorrectionOutcome, AudioLevelError> {
    let source = &job.file.path;
    let failure = |reason: String| AudioLevelError::Correction {
        path: source.clone(),
        reason,
    };

    let output = job.output_path()?;
    if output == *source {
        return Err(failure("output would overwrite the source file".to_string()));
    }

    if let Some(directory) = output.parent() {
        fs::create_dir_all(directory).map_err(|error| {
            failure(format!("cannot create {}: {error}", directory.display()))
        })?;
    }

    let result = tool
        .apply_gain(source, job.computed_gain, &output)
        .map_err(|error| failure(error.to_string()))
        .and_then(|tool_output| {
            if tool_output.success {
                Ok(())
            } else {
                Err(failure(format!(
                    "tool exited with {}: {}",
                    tool_output.status,
                    tool_output.diagnostic_tail(DIAGNOSTIC_TAIL_LINES)
                )))
            }
        });

    if let Err(error) = result {
        if output.exists() && fs::remove_file(&output).is_err() {
            log::warn!("Could not remove partial output {}", output.display());
        }
        return Err(error);
    }

    let clipping = job.clipping_warning();
    if let Some(warning) = &clipping {
        log::warn!("{warning}");
    }

    Ok(CorrectionOutcome {
        source: source.clone(),
        output,
        gain_db: job.computed_gain,
        clipping,
    })
}

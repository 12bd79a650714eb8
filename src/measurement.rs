//! Loudness measurement.
//!
//! [`extract`] runs the analysis command of a [`MediaTool`] against one file
//! and parses the mean and peak levels out of its diagnostic text. Parsing is
//! done by [`parse_measurement`], which looks for two fixed [`Marker`]s:
//!
//! ```text
//! [Parsed_volumedetect_0 @ 0x5581] mean_volume: -27.4 dB
//! [Parsed_volumedetect_0 @ 0x5581] max_volume: -4.1 dB
//! ```
//!
//! # Example
//!
//! ```
//! use audiolevel::parse_measurement;
//!
//! let text = "mean_volume: -27.4 dB\nmax_volume: -4.1 dB\n";
//! let measurement = parse_measurement(text).unwrap();
//! assert_eq!(measurement.mean_db, -27.4);
//! assert_eq!(measurement.peak_db, -4.1);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AudioLevelError;
use crate::tool::MediaTool;

/// Number of stderr lines kept in an extraction error.
const DIAGNOSTIC_TAIL_LINES: usize = 3;

/// Mean and peak level of one file, in dBFS.
///
/// Both values are normally `<= 0`. `peak_db >= mean_db` is expected but not
/// enforced; the values are taken from the tool as reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// RMS level over the whole duration.
    pub mean_db: f64,
    /// Highest instantaneous level.
    pub peak_db: f64,
}

/// A textual marker in the tool output, followed by a signed number and a
/// unit tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Text preceding the value, including its trailing colon.
    pub label: &'static str,
    /// Unit tag following the value.
    pub unit: &'static str,
}

impl Marker {
    /// Regex capturing the number that follows this marker.
    fn pattern(&self) -> Regex {
        let source = format!(
            r"{}\s*([-+]?(?:\d+(?:\.\d*)?|\.\d+))\s*{}",
            regex::escape(self.label),
            regex::escape(self.unit),
        );
        // Both inputs are escaped literals around a fixed template.
        Regex::new(&source).expect("marker pattern is a valid regex")
    }
}

/// Marker of the mean level line.
pub const MEAN_VOLUME: Marker = Marker {
    label: "mean_volume:",
    unit: "dB",
};

/// Marker of the peak level line.
pub const MAX_VOLUME: Marker = Marker {
    label: "max_volume:",
    unit: "dB",
};

static MEAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| MEAN_VOLUME.pattern());
static MAX_PATTERN: LazyLock<Regex> = LazyLock::new(|| MAX_VOLUME.pattern());

/// Why a piece of tool output did not yield a [`Measurement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The output contained nothing but whitespace.
    EmptyOutput,
    /// A marker did not appear followed by a number and its unit.
    MarkerMissing(Marker),
    /// The number after a marker could not be read as a float.
    InvalidNumber {
        /// Marker whose value failed.
        marker: Marker,
        /// Text that was captured.
        text: String,
    },
}

impl Display for ParseFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ParseFailure::EmptyOutput => write!(f, "tool produced no output"),
            ParseFailure::MarkerMissing(marker) => {
                write!(f, "markers not found ({} missing; no audio track?)", marker.label)
            }
            ParseFailure::InvalidNumber { marker, text } => {
                write!(f, "unparsable value {text:?} after {}", marker.label)
            }
        }
    }
}

/// Parse mean and peak levels out of the tool's diagnostic text.
///
/// When a marker occurs several times (one report per audio stream) the first
/// occurrence wins.
pub fn parse_measurement(output: &str) -> Result<Measurement, ParseFailure> {
    if output.trim().is_empty() {
        return Err(ParseFailure::EmptyOutput);
    }

    let mean_db = parse_marker(output, MEAN_VOLUME, &MEAN_PATTERN)?;
    let peak_db = parse_marker(output, MAX_VOLUME, &MAX_PATTERN)?;

    Ok(Measurement { mean_db, peak_db })
}

fn parse_marker(output: &str, marker: Marker, pattern: &Regex) -> Result<f64, ParseFailure> {
    let captured = pattern
        .captures(output)
        .and_then(|captures| captures.get(1))
        .ok_or(ParseFailure::MarkerMissing(marker))?
        .as_str();

    captured
        .parse::<f64>()
        .map_err(|_| ParseFailure::InvalidNumber {
            marker,
            text: captured.to_string(),
        })
}

/// Measure one file.
///
/// Fails with [`AudioLevelError::Extraction`] when the file is missing, the
/// command cannot run, exits non-zero, or its output lacks either marker.
/// There is no retry.
pub fn extract(tool: &dyn MediaTool, path: &Path) -> Result<Measurement, AudioLevelError> {
    let failure = |reason: String| AudioLevelError::Extraction {
        path: path.to_path_buf(),
        reason,
    };

    if !path.is_file() {
        return Err(failure("file not found".to_string()));
    }

    let output = tool.analyze(path).map_err(|error| failure(error.to_string()))?;

    if !output.success {
        let tail = output.diagnostic_tail(DIAGNOSTIC_TAIL_LINES);
        return Err(failure(if tail.is_empty() {
            format!("tool exited with {}", output.status)
        } else {
            format!("tool exited with {}: {tail}", output.status)
        }));
    }

    let measurement = parse_measurement(&output.combined()).map_err(|parse_failure| {
        log::debug!("{}: {parse_failure}", path.display());
        failure(parse_failure.to_string())
    })?;

    log::debug!(
        "{}: mean {:.1} dB, peak {:.1} dB",
        path.display(),
        measurement.mean_db,
        measurement.peak_db
    );

    Ok(measurement)
}

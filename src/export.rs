//! CSV and JSON exports, and writing report files to disk.
//!
//! Both formats carry one row per [`Record`]. A failed file keeps its row:
//! the numeric columns are empty (CSV) or absent (JSON) and the `error`
//! column says why. [`parse_json`] reads a JSON export back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchResult, CorrectionStatus, Record};
use crate::classification::Tier;
use crate::error::AudioLevelError;
use crate::html::render_html;
use crate::report::Summary;

/// File name of the HTML report.
pub const HTML_REPORT_NAME: &str = "audio_report.html";
/// File name of the CSV export.
pub const CSV_REPORT_NAME: &str = "audio_report.csv";
/// File name of the JSON export.
pub const JSON_REPORT_NAME: &str = "audio_report.json";

/// Measurement status of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Measured.
    Ok,
    /// Not measured.
    Failed,
}

/// One record as exported to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    /// File name.
    pub file: String,
    /// Full path as discovered.
    pub path: String,
    /// Measurement status.
    pub status: RowStatus,
    /// Mean level, absent for failed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_db: Option<f64>,
    /// Peak level, absent for failed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_db: Option<f64>,
    /// Tier, absent for failed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// Tier label, absent for failed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_label: Option<String>,
    /// Failure reason, absent for measured files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Corrected copy, when one was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_path: Option<String>,
    /// Gain applied to the corrected copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_db: Option<f64>,
    /// Set when the corrected copy is expected to clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipping: Option<bool>,
    /// Correction failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_error: Option<String>,
}

impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        let measurement = record.measurement();
        let tier = record.tier();
        let (corrected_path, gain_db, clipping, correction_error) = match &record.correction {
            Some(CorrectionStatus::Written(outcome)) => (
                Some(outcome.output.display().to_string()),
                Some(outcome.gain_db),
                Some(outcome.clipping.is_some()),
                None,
            ),
            Some(CorrectionStatus::Failed { error }) => (None, None, None, Some(error.clone())),
            None => (None, None, None, None),
        };

        Self {
            file: record.file.display_name(),
            path: record.file.path.display().to_string(),
            status: if record.is_success() {
                RowStatus::Ok
            } else {
                RowStatus::Failed
            },
            mean_db: measurement.map(|measurement| measurement.mean_db),
            peak_db: measurement.map(|measurement| measurement.peak_db),
            tier,
            tier_label: tier.map(|tier| tier.label().to_string()),
            error: record.error().map(str::to_string),
            corrected_path,
            gain_db,
            clipping,
            correction_error,
        }
    }
}

/// The JSON export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Local time the report was generated.
    pub generated_at: String,
    /// Path the batch was run on.
    pub input: String,
    /// Aggregates.
    pub summary: Summary,
    /// One row per record, in discovery order.
    pub records: Vec<RecordRow>,
}

/// One record as exported to CSV. Every column is always present.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    file: &'a str,
    path: &'a str,
    status: RowStatus,
    mean_db: Option<f64>,
    peak_db: Option<f64>,
    tier: Option<&'a str>,
    error: Option<&'a str>,
    corrected_path: Option<&'a str>,
    gain_db: Option<f64>,
}

/// Render the CSV export.
pub fn render_csv(result: &BatchResult) -> Result<String, AudioLevelError> {
    let rows: Vec<RecordRow> = result.records.iter().map(RecordRow::from).collect();
    let mut writer = csv::Writer::from_writer(Vec::new());

    for row in &rows {
        writer.serialize(CsvRow {
            file: &row.file,
            path: &row.path,
            status: row.status,
            mean_db: row.mean_db,
            peak_db: row.peak_db,
            tier: row.tier_label.as_deref(),
            error: row.error.as_deref(),
            corrected_path: row.corrected_path.as_deref(),
            gain_db: row.gain_db,
        })?;
    }

    if rows.is_empty() {
        writer.write_record([
            "file",
            "path",
            "status",
            "mean_db",
            "peak_db",
            "tier",
            "error",
            "corrected_path",
            "gain_db",
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| AudioLevelError::IoError(error.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|error| AudioLevelError::IoError(std::io::Error::other(error)))
}

/// Build the JSON document for a batch.
pub fn json_report(result: &BatchResult, summary: &Summary) -> JsonReport {
    JsonReport {
        generated_at: Local::now().to_rfc3339(),
        input: result.input.display().to_string(),
        summary: summary.clone(),
        records: result.records.iter().map(RecordRow::from).collect(),
    }
}

/// Render the JSON export, pretty-printed.
pub fn render_json(result: &BatchResult, summary: &Summary) -> Result<String, AudioLevelError> {
    Ok(serde_json::to_string_pretty(&json_report(result, summary))?)
}

/// Read a JSON export back.
pub fn parse_json(text: &str) -> Result<JsonReport, AudioLevelError> {
    Ok(serde_json::from_str(text)?)
}

/// Which report files to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSelection {
    /// Write `audio_report.html`.
    pub html: bool,
    /// Write `audio_report.csv`.
    pub csv: bool,
    /// Write `audio_report.json`.
    pub json: bool,
}

impl Default for ReportSelection {
    fn default() -> Self {
        Self {
            html: true,
            csv: false,
            json: false,
        }
    }
}

/// Write the selected reports into `directory` and return their paths.
pub fn write_reports(
    result: &BatchResult,
    summary: &Summary,
    directory: &Path,
    selection: ReportSelection,
) -> Result<Vec<PathBuf>, AudioLevelError> {
    let mut written = Vec::new();

    if selection.html {
        let path = directory.join(HTML_REPORT_NAME);
        fs::write(&path, render_html(result, summary))?;
        written.push(path);
    }

    if selection.csv {
        let path = directory.join(CSV_REPORT_NAME);
        fs::write(&path, render_csv(result)?)?;
        written.push(path);
    }

    if selection.json {
        let path = directory.join(JSON_REPORT_NAME);
        fs::write(&path, render_json(result, summary)?)?;
        written.push(path);
    }

    for path in &written {
        log::info!("Wrote {}", path.display());
    }

    Ok(written)
}

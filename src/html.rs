//! HTML report rendering.
//!
//! [`render_html`] produces a single self-contained page: aggregate cards, a
//! tier distribution bar chart, a per-file table, and an error list when any
//! file failed. A batch without a single measured file renders a "no data"
//! state instead of aggregates.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::Local;

use crate::batch::{BatchResult, CorrectionStatus, Record};
use crate::report::Summary;

/// Mean level mapped to an empty row bar.
const BAR_FLOOR_DB: f64 = -50.0;

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%); min-height: 100vh; color: #e4e4e7; padding: 2rem; }
.container { max-width: 1200px; margin: 0 auto; }
h1 { font-size: 2rem; margin-bottom: 0.5rem; color: #fff; }
.subtitle { color: #a1a1aa; margin-bottom: 2rem; }
.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
.stat-card { background: rgba(255,255,255,0.05); border-radius: 12px; padding: 1.5rem; border: 1px solid rgba(255,255,255,0.1); }
.stat-value { font-size: 2rem; font-weight: bold; color: #fff; }
.stat-label { color: #a1a1aa; font-size: 0.875rem; margin-top: 0.25rem; }
.section { background: rgba(255,255,255,0.03); border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; border: 1px solid rgba(255,255,255,0.1); }
.section-title { font-size: 1.25rem; margin-bottom: 1rem; color: #fff; }
.no-data { color: #a1a1aa; font-style: italic; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 0.75rem 1rem; text-align: left; border-bottom: 1px solid rgba(255,255,255,0.1); }
th { color: #a1a1aa; font-weight: 500; font-size: 0.875rem; text-transform: uppercase; }
tr:hover { background: rgba(255,255,255,0.03); }
.level-badge { display: inline-block; padding: 0.25rem 0.75rem; border-radius: 9999px; font-size: 0.75rem; font-weight: 600; }
.failed-badge { background: #ef444420; color: #f87171; }
.db-value { font-family: 'SF Mono', Monaco, monospace; color: #a1a1aa; }
.db-bar { width: 100px; height: 8px; background: rgba(255,255,255,0.1); border-radius: 4px; overflow: hidden; display: inline-block; vertical-align: middle; margin-left: 0.5rem; }
.db-bar-fill { height: 100%; border-radius: 4px; }
.distribution { display: flex; gap: 1rem; flex-wrap: wrap; }
.dist-item { display: flex; align-items: center; gap: 0.5rem; }
.dist-bar { height: 24px; border-radius: 4px; min-width: 30px; display: flex; align-items: center; justify-content: center; color: #fff; font-weight: 600; font-size: 0.875rem; }
.error-list { color: #f87171; font-size: 0.875rem; list-style: none; }
.error-list li { margin: 0.25rem 0; }
.footer { text-align: center; color: #71717a; font-size: 0.75rem; margin-top: 2rem; }
"#;

/// Render the HTML report for a batch.
pub fn render_html(result: &BatchResult, summary: &Summary) -> String {
    HtmlReport {
        result,
        summary,
        generated_at: Local::now().format("%d/%m/%Y %H:%M").to_string(),
    }
    .to_string()
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Width of a row's level bar, in percent.
pub(crate) fn level_bar_percent(mean_db: f64) -> f64 {
    ((mean_db - BAR_FLOOR_DB) / -BAR_FLOOR_DB * 100.0).clamp(0.0, 100.0)
}

/// Width of a distribution bar, in pixels.
pub(crate) fn distribution_bar_width(count: usize) -> usize {
    (count * 20).max(30)
}

struct HtmlReport<'a> {
    result: &'a BatchResult,
    summary: &'a Summary,
    generated_at: String,
}

impl HtmlReport<'_> {
    fn title(&self) -> String {
        self.result
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.result.input.display().to_string())
    }

    fn write_cards(&self, f: &mut Formatter<'_>) -> FmtResult {
        let decibels = |value: Option<f64>| match value {
            Some(value) => format!("{value:.1} dB"),
            None => "&ndash;".to_string(),
        };

        writeln!(f, r#"<div class="stats-grid">"#)?;
        stat_card(f, &self.summary.succeeded.to_string(), "Files analyzed")?;
        stat_card(f, &decibels(self.summary.average_mean_db), "Average level")?;
        stat_card(f, &decibels(self.summary.min_mean_db), "Quietest")?;
        stat_card(f, &decibels(self.summary.max_mean_db), "Loudest")?;
        if self.summary.failed > 0 {
            stat_card(f, &self.summary.failed.to_string(), "Failed")?;
        }
        writeln!(f, "</div>")
    }

    fn write_distribution(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, r#"<div class="section">"#)?;
        writeln!(f, r#"<h2 class="section-title">Distribution by tier</h2>"#)?;

        if !self.summary.has_data() {
            writeln!(f, r#"<p class="no-data">No data: no file could be measured.</p>"#)?;
            return writeln!(f, "</div>");
        }

        writeln!(f, r#"<div class="distribution">"#)?;
        for entry in self.summary.tier_counts.iter().filter(|entry| entry.count > 0) {
            writeln!(
                f,
                r#"<div class="dist-item"><span>{}</span><div class="dist-bar" style="background: {}; width: {}px;">{}</div></div>"#,
                escape_html(entry.tier.label()),
                entry.tier.color(),
                distribution_bar_width(entry.count),
                entry.count
            )?;
        }
        writeln!(f, "</div>")?;
        writeln!(f, "</div>")
    }

    fn write_table(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, r#"<div class="section">"#)?;
        writeln!(f, r#"<h2 class="section-title">Files</h2>"#)?;

        if self.result.is_empty() {
            writeln!(f, r#"<p class="no-data">No data: no media files were found.</p>"#)?;
            return writeln!(f, "</div>");
        }

        writeln!(
            f,
            "<table><thead><tr><th>File</th><th>Mean level</th><th>Peak level</th><th>Tier</th></tr></thead><tbody>"
        )?;
        for record in &self.result.records {
            write_row(f, record)?;
        }
        writeln!(f, "</tbody></table>")?;
        writeln!(f, "</div>")
    }

    fn write_corrections(&self, f: &mut Formatter<'_>) -> FmtResult {
        let Some(mode) = self.result.correction else {
            return Ok(());
        };

        writeln!(f, r#"<div class="section">"#)?;
        writeln!(
            f,
            r#"<h2 class="section-title">Correction: {}</h2>"#,
            escape_html(&mode.to_string())
        )?;
        writeln!(
            f,
            "<p>{} written, {} failed, {} may clip</p>",
            self.summary.corrections_written,
            self.summary.correction_failures,
            self.summary.clipping_warnings
        )?;
        writeln!(f, "</div>")
    }

    fn write_errors(&self, f: &mut Formatter<'_>) -> FmtResult {
        let errors = self.result.errors();
        if errors.is_empty() {
            return Ok(());
        }

        writeln!(f, r#"<div class="section">"#)?;
        writeln!(f, r#"<h2 class="section-title">Errors</h2>"#)?;
        writeln!(f, r#"<ul class="error-list">"#)?;
        for (file, message) in errors {
            writeln!(
                f,
                "<li>{}: {}</li>",
                escape_html(&file.display_name()),
                escape_html(&message)
            )?;
        }
        writeln!(f, "</ul>")?;
        writeln!(f, "</div>")
    }
}

impl Display for HtmlReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let title = escape_html(&self.title());

        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, r#"<html lang="en">"#)?;
        writeln!(f, "<head>")?;
        writeln!(f, r#"<meta charset="UTF-8">"#)?;
        writeln!(
            f,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#
        )?;
        writeln!(f, "<title>Audio report - {title}</title>")?;
        writeln!(f, "<style>{}</style>", STYLE)?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        writeln!(f, r#"<div class="container">"#)?;
        writeln!(f, "<h1>Audio level report</h1>")?;
        writeln!(
            f,
            r#"<p class="subtitle">{}<br>{}</p>"#,
            escape_html(&self.result.input.display().to_string()),
            escape_html(&self.generated_at)
        )?;

        self.write_cards(f)?;
        self.write_distribution(f)?;
        self.write_table(f)?;
        self.write_corrections(f)?;
        self.write_errors(f)?;

        writeln!(f, r#"<div class="footer">Generated by audiolevel</div>"#)?;
        writeln!(f, "</div>")?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

fn stat_card(f: &mut Formatter<'_>, value: &str, label: &str) -> FmtResult {
    writeln!(
        f,
        r#"<div class="stat-card"><div class="stat-value">{value}</div><div class="stat-label">{label}</div></div>"#
    )
}

fn write_row(f: &mut Formatter<'_>, record: &Record) -> FmtResult {
    let name = escape_html(&record.file.display_name());

    let (Some(measurement), Some(tier)) = (record.measurement(), record.tier()) else {
        return writeln!(
            f,
            r#"<tr><td>{name}</td><td><span class="db-value">&ndash;</span></td><td><span class="db-value">&ndash;</span></td><td><span class="level-badge failed-badge">FAILED</span></td></tr>"#
        );
    };

    let corrected = match &record.correction {
        Some(CorrectionStatus::Written(outcome)) if outcome.clipping.is_some() => " (corrected, may clip)",
        Some(CorrectionStatus::Written(_)) => " (corrected)",
        Some(CorrectionStatus::Failed { .. }) => " (correction failed)",
        None => "",
    };

    writeln!(
        f,
        r#"<tr><td>{name}{corrected}</td><td><span class="db-value">{mean:.1} dB</span><div class="db-bar"><div class="db-bar-fill" style="width: {percent:.0}%; background: {color};"></div></div></td><td><span class="db-value">{peak:.1} dB</span></td><td><span class="level-badge" style="background: {color}20; color: {color};">{glyph} {label}</span></td></tr>"#,
        mean = measurement.mean_db,
        percent = level_bar_percent(measurement.mean_db),
        color = tier.color(),
        peak = measurement.peak_db,
        glyph = tier.glyph(),
        label = escape_html(tier.label()),
    )
}

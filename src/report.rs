//! Batch aggregation.
//!
//! [`summarize`] reduces a [`BatchResult`] to a [`Summary`]: counts per
//! [`Tier`] and the average / minimum / maximum mean level. Numeric aggregates
//! only ever cover measured files; failures are counted on their own and never
//! contribute a fabricated zero.
//!
//! # Example
//!
//! ```no_run
//! use audiolevel::{AnalysisOptions, BatchAnalyzer, FfmpegTool, summarize};
//!
//! let analyzer = BatchAnalyzer::new(FfmpegTool::locate()?, AnalysisOptions::new());
//! let result = analyzer.run("recordings/".as_ref())?;
//! print!("{}", summarize(&result));
//! # Ok::<(), audiolevel::AudioLevelError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::batch::BatchResult;
use crate::classification::Tier;

/// Number of measured files in one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCount {
    /// The tier.
    pub tier: Tier,
    /// Files classified into it.
    pub count: usize,
}

/// Aggregate view of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Files discovered.
    pub total: usize,
    /// Files measured.
    pub succeeded: usize,
    /// Files that could not be measured.
    pub failed: usize,
    /// One entry per tier, quietest first, zero counts included.
    pub tier_counts: Vec<TierCount>,
    /// Average mean level over measured files.
    pub average_mean_db: Option<f64>,
    /// Lowest mean level over measured files.
    pub min_mean_db: Option<f64>,
    /// Highest mean level over measured files.
    pub max_mean_db: Option<f64>,
    /// Corrected copies written.
    pub corrections_written: usize,
    /// Corrections that failed.
    pub correction_failures: usize,
    /// Written corrections expected to clip.
    pub clipping_warnings: usize,
}

impl Summary {
    /// Count for one tier.
    pub fn count(&self, tier: Tier) -> usize {
        self.tier_counts
            .iter()
            .find(|entry| entry.tier == tier)
            .map_or(0, |entry| entry.count)
    }

    /// Returns `true` when at least one file was measured.
    pub fn has_data(&self) -> bool {
        self.succeeded > 0
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{} file(s) analyzed, {} failed", self.succeeded, self.failed)?;

        if let (Some(average), Some(min), Some(max)) =
            (self.average_mean_db, self.min_mean_db, self.max_mean_db)
        {
            writeln!(
                f,
                "mean level: {average:.1} dB (lowest {min:.1} dB, highest {max:.1} dB)"
            )?;
            for entry in self.tier_counts.iter().filter(|entry| entry.count > 0) {
                writeln!(f, "  {:<8} {}", entry.tier.label(), entry.count)?;
            }
        } else if self.total == 0 {
            writeln!(f, "No media files found.")?;
        } else {
            writeln!(f, "No file could be measured.")?;
        }

        if self.corrections_written + self.correction_failures > 0 {
            writeln!(
                f,
                "{} correction(s) written, {} failed, {} may clip",
                self.corrections_written, self.correction_failures, self.clipping_warnings
            )?;
        }
        Ok(())
    }
}

/// Aggregate a batch.
pub fn summarize(result: &BatchResult) -> Summary {
    let tier_counts = Tier::ALL
        .into_iter()
        .map(|tier| TierCount {
            tier,
            count: result
                .successes()
                .filter(|record| record.tier() == Some(tier))
                .count(),
        })
        .collect();

    Summary {
        total: result.total(),
        succeeded: result.succeeded(),
        failed: result.failed(),
        tier_counts,
        average_mean_db: result.average_mean_db(),
        min_mean_db: result.min_mean_db(),
        max_mean_db: result.max_mean_db(),
        corrections_written: result.corrections_written().count(),
        correction_failures: result.correction_failures().count(),
        clipping_warnings: result.warnings().len(),
    }
}

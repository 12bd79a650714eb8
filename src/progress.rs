//! Progress reporting.
//!
//! This module provides [`ProgressCallback`] for observing a batch and
//! [`ProgressInfo`] for the snapshots it receives. Progress is purely
//! observational: callbacks cannot influence results.
//!
//! Workers finish in any order, so the internal tracker serializes updates
//! behind a single mutex. For a given [`OperationType`] the `current` field
//! delivered to a callback strictly increases from 1 to `total`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use audiolevel::{AnalysisOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {}/{} ({:.0}%)", info.operation, info.current, info.total, info.percentage);
//!     }
//! }
//!
//! let options = AnalysisOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// The kind of per-file work that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationType {
    /// Loudness measurement of one file.
    Measurement,
    /// Gain-adjusted re-encode of one file.
    Correction,
}

/// A snapshot of batch progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work completed.
    pub operation: OperationType,
    /// How many items of this operation have completed so far.
    pub current: u64,
    /// Items of this operation expected in the batch.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time since the batch started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The file whose completion triggered this report.
    pub current_file: Option<PathBuf>,
}

/// Trait for receiving progress updates during a batch.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks are
/// invoked from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called once per completed item.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

struct TrackerState {
    current: u64,
    total: u64,
}

/// Counts completions of one operation across workers and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    start_time: Instant,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            start_time: Instant::now(),
            state: Mutex::new(TrackerState { current: 0, total }),
        }
    }

    /// Grow the expected total. Used for corrections, whose count is only
    /// known once each measurement has succeeded.
    pub(crate) fn expect_more(&self, count: u64) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.total += count;
    }

    /// Record one completed item and fire the callback.
    ///
    /// The callback runs while the lock is held so that reports reach it in
    /// increasing order.
    pub(crate) fn advance(&self, file: Option<&Path>) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.current += 1;
        state.total = state.total.max(state.current);

        let elapsed = self.start_time.elapsed();
        let percentage = (state.current as f32 / state.total as f32) * 100.0;
        let remaining = state.total - state.current;
        let estimated_remaining = u32::try_from(state.current)
            .ok()
            .zip(u32::try_from(remaining).ok())
            .map(|(done, left)| (elapsed / done) * left);

        let info = ProgressInfo {
            operation: self.operation,
            current: state.current,
            total: state.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_file: file.map(Path::to_path_buf),
        };

        self.callback.on_progress(&info);
    }

    /// Items completed so far.
    pub(crate) fn completed(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .current
    }
}

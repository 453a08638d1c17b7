//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OutputResult, SummaryRow, TrajectoryRow};

/// Sink for per-world trajectories and the end-of-run summary.
///
/// Errors surface through [`SimOutputObserver::take_error`](crate::SimOutputObserver::take_error)
/// when the writer is driven by an observer.
pub trait OutputWriter {
    /// Write a batch of trajectory rows.
    fn write_trajectory(&mut self, rows: &[TrajectoryRow<'_>]) -> OutputResult<()>;

    /// Write a batch of summary rows.
    fn write_summary(&mut self, rows: &[SummaryRow<'_>]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}

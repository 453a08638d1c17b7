//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use epi_sim::{SimObserver, Trajectory, TrajectorySummary};
use log::{debug, warn};

use crate::row::{SummaryRow, TrajectoryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes every finished world's trajectory and the
/// end-of-run summary to any [`OutputWriter`].
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `World::run` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after the run returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!("output write failed: {e}");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_world_end(&mut self, world: usize, trajectory: &Trajectory) {
        let rows: Vec<TrajectoryRow<'_>> = (0..trajectory.len())
            .flat_map(|step| {
                trajectory.iter().map(move |(state, series)| TrajectoryRow {
                    world,
                    step,
                    state,
                    count: series[step],
                })
            })
            .collect();
        debug!("writing {} trajectory rows for world {world}", rows.len());
        let result = self.writer.write_trajectory(&rows);
        self.store_err(result);
    }

    fn on_run_end(&mut self, summary: &TrajectorySummary) {
        let rows: Vec<SummaryRow<'_>> = (0..summary.len())
            .flat_map(|step| {
                summary.iter().map(move |(state, stats)| {
                    let p = stats[step];
                    SummaryRow {
                        step,
                        state,
                        mean: p.mean,
                        stddev: p.stddev,
                        min: p.min,
                        max: p.max,
                    }
                })
            })
            .collect();
        let result = self.writer.write_summary(&rows);
        self.store_err(result);
        let result = self.writer.finish();
        self.store_err(result);
    }
}

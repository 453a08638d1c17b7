//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `trajectories.csv` (`world,step,state,count`)
//! - `summary.csv` (`step,state,mean,stddev,min,max`)

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, SummaryRow, TrajectoryRow};

/// Writes run output to two CSV files.
pub struct CsvWriter {
    trajectories: Writer<File>,
    summary:      Writer<File>,
    finished:     bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open both files, and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut trajectories = Writer::from_path(dir.join("trajectories.csv"))?;
        trajectories.write_record(["world", "step", "state", "count"])?;

        let mut summary = Writer::from_path(dir.join("summary.csv"))?;
        summary.write_record(["step", "state", "mean", "stddev", "min", "max"])?;

        Ok(Self {
            trajectories,
            summary,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_trajectory(&mut self, rows: &[TrajectoryRow<'_>]) -> OutputResult<()> {
        for row in rows {
            self.trajectories.write_record(&[
                row.world.to_string(),
                row.step.to_string(),
                row.state.to_owned(),
                row.count.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_summary(&mut self, rows: &[SummaryRow<'_>]) -> OutputResult<()> {
        for row in rows {
            self.summary.write_record(&[
                row.step.to_string(),
                row.state.to_owned(),
                row.mean.to_string(),
                row.stddev.to_string(),
                row.min.to_string(),
                row.max.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trajectories.flush()?;
        self.summary.flush()?;
        Ok(())
    }
}

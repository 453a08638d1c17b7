//! Per-world population counts and their cross-world summary.
//!
//! A trajectory with `steps` steps holds `steps + 1` points: index 0 is the
//! population right after initialization, index `t + 1` the population after
//! step `t` commits.

use crate::{SimError, SimResult};

// ── Trajectory ────────────────────────────────────────────────────────────────

/// State label → ordered per-step counts, for one world.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    labels: Vec<String>,
    /// `series[state][point]`.
    series: Vec<Vec<usize>>,
}

impl Trajectory {
    pub fn new(labels: Vec<String>) -> Self {
        let series = vec![Vec::new(); labels.len()];
        Self { labels, series }
    }

    /// Append one point.  `counts` is indexed by `StateId`; missing entries
    /// count as 0.
    pub fn push(&mut self, counts: &[usize]) {
        for (i, s) in self.series.iter_mut().enumerate() {
            s.push(counts.get(i).copied().unwrap_or(0));
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of recorded points.
    pub fn len(&self) -> usize {
        self.series.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts of `label` over time.
    pub fn get(&self, label: &str) -> Option<&[usize]> {
        self.labels.iter().position(|l| l == label).map(|i| self.series[i].as_slice())
    }

    /// `(label, counts)` in declared state order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> + '_ {
        self.labels.iter().map(String::as_str).zip(self.series.iter().map(Vec::as_slice))
    }

    /// Counts of every state at `point`.
    pub fn at(&self, point: usize) -> Option<Vec<usize>> {
        (point < self.len()).then(|| self.series.iter().map(|s| s[point]).collect())
    }

    pub fn last(&self) -> Option<Vec<usize>> {
        self.len().checked_sub(1).and_then(|p| self.at(p))
    }
}

// ── TrajectorySummary ─────────────────────────────────────────────────────────

/// Cross-world statistics of one state at one point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointStats {
    pub mean:   f64,
    /// Population standard deviation (divides by the number of worlds).
    pub stddev: f64,
    pub min:    usize,
    pub max:    usize,
}

impl PointStats {
    fn from_values(values: &[usize]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<usize>() as f64 / n;
        let variance = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            stddev: variance.sqrt(),
            min:    values.iter().copied().min().unwrap_or(0),
            max:    values.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Per-state, per-point mean / stddev / min / max over worlds.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectorySummary {
    labels: Vec<String>,
    worlds: usize,
    /// `stats[state][point]`.
    stats:  Vec<Vec<PointStats>>,
}

impl TrajectorySummary {
    /// Summarize `trajectories`, which must share labels and length.
    pub fn from_trajectories(trajectories: &[Trajectory]) -> SimResult<Self> {
        let Some(first) = trajectories.first() else {
            return Err(SimError::Mismatch("no trajectories to summarize".into()));
        };
        for (w, t) in trajectories.iter().enumerate() {
            if t.labels != first.labels {
                return Err(SimError::Mismatch(format!("world {w} has different state labels")));
            }
            if t.len() != first.len() {
                return Err(SimError::Mismatch(format!(
                    "world {w} has {} points, expected {}",
                    t.len(),
                    first.len()
                )));
            }
        }

        let stats = (0..first.labels.len())
            .map(|state| {
                (0..first.len())
                    .map(|point| {
                        let values: Vec<usize> =
                            trajectories.iter().map(|t| t.series[state][point]).collect();
                        PointStats::from_values(&values)
                    })
                    .collect()
            })
            .collect();

        Ok(Self { labels: first.labels.clone(), worlds: trajectories.len(), stats })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn worlds(&self) -> usize {
        self.worlds
    }

    /// Number of points per state.
    pub fn len(&self) -> usize {
        self.stats.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, label: &str) -> Option<&[PointStats]> {
        self.labels.iter().position(|l| l == label).map(|i| self.stats[i].as_slice())
    }

    /// `(label, stats)` in declared state order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PointStats])> + '_ {
        self.labels.iter().map(String::as_str).zip(self.stats.iter().map(Vec::as_slice))
    }
}

//! Plain data row types written by output backends.

/// One state's count at one trajectory point of one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryRow<'a> {
    pub world: usize,
    /// Trajectory point: 0 is the initial state, `t + 1` follows step `t`.
    pub step:  usize,
    pub state: &'a str,
    pub count: usize,
}

/// Cross-world statistics of one state at one trajectory point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow<'a> {
    pub step:   usize,
    pub state:  &'a str,
    pub mean:   f64,
    pub stddev: f64,
    pub min:    usize,
    pub max:    usize,
}

//! Logical simulation time.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter with no wall-clock
//! mapping: one tick is one full orchestrator step.  Using an integer tick as
//! the canonical time unit means turnaround, validity, and countdown
//! arithmetic is exact and comparisons are O(1).
//!
//! The current `(world, tick)` pair is carried explicitly as a [`WorldStep`]
//! through every call that needs it; nothing reads ambient global time.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter within one world.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`, saturating at `u64::MAX`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// The following tick.
    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        self.offset(rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── WorldStep ─────────────────────────────────────────────────────────────────

/// The `(world, tick)` pair identifying the step currently being simulated.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldStep {
    /// Zero-based index of the stochastic replica.
    pub world: usize,
    pub tick:  Tick,
}

impl WorldStep {
    #[inline]
    pub fn new(world: usize, tick: Tick) -> Self {
        Self { world, tick }
    }
}

impl fmt::Display for WorldStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world {} {}", self.world, self.tick)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically loaded from a JSON file by the application crate and passed
/// to the simulation runner.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Number of independent stochastic replicas to run.
    pub worlds: usize,

    /// Time steps simulated per world.
    pub steps: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    ///
    /// The generator is seeded once per run, not once per world, so a later
    /// world can only be reproduced by re-running every world before it.
    pub seed: u64,

    /// Worker thread count passed to Rayon when the `parallel` feature of
    /// `epi-sim` is enabled.  `None` uses all logical cores.
    #[cfg_attr(feature = "serde", serde(default))]
    pub num_threads: Option<usize>,
}

impl SimConfig {
    /// The tick at which each world ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.steps)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { worlds: 1, steps: 30, seed: 0, num_threads: None }
    }
}

//! Deterministic RNG wrappers.
//!
//! # Determinism strategy
//!
//! A single [`SimRng`] is seeded once from the run's seed and threaded by
//! `&mut` through every world of the run.  It is never re-seeded between
//! worlds, so world `k` of a 10-world run differs from world `k` of a 3-world
//! run only if an earlier world consumed a different number of draws.
//!
//! The next-state phase draws from per-agent [`AgentRng`]s.  Each step the
//! orchestrator derives one per agent from the shared generator, in
//! ascending `AgentId` order:
//!
//!   seed = shared.next_u64() XOR (agent_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio.
//! This means:
//!
//! - The draw sequence is a pure function of the run seed.
//! - Agents never share RNG state, so the phase can run on any number of
//!   threads and still produce identical transitions.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG for one step's next-state computation.
///
/// Created by [`SimRng::agent_child`]; stored in a parallel `Vec<AgentRng>`
/// indexed by `AgentId`.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed directly from a base seed and an agent ID.
    pub fn new(base_seed: u64, agent: AgentId) -> Self {
        let seed = base_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types
    /// (`rng.inner().sample(...)`, `rng.inner().gen_range(...)`, etc.)
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// A uniform `f64` in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// The run-wide generator shared by initialization, filtering, policies,
/// and per-step agent seeding.
///
/// Used only in single-threaded contexts; parallel work receives
/// [`AgentRng`]s derived from it.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive the RNG `agent` uses for this step's next-state computation.
    /// Consumes exactly one `u64` from the shared sequence.
    pub fn agent_child(&mut self, agent: AgentId) -> AgentRng {
        let base: u64 = self.0.r#gen();
        AgentRng::new(base, agent)
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// A uniform `f64` in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// One Bernoulli draw: `true` when a uniform value falls below `p`.
    ///
    /// Unlike `Rng::gen_bool`, `p` is not clamped and never panics: values
    /// `>= 1` always succeed and values `<= 0` never do.  Exactly one draw is
    /// consumed either way.
    #[inline]
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }

    /// Pick `amount` distinct indices from `0..length` (all of them, in
    /// random order, if `amount >= length`).
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.0, length, amount.min(length)).into_vec()
    }
}

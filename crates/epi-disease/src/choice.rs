//! Cumulative-draw selection and exact-count state partitioning.

use epi_agent::AgentStore;
use epi_core::{AgentId, SimRng, StateId};

use crate::{ModelError, ModelResult, StateSet};

/// Sums within this distance of 1 are accepted as 1.
pub(crate) const SUM_TOLERANCE: f64 = 1e-9;

/// Walk `(state, probability)` pairs in order, accumulating; return the
/// first state whose running sum exceeds `r`.
pub(crate) fn cumulative_pick<I>(options: I, r: f64) -> Option<StateId>
where
    I: IntoIterator<Item = (StateId, f64)>,
{
    let mut cumulative = 0.0;
    for (state, p) in options {
        cumulative += p;
        if cumulative > r {
            return Some(state);
        }
    }
    None
}

pub(crate) fn check_probability(what: impl FnOnce() -> String, value: f64) -> ModelResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::InvalidProbability { what: what(), value })
    }
}

// ── WeightedChoice ────────────────────────────────────────────────────────────

/// A static destination distribution that sums to 1.
///
/// Options are kept in declared state order regardless of the order they
/// were supplied in.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedChoice {
    options: Vec<(StateId, f64)>,
}

impl WeightedChoice {
    /// Build from labelled weights.  `from` names the source state in errors.
    pub fn new<'a, I>(states: &StateSet, from: &str, weights: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut options: Vec<(StateId, f64)> = Vec::new();
        for (label, w) in weights {
            let to = states.require(label)?;
            check_probability(|| format!("weight {from:?} -> {label:?}"), w)?;
            if options.iter().any(|&(s, _)| s == to) {
                return Err(ModelError::DuplicateTransition {
                    from: from.to_owned(),
                    to:   label.to_owned(),
                });
            }
            options.push((to, w));
        }
        let sum: f64 = options.iter().map(|&(_, w)| w).sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ModelError::WeightSum { from: from.to_owned(), sum });
        }
        options.sort_by_key(|&(s, _)| s);
        Ok(Self { options })
    }

    pub fn options(&self) -> &[(StateId, f64)] {
        &self.options
    }

    /// Destination for a uniform draw `r` in `[0, 1)`.
    ///
    /// Rounding can leave the cumulative sum a hair under `r`; the last
    /// option absorbs that case.
    pub fn pick(&self, r: f64) -> StateId {
        cumulative_pick(self.options.iter().copied(), r)
            .or_else(|| self.options.last().map(|&(s, _)| s))
            .unwrap_or(StateId::INVALID)
    }
}

// ── Exact partitioning ────────────────────────────────────────────────────────

/// Block sizes for `n` agents: block `i` holds
/// `⌊cumᵢ·n⌋ − ⌊cumᵢ₋₁·n⌋` agents, and the last block ends exactly at `n`.
pub fn exact_counts(proportions: &[f64], n: usize) -> Vec<usize> {
    let mut counts = Vec::with_capacity(proportions.len());
    let mut cumulative = 0.0;
    let mut previous = 0usize;
    for (i, p) in proportions.iter().enumerate() {
        cumulative += p;
        let upto = if i + 1 == proportions.len() {
            n
        } else {
            let scaled = cumulative * n as f64;
            // Sums like 0.1 + 0.7 land just below the integer they denote.
            let snapped = if scaled.ceil() - scaled <= SUM_TOLERANCE * n as f64 {
                scaled.ceil()
            } else {
                scaled.floor()
            };
            (snapped as usize).clamp(previous, n)
        };
        counts.push(upto - previous);
        previous = upto;
    }
    counts
}

/// Validate starting proportions (one per declared state).
pub(crate) fn check_proportions(states: &StateSet, proportions: &[f64]) -> ModelResult<()> {
    for (id, &p) in states.ids().zip(proportions) {
        check_probability(|| format!("proportion of {:?}", states.label(id)), p)?;
    }
    let sum: f64 = proportions.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(ModelError::ProportionSum { sum });
    }
    Ok(())
}

/// Shuffle every agent and deal contiguous blocks of the shuffled order to
/// states in declared order, sized by [`exact_counts`].
pub fn partition_states(
    agents:      &AgentStore,
    proportions: &[f64],
    rng:         &mut SimRng,
) -> Vec<(AgentId, StateId)> {
    let mut order: Vec<AgentId> = agents.ids().collect();
    rng.shuffle(&mut order);

    let counts = exact_counts(proportions, order.len());
    let mut out = Vec::with_capacity(order.len());
    let mut cursor = order.into_iter();
    for (state, count) in counts.into_iter().enumerate() {
        out.extend(cursor.by_ref().take(count).map(|a| (a, StateId(state as u16))));
    }
    out
}

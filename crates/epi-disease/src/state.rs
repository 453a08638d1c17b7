//! The ordered state set of a disease model.

use epi_core::StateId;

use crate::{ModelError, ModelResult};

/// Ordered disease-state labels plus the subset that is infectious.
///
/// Declaration order assigns `StateId`s and is the tie-break order for every
/// cumulative draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSet {
    labels:     Vec<String>,
    infectious: Vec<bool>,
}

impl StateSet {
    /// Declare states in order and mark `infectious` ones.
    pub fn new<L, I>(labels: L, infectious: I) -> ModelResult<Self>
    where
        L: IntoIterator,
        L::Item: Into<String>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if out.contains(&label) {
                return Err(ModelError::DuplicateState(label));
            }
            out.push(label);
        }
        if out.is_empty() {
            return Err(ModelError::NoStates);
        }
        if StateId::try_from(out.len()).is_err() {
            return Err(ModelError::TooManyStates(out.len()));
        }

        let mut set = Self { infectious: vec![false; out.len()], labels: out };
        for label in infectious {
            let id = set.require(label.as_ref())?;
            set.infectious[id.index()] = true;
        }
        Ok(set)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.labels.len() as u16).map(StateId)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label of `id`, `"?"` for ids outside the set.
    pub fn label(&self, id: StateId) -> &str {
        self.labels.get(id.index()).map_or("?", String::as_str)
    }

    pub fn id(&self, label: &str) -> Option<StateId> {
        self.labels.iter().position(|l| l == label).map(|i| StateId(i as u16))
    }

    pub fn require(&self, label: &str) -> ModelResult<StateId> {
        self.id(label).ok_or_else(|| ModelError::UnknownState(label.to_owned()))
    }

    #[inline]
    pub fn is_infectious(&self, id: StateId) -> bool {
        self.infectious.get(id.index()).copied().unwrap_or(false)
    }

    pub fn infectious_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.ids().filter(|&id| self.is_infectious(id))
    }
}

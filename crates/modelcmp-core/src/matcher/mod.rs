/// Pairs nodes of a left graph with nodes of a right graph.
///
/// Matching runs in two passes over the containment trees:
///
/// 1. **Exact identity** ([`identity`]): nodes sharing type tag, identity key
///    and key value are paired greedily in left depth-first order.
/// 2. **Structural fallback** ([`structural`]): the unmatched children of every
///    matched pair are scored against each other and paired by descending
///    similarity, in waves that descend the trees.
///
/// The result is a bijective [`Mapping`]. Matching is deterministic: the same
/// inputs and configuration always yield the same mapping, with or without
/// parallel scoring.
pub mod identity;
pub mod structural;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::time::Duration;

use indexmap::IndexMap;

use crate::containment::{Containment, StructureError};
use crate::graph::Graph;
use crate::model::{NodeId, Side};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default identity keys, tried in order.
pub const DEFAULT_IDENTITY_KEYS: [&str; 2] = ["id", "name"];

/// Default minimum similarity for a structural match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Tuning knobs for [`match_graphs`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Attribute names that carry node identity; the first present, non-null
    /// one on a node is its identity.
    pub identity_keys: Vec<String>,
    /// Minimum similarity (inclusive, `0.0..=1.0`) for a structural match.
    pub similarity_threshold: f64,
    /// Weight of one attribute in the similarity score.
    pub attribute_weight: f64,
    /// Weight of one cross reference in the similarity score.
    pub reference_weight: f64,
    /// Wall-clock allowance for the structural pass.
    pub fallback_budget: Option<Duration>,
    /// Score the sibling groups of a wave on the rayon thread pool.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            identity_keys: DEFAULT_IDENTITY_KEYS.iter().map(|k| (*k).to_owned()).collect(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            attribute_weight: 1.0,
            reference_weight: 1.0,
            fallback_budget: None,
            parallel: true,
        }
    }
}

impl MatchConfig {
    fn validate(&self) -> Result<(), MatchError> {
        let t = self.similarity_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(MatchError::InvalidConfig(format!(
                "similarity threshold {t} is outside 0.0..=1.0"
            )));
        }
        for (name, weight) in [
            ("attribute", self.attribute_weight),
            ("reference", self.reference_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::InvalidConfig(format!(
                    "{name} weight {weight} must be a finite, non-negative number"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort matching.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    /// One of the graphs violates a containment invariant.
    #[error("{side} model has malformed containment: {source}")]
    Structure {
        /// Graph with the malformed containment.
        side: Side,
        /// The violated invariant.
        #[source]
        source: StructureError,
    },
    /// The structural pass ran past its wall-clock budget.
    #[error("structural matching exceeded its budget of {budget:?} with {pending} sibling groups pending")]
    BudgetExhausted {
        /// The configured budget.
        budget: Duration,
        /// Sibling groups left unscored.
        pending: usize,
    },
    /// The configuration is unusable.
    #[error("invalid match configuration: {0}")]
    InvalidConfig(String),
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// A bijective set of (left id, right id) pairs.
///
/// Each left id and each right id occurs in at most one pair; nodes that occur
/// in none are unmatched. Iteration follows insertion order, which for
/// mappings produced by [`match_graphs`] is the left depth-first order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    forward: IndexMap<NodeId, NodeId>,
    backward: HashMap<NodeId, NodeId>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair. Returns `false` and leaves the mapping unchanged when
    /// either id is already paired.
    pub fn insert(&mut self, left: NodeId, right: NodeId) -> bool {
        if self.forward.contains_key(&left) || self.backward.contains_key(&right) {
            return false;
        }
        self.backward.insert(right.clone(), left.clone());
        self.forward.insert(left, right);
        true
    }

    /// Right partner of a left id.
    pub fn right_of(&self, left: &str) -> Option<&NodeId> {
        self.forward.get(left)
    }

    /// Left partner of a right id.
    pub fn left_of(&self, right: &str) -> Option<&NodeId> {
        self.backward.get(right)
    }

    /// Partner of `id` observed on `side`.
    pub fn partner(&self, side: Side, id: &str) -> Option<&NodeId> {
        match side {
            Side::Left => self.right_of(id),
            Side::Right => self.left_of(id),
        }
    }

    /// Iterates pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.forward.iter()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if no node is paired.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Index-based working mapping used while the passes run.
#[derive(Debug, Clone)]
pub(crate) struct MatchState {
    l2r: Vec<Option<usize>>,
    r2l: Vec<Option<usize>>,
}

impl MatchState {
    pub(crate) fn new(left_count: usize, right_count: usize) -> Self {
        Self {
            l2r: vec![None; left_count],
            r2l: vec![None; right_count],
        }
    }

    pub(crate) fn right_of(&self, left: usize) -> Option<usize> {
        self.l2r.get(left).copied().flatten()
    }

    pub(crate) fn left_of(&self, right: usize) -> Option<usize> {
        self.r2l.get(right).copied().flatten()
    }

    /// Pairs two unmatched nodes; refuses if either is already paired.
    pub(crate) fn pair(&mut self, left: usize, right: usize) -> bool {
        if self.right_of(left).is_some() || self.left_of(right).is_some() {
            return false;
        }
        if let (Some(l), Some(r)) = (self.l2r.get_mut(left), self.r2l.get_mut(right)) {
            *l = Some(right);
            *r = Some(left);
            true
        } else {
            false
        }
    }

    pub(crate) fn matched(&self) -> usize {
        self.l2r.iter().filter(|m| m.is_some()).count()
    }

    fn into_mapping(self, left: &Graph, right: &Graph, left_tree: &Containment) -> Mapping {
        let mut mapping = Mapping::new();
        for &l in left_tree.order() {
            let Some(r) = self.right_of(l) else {
                continue;
            };
            if let (Some(ln), Some(rn)) = (left.node_at(l), right.node_at(r)) {
                mapping.insert(ln.id.clone(), rn.id.clone());
            }
        }
        mapping
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Matches the nodes of `left` against the nodes of `right`.
///
/// # Errors
///
/// Returns [`MatchError::Structure`] if either graph has malformed
/// containment, [`MatchError::BudgetExhausted`] if the structural pass runs
/// out of time and [`MatchError::InvalidConfig`] for unusable settings.
pub fn match_graphs(
    left: &Graph,
    right: &Graph,
    config: &MatchConfig,
) -> Result<Mapping, MatchError> {
    let left_tree = Containment::build(left).map_err(|source| MatchError::Structure {
        side: Side::Left,
        source,
    })?;
    let right_tree = Containment::build(right).map_err(|source| MatchError::Structure {
        side: Side::Right,
        source,
    })?;
    match_trees(left, right, &left_tree, &right_tree, config)
}

/// Matches two graphs whose containment trees are already built.
pub(crate) fn match_trees(
    left: &Graph,
    right: &Graph,
    left_tree: &Containment,
    right_tree: &Containment,
    config: &MatchConfig,
) -> Result<Mapping, MatchError> {
    config.validate()?;
    let mut state = MatchState::new(left.node_count(), right.node_count());

    let exact = identity::exact_pass(&mut state, left, right, left_tree, right_tree, config);
    tracing::debug!(pairs = exact, "identity pass complete");

    let structural =
        structural::fallback_pass(&mut state, left, right, left_tree, right_tree, config)?;
    tracing::debug!(
        pairs = structural,
        total = state.matched(),
        "structural pass complete"
    );

    let mapping = state.into_mapping(left, right, left_tree);
    tracing::debug!(
        matched = mapping.len(),
        left_nodes = left.node_count(),
        right_nodes = right.node_count(),
        "matching complete"
    );
    Ok(mapping)
}

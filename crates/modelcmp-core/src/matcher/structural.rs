/// Pass 2: structural similarity matching.
///
/// Work is organised in sibling groups. A group holds the unmatched children
/// of a matched left node and the unmatched children of its right partner
/// (the two roots form a group of their own when Pass 1 left them unmatched).
/// Groups are processed in waves:
///
/// 1. every group of the wave is scored against the mapping as it stood when
///    the wave began;
/// 2. the resulting pairs are merged in group order;
/// 3. each newly matched pair opens a group for the next wave.
///
/// A node belongs to at most one group over the whole pass, so scoring the
/// groups of a wave in parallel cannot change the outcome.
///
/// # Similarity
///
/// Only nodes with equal type tags are compared. The score is the weighted
/// share of agreeing features:
///
/// - each attribute set (non-null) on either node counts once, and agrees when
///   both values are equal;
/// - each cross reference counts once and contributes the share of its
///   already-matched targets that correspond on both sides; a reference with
///   no matched targets on either side is left out;
/// - containment references are left out (children are matched by the groups
///   their parents open).
///
/// Two nodes with nothing to compare score `1.0`.
use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;

use crate::containment::Containment;
use crate::graph::Graph;
use crate::model::Node;

use super::{MatchConfig, MatchError, MatchState};

/// Unmatched siblings under one matched pair.
#[derive(Debug, Clone)]
struct Group {
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Read-only inputs shared by every group of a wave.
struct Scorer<'a> {
    left: &'a Graph,
    right: &'a Graph,
    state: &'a MatchState,
    config: &'a MatchConfig,
}

/// Runs the structural pass, returning the number of pairs it created.
pub(crate) fn fallback_pass(
    state: &mut MatchState,
    left: &Graph,
    right: &Graph,
    left_tree: &Containment,
    right_tree: &Containment,
    config: &MatchConfig,
) -> Result<usize, MatchError> {
    let started = Instant::now();

    let mut groups = Vec::new();
    let (l_root, r_root) = (left.root_index(), right.root_index());
    if state.right_of(l_root).is_none() && state.left_of(r_root).is_none() {
        groups.push(Group {
            left: vec![l_root],
            right: vec![r_root],
        });
    }
    for &l in left_tree.order() {
        if let Some(r) = state.right_of(l) {
            groups.extend(open_group(state, left_tree, right_tree, l, r));
        }
    }

    let mut created = 0;
    let mut wave = 0_usize;
    while !groups.is_empty() {
        if let Some(budget) = config.fallback_budget {
            if started.elapsed() >= budget {
                return Err(MatchError::BudgetExhausted {
                    budget,
                    pending: groups.len(),
                });
            }
        }
        wave += 1;

        let scorer = Scorer {
            left,
            right,
            state: &*state,
            config,
        };
        let results: Vec<Vec<(usize, usize)>> = if config.parallel {
            groups.par_iter().map(|g| scorer.pair_group(g)).collect()
        } else {
            groups.iter().map(|g| scorer.pair_group(g)).collect()
        };

        let mut next = Vec::new();
        let mut wave_pairs = 0;
        for (l, r) in results.into_iter().flatten() {
            if state.pair(l, r) {
                wave_pairs += 1;
                next.extend(open_group(state, left_tree, right_tree, l, r));
            }
        }
        tracing::debug!(
            wave,
            groups = groups.len(),
            pairs = wave_pairs,
            "structural wave scored"
        );
        created += wave_pairs;
        groups = next;
    }
    Ok(created)
}

/// Builds the group of unmatched children under a matched pair, if both
/// sides have any.
fn open_group(
    state: &MatchState,
    left_tree: &Containment,
    right_tree: &Containment,
    l: usize,
    r: usize,
) -> Option<Group> {
    let left: Vec<usize> = left_tree
        .children(l)
        .iter()
        .copied()
        .filter(|&c| state.right_of(c).is_none())
        .collect();
    let right: Vec<usize> = right_tree
        .children(r)
        .iter()
        .copied()
        .filter(|&c| state.left_of(c).is_none())
        .collect();
    (!left.is_empty() && !right.is_empty()).then_some(Group { left, right })
}

impl Scorer<'_> {
    /// Scores every same-type pair of a group and pairs greedily by
    /// descending similarity, ties broken by left then right position.
    fn pair_group(&self, group: &Group) -> Vec<(usize, usize)> {
        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for (li, &l) in group.left.iter().enumerate() {
            let Some(ln) = self.left.node_at(l) else {
                continue;
            };
            for (ri, &r) in group.right.iter().enumerate() {
                let Some(rn) = self.right.node_at(r) else {
                    continue;
                };
                if ln.type_name != rn.type_name {
                    continue;
                }
                let score = self.similarity(ln, rn);
                if score >= self.config.similarity_threshold {
                    candidates.push((score, li, ri));
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut left_used = vec![false; group.left.len()];
        let mut right_used = vec![false; group.right.len()];
        let mut pairs = Vec::new();
        for (_, li, ri) in candidates {
            if left_used[li] || right_used[ri] {
                continue;
            }
            left_used[li] = true;
            right_used[ri] = true;
            pairs.push((group.left[li], group.right[ri]));
        }
        pairs
    }

    /// Similarity of two same-type nodes in `0.0..=1.0`.
    fn similarity(&self, ln: &Node, rn: &Node) -> f64 {
        let config = self.config;
        let mut total = 0.0;
        let mut agreed = 0.0;

        let mut seen: HashSet<&str> = HashSet::new();
        for name in ln.attributes.keys().chain(rn.attributes.keys()) {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let (lv, rv) = (ln.attribute(name), rn.attribute(name));
            if lv.is_null() && rv.is_null() {
                continue;
            }
            total += config.attribute_weight;
            if lv == rv {
                agreed += config.attribute_weight;
            }
        }

        seen.clear();
        for name in ln.references.keys().chain(rn.references.keys()) {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let (lr, rr) = (ln.references.get(name), rn.references.get(name));
            if lr.is_some_and(|r| r.containment) || rr.is_some_and(|r| r.containment) {
                continue;
            }
            let l_targets: Vec<usize> = lr
                .map(|r| r.targets.iter().filter_map(|t| self.left.index_of(t)).collect())
                .unwrap_or_default();
            let r_targets: Vec<usize> = rr
                .map(|r| r.targets.iter().filter_map(|t| self.right.index_of(t)).collect())
                .unwrap_or_default();

            let decided_left: Vec<usize> = l_targets
                .iter()
                .filter_map(|&t| self.state.right_of(t))
                .collect();
            let decided_right = r_targets
                .iter()
                .filter(|&&t| self.state.left_of(t).is_some())
                .count();
            let denominator = decided_left.len().max(decided_right);
            if denominator == 0 {
                continue;
            }
            let corresponding = decided_left
                .iter()
                .filter(|partner| r_targets.contains(partner))
                .count()
                .min(denominator);

            total += config.reference_weight;
            #[allow(clippy::cast_precision_loss)]
            let share = corresponding as f64 / denominator as f64;
            agreed += config.reference_weight * share;
        }

        if total > 0.0 { agreed / total } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::model::{NodeId, Reference, Value};

    fn id(s: &str) -> NodeId {
        NodeId::try_from(s).expect("valid id")
    }

    fn graph(nodes: Vec<Node>) -> Graph {
        let root = nodes.first().map(|n| n.id.clone()).expect("non-empty");
        Graph::new(&root, nodes).expect("valid graph")
    }

    fn score(left: &Graph, right: &Graph, state: &MatchState, l: &str, r: &str) -> f64 {
        let config = MatchConfig::default();
        let scorer = Scorer {
            left,
            right,
            state,
            config: &config,
        };
        scorer.similarity(
            left.node(l).expect("left node"),
            right.node(r).expect("right node"),
        )
    }

    #[test]
    fn featureless_nodes_score_one() {
        let g = graph(vec![Node::new(id("a"), "T")]);
        let state = MatchState::new(1, 1);
        assert!((score(&g, &g, &state, "a", "a") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attributes_count_when_set_on_either_side() {
        let left = graph(vec![
            Node::new(id("a"), "T")
                .with_attribute("x", 1_i64)
                .with_attribute("y", 2_i64)
                .with_attribute("z", Value::Null),
        ]);
        let right = graph(vec![
            Node::new(id("b"), "T")
                .with_attribute("x", 1_i64)
                .with_attribute("w", 5_i64),
        ]);
        let state = MatchState::new(1, 1);
        // x agrees; y and w disagree; z is null on both sides.
        let s = score(&left, &right, &state, "a", "b");
        assert!((s - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn cross_references_count_only_matched_targets() {
        let left = graph(vec![
            Node::new(id("a"), "T")
                .with_reference("kids", Reference::containment([id("t1"), id("t2")]))
                .with_reference("link", Reference::cross([id("t1"), id("t2")])),
            Node::new(id("t1"), "U"),
            Node::new(id("t2"), "U"),
        ]);
        let right = graph(vec![
            Node::new(id("b"), "T")
                .with_reference("kids", Reference::containment([id("u1"), id("u2")]))
                .with_reference("link", Reference::cross([id("u1")])),
            Node::new(id("u1"), "U"),
            Node::new(id("u2"), "U"),
        ]);

        let mut state = MatchState::new(3, 3);
        // Nothing decided yet: the reference is left out entirely.
        assert!((score(&left, &right, &state, "a", "b") - 1.0).abs() < f64::EPSILON);

        assert!(state.pair(1, 1));
        assert!(state.pair(2, 2));
        // left decided {t1,t2}, right decided {u1}; one corresponds out of two.
        assert!((score(&left, &right, &state, "a", "b") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn repeated_targets_do_not_lower_self_similarity() {
        let g = graph(vec![
            Node::new(id("a"), "T")
                .with_reference("kids", Reference::containment([id("t")]))
                .with_reference("link", Reference::cross([id("t"), id("t")])),
            Node::new(id("t"), "U"),
        ]);
        let mut state = MatchState::new(2, 2);
        assert!(state.pair(1, 1));
        assert!((score(&g, &g, &state, "a", "a") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn greedy_selection_prefers_higher_scores() {
        let left = graph(vec![
            Node::new(id("p"), "P")
                .with_reference("k", Reference::containment([id("l1"), id("l2")])),
            Node::new(id("l1"), "C")
                .with_attribute("a", 1_i64)
                .with_attribute("b", 2_i64),
            Node::new(id("l2"), "C")
                .with_attribute("a", 9_i64)
                .with_attribute("b", 9_i64),
        ]);
        let right = graph(vec![
            Node::new(id("q"), "P")
                .with_reference("k", Reference::containment([id("r1"), id("r2")])),
            Node::new(id("r1"), "C")
                .with_attribute("a", 9_i64)
                .with_attribute("b", 9_i64),
            Node::new(id("r2"), "C")
                .with_attribute("a", 1_i64)
                .with_attribute("b", 2_i64),
        ]);
        let config = MatchConfig::default();
        let state = MatchState::new(3, 3);
        let scorer = Scorer {
            left: &left,
            right: &right,
            state: &state,
            config: &config,
        };
        let pairs = scorer.pair_group(&Group {
            left: vec![1, 2],
            right: vec![1, 2],
        });
        assert_eq!(pairs, vec![(1, 2), (2, 1)]);
    }
}

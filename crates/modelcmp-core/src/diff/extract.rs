use std::collections::HashSet;

use crate::containment::{Containment, StructureError};
use crate::graph::Graph;
use crate::matcher::{MatchState, Mapping};
use crate::model::{Node, Reference, Side};

use super::types::{Difference, NodeRef, Subject};

/// Errors that abort difference extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The mapping names a node its graph does not contain.
    #[error("mapping names {side} node {id:?}, which is not in the {side} model")]
    UnknownNode {
        /// Graph the id was looked up in.
        side: Side,
        /// The unknown id.
        id: String,
    },
    /// One of the graphs violates a containment invariant.
    #[error("{side} model has malformed containment: {source}")]
    Structure {
        /// Graph with the malformed containment.
        side: Side,
        /// The violated invariant.
        #[source]
        source: StructureError,
    },
}

/// Computes the differences between `left` and `right` under `mapping`.
///
/// # Errors
///
/// Returns [`ExtractionError::Structure`] if either graph has malformed
/// containment and [`ExtractionError::UnknownNode`] if the mapping names a
/// node that is missing from its graph.
pub fn extract(
    left: &Graph,
    right: &Graph,
    mapping: &Mapping,
) -> Result<Vec<Difference>, ExtractionError> {
    let left_tree = Containment::build(left).map_err(|source| ExtractionError::Structure {
        side: Side::Left,
        source,
    })?;
    let right_tree = Containment::build(right).map_err(|source| ExtractionError::Structure {
        side: Side::Right,
        source,
    })?;
    extract_trees(left, right, &left_tree, &right_tree, mapping)
}

/// Extraction over prebuilt containment trees.
pub(crate) fn extract_trees(
    left: &Graph,
    right: &Graph,
    left_tree: &Containment,
    right_tree: &Containment,
    mapping: &Mapping,
) -> Result<Vec<Difference>, ExtractionError> {
    let mut state = MatchState::new(left.node_count(), right.node_count());
    for (l, r) in mapping.pairs() {
        let li = left.index_of(l).ok_or_else(|| ExtractionError::UnknownNode {
            side: Side::Left,
            id: l.to_string(),
        })?;
        let ri = right.index_of(r).ok_or_else(|| ExtractionError::UnknownNode {
            side: Side::Right,
            id: r.to_string(),
        })?;
        state.pair(li, ri);
    }

    let mut extractor = Extractor {
        left,
        right,
        left_tree,
        right_tree,
        state,
        out: Vec::new(),
    };
    extractor.run();
    tracing::debug!(differences = extractor.out.len(), "extraction complete");
    Ok(extractor.out)
}

struct Extractor<'a> {
    left: &'a Graph,
    right: &'a Graph,
    left_tree: &'a Containment,
    right_tree: &'a Containment,
    state: MatchState,
    out: Vec<Difference>,
}

impl Extractor<'_> {
    fn run(&mut self) {
        let (left, right) = (self.left, self.right);
        let (left_tree, right_tree) = (self.left_tree, self.right_tree);

        for &l in left_tree.order() {
            let Some(node) = left.node_at(l) else {
                continue;
            };
            match self.state.right_of(l) {
                None => self.out.push(Difference::NodeDelete {
                    subject: Subject::left(node),
                    parent: container(left, left_tree, l),
                    feature: left_tree.feature_name(left, l).map(str::to_owned),
                }),
                Some(r) => {
                    if let Some(partner) = right.node_at(r) {
                        self.compare_pair(l, node, r, partner);
                    }
                }
            }
        }

        for &r in right_tree.order() {
            if self.state.left_of(r).is_some() {
                continue;
            }
            let Some(node) = right.node_at(r) else {
                continue;
            };
            self.out.push(Difference::NodeAdd {
                subject: Subject::right(node),
                parent: container(right, right_tree, r),
                feature: right_tree.feature_name(right, r).map(str::to_owned),
            });
        }
    }

    fn compare_pair(&mut self, l: usize, ln: &Node, r: usize, rn: &Node) {
        self.check_move(l, ln, r, rn);

        for name in feature_names(ln.attributes.keys(), rn.attributes.keys()) {
            let (old, new) = (ln.attribute(name), rn.attribute(name));
            if old != new {
                self.out.push(Difference::AttributeChange {
                    subject: Subject::both(ln, rn),
                    feature: name.to_owned(),
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }

        let names = feature_names(ln.references.keys(), rn.references.keys());
        let is_containment = |name: &str| -> bool {
            ln.references
                .get(name)
                .or_else(|| rn.references.get(name))
                .is_some_and(|reference| reference.containment)
        };
        let (containment, cross): (Vec<&str>, Vec<&str>) =
            names.into_iter().partition(|&name| is_containment(name));
        for (name, contains) in containment
            .into_iter()
            .map(|n| (n, true))
            .chain(cross.into_iter().map(|n| (n, false)))
        {
            self.compare_reference(
                ln,
                rn,
                name,
                ln.references.get(name),
                rn.references.get(name),
                contains,
            );
        }
    }

    fn check_move(&mut self, l: usize, ln: &Node, r: usize, rn: &Node) {
        let (left, right) = (self.left, self.right);
        let old_feature = self.left_tree.feature_name(left, l);
        let new_feature = self.right_tree.feature_name(right, r);
        let moved = match (self.left_tree.parent(l), self.right_tree.parent(r)) {
            (Some(lp), Some(rp)) => {
                self.state.right_of(lp) != Some(rp) || old_feature != new_feature
            }
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
        };
        if moved {
            self.out.push(Difference::NodeMove {
                subject: Subject::both(ln, rn),
                old_parent: container(left, self.left_tree, l),
                new_parent: container(right, self.right_tree, r),
                old_feature: old_feature.map(str::to_owned),
                new_feature: new_feature.map(str::to_owned),
            });
        }
    }

    /// Emits adds, then removes, then at most one order change for one
    /// reference feature of a matched pair.
    fn compare_reference(
        &mut self,
        ln: &Node,
        rn: &Node,
        name: &str,
        lref: Option<&Reference>,
        rref: Option<&Reference>,
        containment: bool,
    ) {
        let l_targets = resolve(self.left, lref);
        let r_targets = resolve(self.right, rref);
        let l_set: HashSet<usize> = l_targets.iter().copied().collect();
        let r_set: HashSet<usize> = r_targets.iter().copied().collect();

        for &t in &r_targets {
            let partner = self.state.left_of(t);
            if partner.is_some_and(|p| l_set.contains(&p)) {
                continue;
            }
            // A matched child that left another container is a move.
            if containment && partner.is_some() {
                continue;
            }
            if let Some(target) = self.right.node_at(t) {
                self.out.push(Difference::ReferenceAdd {
                    subject: Subject::both(ln, rn),
                    feature: name.to_owned(),
                    target: NodeRef::from_node(target),
                });
            }
        }

        for &t in &l_targets {
            let partner = self.state.right_of(t);
            if partner.is_some_and(|p| r_set.contains(&p)) {
                continue;
            }
            if containment && partner.is_some() {
                continue;
            }
            if let Some(target) = self.left.node_at(t) {
                self.out.push(Difference::ReferenceRemove {
                    subject: Subject::both(ln, rn),
                    feature: name.to_owned(),
                    target: NodeRef::from_node(target),
                });
            }
        }

        let (Some(lref), Some(rref)) = (lref, rref) else {
            return;
        };
        if !(lref.ordered && rref.ordered) {
            return;
        }

        // Common targets, each side in its own order, compared as right indices.
        let common_left: Vec<(usize, usize)> = l_targets
            .iter()
            .filter_map(|&t| {
                self.state
                    .right_of(t)
                    .filter(|p| r_set.contains(p))
                    .map(|p| (t, p))
            })
            .collect();
        let common_right: Vec<usize> = r_targets
            .iter()
            .copied()
            .filter(|&t| self.state.left_of(t).is_some_and(|p| l_set.contains(&p)))
            .collect();
        let as_right: Vec<usize> = common_left.iter().map(|&(_, p)| p).collect();
        if as_right == common_right {
            return;
        }

        let old = common_left
            .iter()
            .filter_map(|&(t, _)| self.left.node_at(t).map(|n| n.id.clone()))
            .collect();
        let new = common_right
            .iter()
            .filter_map(|&t| self.right.node_at(t).map(|n| n.id.clone()))
            .collect();
        self.out.push(Difference::ReferenceOrderChange {
            subject: Subject::both(ln, rn),
            feature: name.to_owned(),
            old,
            new,
        });
    }
}

/// Names in left declaration order followed by right-only names.
fn feature_names<'n>(
    left: impl Iterator<Item = &'n String>,
    right: impl Iterator<Item = &'n String>,
) -> Vec<&'n str> {
    let mut seen = HashSet::new();
    left.chain(right)
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Positional indices of a reference's targets, first occurrence only.
fn resolve(graph: &Graph, reference: Option<&Reference>) -> Vec<usize> {
    let mut seen = HashSet::new();
    reference
        .map(|r| {
            r.targets
                .iter()
                .filter_map(|t| graph.index_of(t))
                .filter(|&i| seen.insert(i))
                .collect()
        })
        .unwrap_or_default()
}

fn container(graph: &Graph, tree: &Containment, index: usize) -> Option<NodeRef> {
    tree.parent(index)
        .and_then(|p| graph.node_at(p))
        .map(NodeRef::from_node)
}

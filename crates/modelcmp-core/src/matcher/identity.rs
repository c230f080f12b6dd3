/// Pass 1: exact identity matching.
///
/// A node's identity is the value of the first configured identity key that
/// the node carries with a non-null value. Right nodes are indexed by
/// `(type tag, key, value)`; left nodes are then visited in containment
/// depth-first order and take the best unmatched right candidate:
///
/// - a candidate whose parent is already paired with the left node's parent;
/// - otherwise the first candidate in right depth-first order.
use std::collections::HashMap;

use crate::containment::Containment;
use crate::graph::Graph;
use crate::model::{Node, Value};

use super::{MatchConfig, MatchState};

/// Identity of a node: the key that supplied it and its value.
pub fn identity_of<'n>(node: &'n Node, keys: &[String]) -> Option<(&'n str, &'n Value)> {
    keys.iter().find_map(|key| {
        node.attributes
            .get_key_value(key.as_str())
            .filter(|(_, value)| !value.is_null())
            .map(|(k, v)| (k.as_str(), v))
    })
}

type IdentityKey<'g> = (&'g str, &'g str, &'g Value);

/// Runs the identity pass, returning the number of pairs it created.
pub(crate) fn exact_pass(
    state: &mut MatchState,
    left: &Graph,
    right: &Graph,
    left_tree: &Containment,
    right_tree: &Containment,
    config: &MatchConfig,
) -> usize {
    if config.identity_keys.is_empty() {
        return 0;
    }

    let mut index: HashMap<IdentityKey<'_>, Vec<usize>> = HashMap::new();
    for &r in right_tree.order() {
        let Some(node) = right.node_at(r) else {
            continue;
        };
        if let Some((key, value)) = identity_of(node, &config.identity_keys) {
            index
                .entry((node.type_name.as_str(), key, value))
                .or_default()
                .push(r);
        }
    }

    let mut created = 0;
    for &l in left_tree.order() {
        let Some(node) = left.node_at(l) else {
            continue;
        };
        let Some((key, value)) = identity_of(node, &config.identity_keys) else {
            continue;
        };
        let Some(candidates) = index.get(&(node.type_name.as_str(), key, value)) else {
            continue;
        };

        let expected_parent = left_tree.parent(l).and_then(|p| state.right_of(p));
        let mut unmatched = candidates
            .iter()
            .copied()
            .filter(|&r| state.left_of(r).is_none());
        let chosen = match expected_parent {
            Some(parent) => {
                let first = unmatched.next();
                first
                    .into_iter()
                    .chain(unmatched)
                    .find(|&r| right_tree.parent(r) == Some(parent))
                    .or(first)
            }
            None => unmatched.next(),
        };

        if let Some(r) = chosen {
            if state.pair(l, r) {
                created += 1;
            }
        }
    }
    created
}

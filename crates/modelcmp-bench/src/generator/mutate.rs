//! Deterministic edits of a generated model.
//!
//! Produces the "right" side of a benchmark comparison from a generated
//! model. Every edit keeps the graph valid: only features are deleted or
//! moved, and nothing references a feature.

use std::collections::{HashMap, HashSet};

use modelcmp_core::{Graph, Node, NodeId, Reference, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::GenerateError;

/// Probabilities of each edit, applied per class or per feature.
#[derive(Debug, Clone)]
pub struct MutationConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Classes whose `name` changes.
    pub rename_fraction: f64,
    /// Features whose `upper` bound changes.
    pub value_fraction: f64,
    /// Features removed from the model.
    pub delete_fraction: f64,
    /// Classes that gain one new feature.
    pub add_fraction: f64,
    /// Features moved into another class.
    pub move_fraction: f64,
    /// Classes whose feature order is reversed.
    pub reorder_fraction: f64,
}

impl MutationConfig {
    /// A light mix of every edit kind.
    pub fn light(seed: u64) -> Self {
        Self {
            seed,
            rename_fraction: 0.05,
            value_fraction: 0.05,
            delete_fraction: 0.02,
            add_fraction: 0.05,
            move_fraction: 0.02,
            reorder_fraction: 0.05,
        }
    }

    /// No edits at all.
    pub fn none(seed: u64) -> Self {
        Self {
            seed,
            rename_fraction: 0.0,
            value_fraction: 0.0,
            delete_fraction: 0.0,
            add_fraction: 0.0,
            move_fraction: 0.0,
            reorder_fraction: 0.0,
        }
    }
}

fn chance(rng: &mut StdRng, p: f64) -> bool {
    rng.gen_bool(p.clamp(0.0, 1.0))
}

fn features_of(node: &mut Node) -> Option<&mut Vec<NodeId>> {
    node.references.get_mut("features").map(|r| &mut r.targets)
}

/// Returns an edited copy of `graph`.
///
/// # Errors
///
/// Returns [`GenerateError`] only if the edited nodes are inconsistent,
/// which indicates a mutator bug.
pub fn mutate(graph: &Graph, config: &MutationConfig) -> Result<Graph, GenerateError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut nodes: Vec<Node> = graph.nodes().cloned().collect();
    let index: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();
    let classes: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.type_name == "Class")
        .map(|(i, _)| i)
        .collect();

    let mut removed: HashSet<NodeId> = HashSet::new();
    let mut added: Vec<Node> = Vec::new();

    for (k, &class) in classes.iter().enumerate() {
        if chance(&mut rng, config.rename_fraction) {
            nodes[class]
                .attributes
                .insert("name".to_owned(), Value::from(format!("Renamed{k}")));
        }

        let owned: Vec<NodeId> = features_of(&mut nodes[class]).cloned().unwrap_or_default();
        for feature in owned {
            let Some(&f) = index.get(&feature) else {
                continue;
            };
            if chance(&mut rng, config.value_fraction) {
                nodes[f]
                    .attributes
                    .insert("upper".to_owned(), Value::Integer(rng.gen_range(10..20)));
            }
            if chance(&mut rng, config.delete_fraction) {
                if let Some(targets) = features_of(&mut nodes[class]) {
                    targets.retain(|t| *t != feature);
                }
                removed.insert(feature);
            } else if classes.len() > 1 && chance(&mut rng, config.move_fraction) {
                let other = classes[(k + rng.gen_range(1..classes.len())) % classes.len()];
                if let Some(targets) = features_of(&mut nodes[class]) {
                    targets.retain(|t| *t != feature);
                }
                if let Some(targets) = features_of(&mut nodes[other]) {
                    targets.push(feature);
                }
            }
        }

        if chance(&mut rng, config.add_fraction) {
            let id = NodeId::try_from(format!("new{k}"))?;
            let target = nodes[classes[rng.gen_range(0..classes.len())]].id.clone();
            added.push(
                Node::new(id.clone(), "Feature")
                    .with_attribute("name", format!("added{k}"))
                    .with_attribute("lower", 0_i64)
                    .with_attribute("upper", 1_i64)
                    .with_reference("type", Reference::cross([target])),
            );
            match features_of(&mut nodes[class]) {
                Some(targets) => targets.push(id),
                None => {
                    nodes[class] = nodes[class]
                        .clone()
                        .with_reference("features", Reference::containment([id]));
                }
            }
        }

        if chance(&mut rng, config.reorder_fraction) {
            if let Some(targets) = features_of(&mut nodes[class]) {
                targets.reverse();
            }
        }
    }

    nodes.retain(|n| !removed.contains(&n.id));
    nodes.extend(added);
    Ok(Graph::new(graph.root(), nodes)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use modelcmp_core::{DifferenceCategory, compare};

    use super::*;
    use crate::generator::{SizeTier, generate_model};

    #[test]
    fn no_edits_yield_identical_model() {
        let base = generate_model(&SizeTier::Small.config(5)).expect("generate");
        let copy = mutate(&base, &MutationConfig::none(9)).expect("mutate");
        assert!(compare(&base, &copy).expect("compare").is_empty());
    }

    #[test]
    fn deleting_everything_leaves_empty_classes() {
        let base = generate_model(&SizeTier::Small.config(5)).expect("generate");
        let config = MutationConfig {
            delete_fraction: 1.0,
            ..MutationConfig::none(1)
        };
        let edited = mutate(&base, &config).expect("mutate");
        assert!(edited.nodes().all(|n| n.type_name != "Feature"));

        let result = compare(&base, &edited).expect("compare");
        let deletes = result.of_category(DifferenceCategory::NodeDelete).len();
        assert_eq!(deletes, base.node_count() - edited.node_count());
    }

    #[test]
    fn added_features_are_reported() {
        let base = generate_model(&SizeTier::Small.config(5)).expect("generate");
        let config = MutationConfig {
            add_fraction: 1.0,
            ..MutationConfig::none(1)
        };
        let edited = mutate(&base, &config).expect("mutate");
        let result = compare(&base, &edited).expect("compare");
        let adds = result.of_category(DifferenceCategory::NodeAdd).len();
        assert_eq!(adds, edited.node_count() - base.node_count());
    }
}

//! Class-model generator.
//!
//! Produces valid [`Graph`] instances shaped like a package/class/feature
//! model: a `Model` root contains `Package`s, packages contain `Class`es,
//! classes contain `Feature`s. Classes point at earlier classes through
//! `supertypes` and every feature points at a class through `type`.
//! Feature names repeat across classes, so identity matching has to lean
//! on the parent; a configurable share of classes has no name at all,
//! which forces the structural pass.

pub mod mutate;

use modelcmp_core::{Graph, Node, NodeId, NodeIdError, Reference};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Failure to assemble a generated model.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A generated identifier was rejected.
    #[error(transparent)]
    Id(#[from] NodeIdError),
    /// The generated nodes do not form a valid graph.
    #[error(transparent)]
    Graph(#[from] modelcmp_core::GraphError),
}

/// Configuration for the model generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Number of packages under the root.
    pub packages: usize,
    /// Number of classes per package.
    pub classes_per_package: usize,
    /// Number of features per class.
    pub features_per_class: usize,
    /// Probability that a class has a supertype (0.0-1.0).
    pub supertype_density: f64,
    /// Fraction of classes generated without a name (0.0-1.0).
    pub unnamed_fraction: f64,
}

/// Predefined size tiers for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// ~80 nodes
    Small,
    /// ~1200 nodes
    Medium,
    /// ~7000 nodes
    Large,
    /// ~22000 nodes
    XLarge,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        let (packages, classes_per_package, features_per_class) = match self {
            SizeTier::Small => (3, 5, 4),
            SizeTier::Medium => (10, 20, 5),
            SizeTier::Large => (20, 50, 6),
            SizeTier::XLarge => (40, 60, 8),
        };
        GeneratorConfig {
            seed,
            packages,
            classes_per_package,
            features_per_class,
            supertype_density: 0.4,
            unnamed_fraction: 0.1,
        }
    }
}

/// Approximate node count of a generated model.
pub fn expected_nodes(config: &GeneratorConfig) -> usize {
    let classes = config.packages * config.classes_per_package;
    1 + config.packages + classes + classes * config.features_per_class
}

/// Generates a model from the given configuration.
///
/// All randomness is deterministic, seeded from `config.seed`.
///
/// # Errors
///
/// Returns [`GenerateError`] only if the assembled nodes are inconsistent,
/// which indicates a generator bug.
pub fn generate_model(config: &GeneratorConfig) -> Result<Graph, GenerateError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let root_id = NodeId::try_from("model")?;
    let class_count = config.packages * config.classes_per_package;
    let class_ids = (0..class_count)
        .map(|c| NodeId::try_from(format!("c{c}")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut nodes = Vec::with_capacity(expected_nodes(config));
    let mut package_ids = Vec::with_capacity(config.packages);
    let mut packages = Vec::with_capacity(config.packages);

    for p in 0..config.packages {
        let package_id = NodeId::try_from(format!("p{p}"))?;
        let first = p * config.classes_per_package;
        let members = class_ids[first..first + config.classes_per_package].to_vec();
        packages.push(
            Node::new(package_id.clone(), "Package")
                .with_attribute("name", format!("pkg{p}"))
                .with_reference("classes", Reference::containment(members)),
        );
        package_ids.push(package_id);
    }

    nodes.push(
        Node::new(root_id.clone(), "Model")
            .with_attribute("name", "Model")
            .with_reference("packages", Reference::containment(package_ids)),
    );
    nodes.extend(packages);

    for (c, class_id) in class_ids.iter().enumerate() {
        let feature_ids = (0..config.features_per_class)
            .map(|f| NodeId::try_from(format!("c{c}f{f}")))
            .collect::<Result<Vec<_>, _>>()?;

        let mut class = Node::new(class_id.clone(), "Class")
            .with_attribute("abstract", rng.gen_bool(0.2));
        if !rng.gen_bool(config.unnamed_fraction.clamp(0.0, 1.0)) {
            class = class.with_attribute("name", format!("Class{c}"));
        }
        if c > 0 && rng.gen_bool(config.supertype_density.clamp(0.0, 1.0)) {
            let parent = class_ids[rng.gen_range(0..c)].clone();
            class = class.with_reference("supertypes", Reference::cross([parent]));
        }
        nodes.push(class.with_reference("features", Reference::containment(feature_ids.clone())));

        for (f, feature_id) in feature_ids.into_iter().enumerate() {
            let target = class_ids[rng.gen_range(0..class_count)].clone();
            nodes.push(
                Node::new(feature_id, "Feature")
                    .with_attribute("name", format!("feature{f}"))
                    .with_attribute("lower", rng.gen_range(0..2_i64))
                    .with_attribute("upper", rng.gen_range(1..10_i64))
                    .with_reference("type", Reference::cross([target])),
            );
        }
    }

    Ok(Graph::new(&root_id, nodes)?)
}

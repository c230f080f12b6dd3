//! Model generator and benchmark utilities for modelcmp.
//!
//! This crate provides deterministic generation of class-like models and
//! edited copies of them for benchmarking and testing `modelcmp-core`.

pub mod generator;

pub use generator::mutate::{MutationConfig, mutate};
pub use generator::{GenerateError, GeneratorConfig, SizeTier, expected_nodes, generate_model};

use modelcmp_core::{Graph, ModelDocument};

/// Serializes a graph to the JSON document format read by `parse_model`.
///
/// # Errors
///
/// Returns the serializer's error; generated models always serialize.
pub fn to_json(graph: &Graph) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ModelDocument::from(graph))
}

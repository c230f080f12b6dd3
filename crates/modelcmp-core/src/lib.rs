#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod containment;
pub mod diff;
pub mod graph;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod report;
pub mod result;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use containment::{Containment, ParentLink, StructureError};
pub use diff::{
    Difference, DifferenceCategory, DifferenceKind, ExtractionError, NodeRef, Observed, Subject,
    extract,
};
pub use graph::{Graph, GraphError};
pub use loader::{LoadError, ModelDocument, parse_model};
pub use matcher::{
    DEFAULT_IDENTITY_KEYS, DEFAULT_SIMILARITY_THRESHOLD, Mapping, MatchConfig, MatchError,
    match_graphs,
};
pub use model::{Node, NodeId, NodeIdError, Reference, Side, Value};
pub use report::{ReportFormat, ReportOptions, format, format_json, render};
pub use result::{
    CompareError, ComparisonResult, DiffFilter, DiffSummary, compare, compare_with_config,
};

/// Returns the current version of the modelcmp-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}

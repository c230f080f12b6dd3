//! Implementation of `modelcmp inspect <file>`.
//!
//! Parses a model and prints summary statistics to stdout:
//! - root node id and type
//! - node count by type
//! - containment and cross reference link counts
//! - link count by feature name
//! - containment depth, or the reason containment is malformed
//!
//! In `--format json` mode a single JSON object is emitted to stdout.
//!
//! Exit codes: 0 = success, 2 = read or parse failure.
use std::collections::BTreeMap;

use modelcmp_core::{Containment, Graph};

use crate::OutputFormat;
use crate::PathOrStdin;
use crate::error::CliError;
use crate::io::load_model;

/// Statistics gathered from a parsed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectStats {
    /// Root node id.
    pub root_id: String,
    /// Root node type tag.
    pub root_type: String,
    /// Total number of nodes.
    pub node_count: usize,
    /// Node count grouped by type tag.
    pub node_counts: BTreeMap<String, usize>,
    /// Number of containment links (parent to child).
    pub containment_links: usize,
    /// Number of non-containment links.
    pub cross_links: usize,
    /// Link count grouped by reference feature name.
    pub feature_counts: BTreeMap<String, usize>,
    /// Containment depth of the deepest node (root is 0), or the structure
    /// error when containment is malformed.
    pub depth: Result<usize, String>,
}

impl InspectStats {
    /// Computes statistics from a parsed graph.
    pub fn from_graph(graph: &Graph) -> Self {
        let mut node_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut feature_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut containment_links = 0;
        let mut cross_links = 0;

        for node in graph.nodes() {
            *node_counts.entry(node.type_name.clone()).or_insert(0) += 1;
            for (feature, reference) in &node.references {
                let links = reference.targets.len();
                *feature_counts.entry(feature.clone()).or_insert(0) += links;
                if reference.containment {
                    containment_links += links;
                } else {
                    cross_links += links;
                }
            }
        }

        let root = graph.root_node();
        Self {
            root_id: root.id.to_string(),
            root_type: root.type_name.clone(),
            node_count: graph.node_count(),
            node_counts,
            containment_links,
            cross_links,
            feature_counts,
            depth: containment_depth(graph),
        }
    }
}

fn containment_depth(graph: &Graph) -> Result<usize, String> {
    let tree = Containment::build(graph).map_err(|e| e.to_string())?;
    let mut depths = vec![0usize; graph.node_count()];
    let mut deepest = 0;
    for &idx in tree.order() {
        if let Some(parent) = tree.parent(idx) {
            depths[idx] = depths[parent] + 1;
            deepest = deepest.max(depths[idx]);
        }
    }
    Ok(deepest)
}

/// Runs the `inspect` command.
///
/// # Errors
///
/// Returns [`CliError`] with exit code 2 if the model cannot be read or
/// parsed.
pub fn run(source: &PathOrStdin, format: OutputFormat, max_size: u64) -> Result<(), CliError> {
    let graph = load_model(source, max_size)?;
    let stats = InspectStats::from_graph(&graph);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Human => print_human(&mut out, &stats),
        OutputFormat::Json => print_json(&mut out, &stats),
    }
    .map_err(|e| CliError::IoError {
        source: "stdout".to_owned(),
        detail: e.to_string(),
    })
}

/// Writes inspect statistics in human-readable aligned format.
fn print_human<W: std::io::Write>(w: &mut W, stats: &InspectStats) -> std::io::Result<()> {
    writeln!(w, "root:           {} ({})", stats.root_id, stats.root_type)?;
    writeln!(w, "nodes:          {}", stats.node_count)?;
    for (type_name, count) in &stats.node_counts {
        writeln!(w, "  {type_name}: {count}")?;
    }
    writeln!(w, "containment:    {}", stats.containment_links)?;
    writeln!(w, "cross links:    {}", stats.cross_links)?;
    for (feature, count) in &stats.feature_counts {
        writeln!(w, "  {feature}: {count}")?;
    }
    match &stats.depth {
        Ok(depth) => writeln!(w, "depth:          {depth}"),
        Err(reason) => writeln!(w, "structure:      {reason}"),
    }
}

/// Writes inspect statistics as a single JSON object to stdout.
fn print_json<W: std::io::Write>(w: &mut W, stats: &InspectStats) -> std::io::Result<()> {
    let counts = |map: &BTreeMap<String, usize>| -> serde_json::Value {
        map.iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(*v)))
            .collect::<serde_json::Map<_, _>>()
            .into()
    };

    let mut obj = serde_json::Map::new();
    obj.insert("root".to_owned(), stats.root_id.clone().into());
    obj.insert("root_type".to_owned(), stats.root_type.clone().into());
    obj.insert("node_count".to_owned(), stats.node_count.into());
    obj.insert("node_counts".to_owned(), counts(&stats.node_counts));
    obj.insert(
        "containment_links".to_owned(),
        stats.containment_links.into(),
    );
    obj.insert("cross_links".to_owned(), stats.cross_links.into());
    obj.insert("feature_counts".to_owned(), counts(&stats.feature_counts));
    match &stats.depth {
        Ok(depth) => obj.insert("depth".to_owned(), (*depth).into()),
        Err(reason) => obj.insert("structure_error".to_owned(), reason.clone().into()),
    };

    let json = serde_json::to_string_pretty(&serde_json::Value::Object(obj))
        .map_err(std::io::Error::other)?;
    writeln!(w, "{json}")
}

/// JSON model documents.
///
/// A document lists nodes flat and names the root explicitly (or implicitly:
/// the first node is the root when `root` is omitted):
///
/// ```json
/// { "root": "lib",
///   "nodes": [
///     { "id": "lib", "type": "Library",
///       "references": { "books": { "containment": true, "targets": ["b1"] } } },
///     { "id": "b1", "type": "Book", "attributes": { "name": "X" } } ] }
/// ```
///
/// Parsing is pure; reading files is the caller's business.
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, GraphError};
use crate::model::{Node, NodeId};

/// Errors produced while turning document text into a [`Graph`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The text is not a well-formed model document.
    #[error("malformed model document: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The document contains no nodes.
    #[error("model document contains no nodes")]
    Empty,
    /// The nodes do not form a valid graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Serialized form of a [`Graph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    /// Root node id; defaults to the first node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeId>,
    /// All nodes of the model.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl ModelDocument {
    /// Converts the document into a validated [`Graph`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Empty`] for a document without nodes and
    /// [`LoadError::Graph`] when graph construction fails.
    pub fn into_graph(self) -> Result<Graph, LoadError> {
        let root = match self.root {
            Some(root) => root,
            None => self
                .nodes
                .first()
                .map(|n| n.id.clone())
                .ok_or(LoadError::Empty)?,
        };
        if self.nodes.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(Graph::new(&root, self.nodes)?)
    }
}

impl From<&Graph> for ModelDocument {
    fn from(graph: &Graph) -> Self {
        Self {
            root: Some(graph.root().clone()),
            nodes: graph.nodes().cloned().collect(),
        }
    }
}

/// Parses a JSON model document into a [`Graph`].
///
/// # Errors
///
/// Returns [`LoadError`] if the text is malformed, empty or describes an
/// invalid graph.
pub fn parse_model(text: &str) -> Result<Graph, LoadError> {
    let document: ModelDocument = serde_json::from_str(text)?;
    let graph = document.into_graph()?;
    tracing::debug!(
        root = %graph.root(),
        nodes = graph.node_count(),
        "parsed model document"
    );
    Ok(graph)
}

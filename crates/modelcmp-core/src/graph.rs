/// The object graph: an arena of [`Node`]s keyed by [`NodeId`] with one
/// distinguished root.
///
/// # Construction
///
/// [`Graph::new`] runs two passes over the supplied nodes:
/// 1. **Node pass** inserts every node into the arena, failing on duplicate ids.
/// 2. **Reference pass** checks that the root and every reference target
///    resolve to a node in the arena.
///
/// Containment invariants (single parent, acyclic, reachable from root) are
/// validated separately by [`crate::containment::Containment::build`], so a
/// graph with malformed containment can still be loaded and inspected.
use indexmap::IndexMap;

use crate::model::{Node, NodeId};

/// Errors that can occur while assembling a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two nodes share the same identifier.
    #[error("duplicate node id {0:?}")]
    DuplicateNodeId(String),
    /// The declared root is not among the nodes.
    #[error("root {0:?} does not name a node")]
    UnknownRoot(String),
    /// A reference names a target that is not among the nodes.
    #[error("node {node:?} reference {feature:?} targets unknown node {target:?}")]
    DanglingReference {
        /// Referencing node.
        node: String,
        /// Reference name.
        feature: String,
        /// The unresolved target id.
        target: String,
    },
}

/// A rooted, potentially cyclic graph of attributed nodes.
///
/// Node order is the order the nodes were supplied in; positional indices
/// (`0..node_count()`) are stable for the graph's lifetime and are used by
/// the matcher and the containment index as cheap handles.
#[derive(Debug, Clone)]
pub struct Graph {
    root: usize,
    nodes: IndexMap<NodeId, Node>,
}

impl Graph {
    /// Builds a graph from its root id and node list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on duplicate ids, an unknown root or a
    /// dangling reference target.
    pub fn new(root: &NodeId, nodes: impl IntoIterator<Item = Node>) -> Result<Self, GraphError> {
        let mut arena: IndexMap<NodeId, Node> = IndexMap::new();
        for node in nodes {
            if arena.contains_key(&node.id) {
                return Err(GraphError::DuplicateNodeId(node.id.to_string()));
            }
            arena.insert(node.id.clone(), node);
        }

        let Some(root_index) = arena.get_index_of(root) else {
            return Err(GraphError::UnknownRoot(root.to_string()));
        };

        for node in arena.values() {
            for (feature, reference) in &node.references {
                if let Some(missing) = reference.targets.iter().find(|t| !arena.contains_key(*t)) {
                    return Err(GraphError::DanglingReference {
                        node: node.id.to_string(),
                        feature: feature.clone(),
                        target: missing.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            root: root_index,
            nodes: arena,
        })
    }

    /// Identifier of the root node.
    pub fn root(&self) -> &NodeId {
        &self.root_node().id
    }

    /// The root node.
    pub fn root_node(&self) -> &Node {
        // root index is validated in `new` and the arena is never mutated.
        &self.nodes[self.root]
    }

    /// Positional index of the root node.
    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Positional index of the node with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Node at a positional index.
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns `true` if a node with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }
}

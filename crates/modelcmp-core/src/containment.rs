/// Containment index: the tree formed by a graph's containment references.
///
/// The index is derived once per comparison and never mutated. It records, for
/// every node, its containment parent and the containing feature, the
/// root-first depth-first order (children in declaration order), and the
/// pre-order interval of every subtree so that ancestry questions are O(1).
///
/// # Invariants checked by [`Containment::build`]
///
/// - the root has no containment parent;
/// - no node is contained more than once;
/// - the containment subgraph is acyclic (checked with `petgraph::algo::toposort`);
/// - every node is reachable from the root via containment.
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::Graph;

/// A violated containment invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// A node is the target of more than one containment reference.
    #[error("node {node:?} is contained by both {first:?} and {second:?}")]
    MultipleParents {
        /// The over-contained node.
        node: String,
        /// Parent recorded first.
        first: String,
        /// Parent that tried to claim the node again.
        second: String,
    },
    /// The root is the target of a containment reference.
    #[error("root {root:?} is contained by {parent:?}")]
    RootContained {
        /// The root id.
        root: String,
        /// The containing node.
        parent: String,
    },
    /// Containment references form a cycle through the named node.
    #[error("containment cycle through node {0:?}")]
    ContainmentCycle(String),
    /// A node is not reachable from the root via containment.
    #[error("node {0:?} is not reachable from the root via containment")]
    Detached(String),
}

/// Where a node sits in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    /// Positional index of the parent node.
    pub parent: usize,
    /// Position of the containing reference within the parent's reference map.
    pub feature: usize,
}

/// Containment tree of one [`Graph`], addressed by positional node index.
#[derive(Debug, Clone)]
pub struct Containment {
    parents: Vec<Option<ParentLink>>,
    children: Vec<Vec<usize>>,
    order: Vec<usize>,
    position: Vec<usize>,
    subtree_size: Vec<usize>,
}

impl Containment {
    /// Derives the containment tree of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError`] for the first violated invariant found.
    pub fn build(graph: &Graph) -> Result<Self, StructureError> {
        let count = graph.node_count();
        let root = graph.root_index();
        let mut parents: Vec<Option<ParentLink>> = vec![None; count];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut tree: DiGraph<usize, ()> = DiGraph::with_capacity(count, count);
        let handles: Vec<NodeIndex> = (0..count).map(|i| tree.add_node(i)).collect();

        for (index, node) in graph.nodes().enumerate() {
            for (feature, (_, reference)) in node.references.iter().enumerate() {
                if !reference.containment {
                    continue;
                }
                for target in &reference.targets {
                    let Some(child) = graph.index_of(target) else {
                        continue;
                    };
                    if child == root {
                        return Err(StructureError::RootContained {
                            root: target.to_string(),
                            parent: node.id.to_string(),
                        });
                    }
                    let slot = parents.get_mut(child).ok_or_else(|| detached(graph, child))?;
                    if let Some(existing) = slot {
                        return Err(StructureError::MultipleParents {
                            node: target.to_string(),
                            first: id_at(graph, existing.parent),
                            second: node.id.to_string(),
                        });
                    }
                    *slot = Some(ParentLink {
                        parent: index,
                        feature,
                    });
                    if let Some(list) = children.get_mut(index) {
                        list.push(child);
                    }
                    if let (Some(&from), Some(&to)) = (handles.get(index), handles.get(child)) {
                        tree.add_edge(from, to, ());
                    }
                }
            }
        }

        if let Err(cycle) = toposort(&tree, None) {
            let at = tree.node_weight(cycle.node_id()).copied().unwrap_or(root);
            return Err(StructureError::ContainmentCycle(id_at(graph, at)));
        }

        // Pre-order walk from the root; children are pushed reversed so they
        // pop in declaration order.
        let mut order = Vec::with_capacity(count);
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            order.push(index);
            if let Some(list) = children.get(index) {
                stack.extend(list.iter().rev().copied());
            }
        }

        if order.len() < count {
            let mut seen = vec![false; count];
            for &index in &order {
                if let Some(flag) = seen.get_mut(index) {
                    *flag = true;
                }
            }
            let missing = seen.iter().position(|s| !s).unwrap_or(root);
            return Err(detached(graph, missing));
        }

        let mut position = vec![0; count];
        for (pos, &index) in order.iter().enumerate() {
            if let Some(slot) = position.get_mut(index) {
                *slot = pos;
            }
        }

        let mut subtree_size = vec![1_usize; count];
        for &index in order.iter().rev() {
            let own = subtree_size.get(index).copied().unwrap_or(1);
            if let Some(link) = parents.get(index).copied().flatten() {
                if let Some(size) = subtree_size.get_mut(link.parent) {
                    *size += own;
                }
            }
        }

        Ok(Self {
            parents,
            children,
            order,
            position,
            subtree_size,
        })
    }

    /// Root-first depth-first order of all nodes.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Containment parent of a node, or `None` for the root.
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.link(index).map(|l| l.parent)
    }

    /// Parent and containing feature of a node, or `None` for the root.
    pub fn link(&self, index: usize) -> Option<ParentLink> {
        self.parents.get(index).copied().flatten()
    }

    /// Name of the reference that contains the node, or `None` for the root.
    pub fn feature_name<'g>(&self, graph: &'g Graph, index: usize) -> Option<&'g str> {
        let link = self.link(index)?;
        graph
            .node_at(link.parent)?
            .references
            .get_index(link.feature)
            .map(|(name, _)| name.as_str())
    }

    /// Direct children in containment declaration order.
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map_or(&[], Vec::as_slice)
    }

    /// Position of a node in [`Containment::order`].
    pub fn position(&self, index: usize) -> Option<usize> {
        self.position.get(index).copied()
    }

    /// Returns `true` if `node` is `anchor` or one of its containment descendants.
    pub fn is_in_subtree(&self, anchor: usize, node: usize) -> bool {
        let (Some(start), Some(size), Some(pos)) = (
            self.position(anchor),
            self.subtree_size.get(anchor).copied(),
            self.position(node),
        ) else {
            return false;
        };
        pos >= start && pos < start + size
    }

    /// Number of nodes in the subtree rooted at `index`, including itself.
    pub fn subtree_size(&self, index: usize) -> usize {
        self.subtree_size.get(index).copied().unwrap_or(0)
    }
}

fn id_at(graph: &Graph, index: usize) -> String {
    graph
        .node_at(index)
        .map(|n| n.id.to_string())
        .unwrap_or_default()
}

fn detached(graph: &Graph, index: usize) -> StructureError {
    StructureError::Detached(id_at(graph, index))
}

//! Shared fixtures for unit tests.
#![allow(clippy::expect_used)]

use crate::graph::Graph;
use crate::model::{Node, NodeId, Reference};

/// Builds a [`NodeId`] from a string literal, panicking on empty input.
pub fn id(s: &str) -> NodeId {
    NodeId::try_from(s).expect("valid NodeId")
}

/// Builds a list of [`NodeId`]s.
pub fn ids(list: &[&str]) -> Vec<NodeId> {
    list.iter().map(|s| id(s)).collect()
}

/// Builds a graph rooted at the first node.
pub fn graph(nodes: Vec<Node>) -> Graph {
    let root = nodes.first().map(|n| n.id.clone()).expect("at least one node");
    Graph::new(&root, nodes).expect("valid graph")
}

/// A small library: two books, two writers, cross-referenced by `authors`.
pub fn library_nodes() -> Vec<Node> {
    vec![
        Node::new(id("lib"), "Library")
            .with_attribute("name", "City")
            .with_reference("books", Reference::containment(ids(&["b1", "b2"])))
            .with_reference("writers", Reference::containment(ids(&["w1", "w2"]))),
        Node::new(id("b1"), "Book")
            .with_attribute("name", "Dune")
            .with_attribute("isbn", crate::model::Value::Null)
            .with_reference("authors", Reference::cross(ids(&["w1"]))),
        Node::new(id("b2"), "Book")
            .with_attribute("name", "Emma")
            .with_attribute("pages", 474_i64)
            .with_reference("authors", Reference::cross(ids(&["w2", "w1"]))),
        Node::new(id("w1"), "Writer").with_attribute("name", "Herbert"),
        Node::new(id("w2"), "Writer").with_attribute("name", "Austen"),
    ]
}

/// [`library_nodes`] as a graph.
pub fn library() -> Graph {
    graph(library_nodes())
}

/// Rewrites the node with the given id in place.
pub fn update(nodes: &mut [Node], id: &str, f: impl FnOnce(Node) -> Node) {
    let slot = nodes
        .iter_mut()
        .find(|n| &*n.id == id)
        .expect("node to update");
    *slot = f(slot.clone());
}

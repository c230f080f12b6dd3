use std::fmt;

use serde::Serialize;

use crate::model::{Node, NodeId, Side, Value};

/// Direction of a difference, read from left (baseline) to right (target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifferenceKind {
    /// Present on the right only.
    Add,
    /// Present on the left only.
    Delete,
    /// Present on both sides with a different value or order.
    Change,
    /// Present on both sides under a different container.
    Move,
}

impl DifferenceKind {
    /// All kinds, in report order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Delete, Self::Change, Self::Move];

    /// Upper-case label used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Delete => "DELETE",
            Self::Change => "CHANGE",
            Self::Move => "MOVE",
        }
    }
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The variant of a [`Difference`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DifferenceCategory {
    /// See [`Difference::AttributeChange`].
    AttributeChange,
    /// See [`Difference::ReferenceAdd`].
    ReferenceAdd,
    /// See [`Difference::ReferenceRemove`].
    ReferenceRemove,
    /// See [`Difference::ReferenceOrderChange`].
    ReferenceOrderChange,
    /// See [`Difference::NodeAdd`].
    NodeAdd,
    /// See [`Difference::NodeDelete`].
    NodeDelete,
    /// See [`Difference::NodeMove`].
    NodeMove,
}

impl DifferenceCategory {
    /// All categories.
    pub const ALL: [Self; 7] = [
        Self::AttributeChange,
        Self::ReferenceAdd,
        Self::ReferenceRemove,
        Self::ReferenceOrderChange,
        Self::NodeAdd,
        Self::NodeDelete,
        Self::NodeMove,
    ];

    /// Variant name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AttributeChange => "AttributeChange",
            Self::ReferenceAdd => "ReferenceAdd",
            Self::ReferenceRemove => "ReferenceRemove",
            Self::ReferenceOrderChange => "ReferenceOrderChange",
            Self::NodeAdd => "NodeAdd",
            Self::NodeDelete => "NodeDelete",
            Self::NodeMove => "NodeMove",
        }
    }

    /// The kind every difference of this category has.
    pub fn kind(self) -> DifferenceKind {
        match self {
            Self::NodeAdd | Self::ReferenceAdd => DifferenceKind::Add,
            Self::NodeDelete | Self::ReferenceRemove => DifferenceKind::Delete,
            Self::AttributeChange | Self::ReferenceOrderChange => DifferenceKind::Change,
            Self::NodeMove => DifferenceKind::Move,
        }
    }
}

impl fmt::Display for DifferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lightweight reference to a node, carrying just enough information for
/// readable output without cloning the full [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// Graph-local node identifier.
    pub id: NodeId,
    /// Node type tag.
    pub type_name: String,
    /// Display name of the node, if it has one.
    pub label: Option<String>,
}

impl NodeRef {
    pub(crate) fn from_node(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            type_name: node.type_name.clone(),
            label: node.label(),
        }
    }
}

/// Where the affected node of a difference is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// Only in the left graph.
    Left(NodeId),
    /// Only in the right graph.
    Right(NodeId),
    /// In both graphs, as a matched pair.
    Both {
        /// Left id.
        left: NodeId,
        /// Right id.
        right: NodeId,
    },
}

impl Observed {
    /// Id on the given side, if observed there.
    pub fn on(&self, side: Side) -> Option<&NodeId> {
        match (self, side) {
            (Self::Left(id) | Self::Both { left: id, .. }, Side::Left)
            | (Self::Right(id) | Self::Both { right: id, .. }, Side::Right) => Some(id),
            (Self::Right(_), Side::Left) | (Self::Left(_), Side::Right) => None,
        }
    }
}

/// The node a difference is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Type tag of the node.
    pub type_name: String,
    /// Display name, taken from the left node when it has one.
    pub label: Option<String>,
    /// Identity on each side.
    pub observed: Observed,
}

impl Subject {
    pub(crate) fn left(node: &Node) -> Self {
        Self {
            type_name: node.type_name.clone(),
            label: node.label(),
            observed: Observed::Left(node.id.clone()),
        }
    }

    pub(crate) fn right(node: &Node) -> Self {
        Self {
            type_name: node.type_name.clone(),
            label: node.label(),
            observed: Observed::Right(node.id.clone()),
        }
    }

    pub(crate) fn both(left: &Node, right: &Node) -> Self {
        Self {
            type_name: left.type_name.clone(),
            label: left.label().or_else(|| right.label()),
            observed: Observed::Both {
                left: left.id.clone(),
                right: right.id.clone(),
            },
        }
    }
}

/// One atomic difference between two graphs.
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    /// A matched node holds different values for an attribute.
    AttributeChange {
        /// The matched pair.
        subject: Subject,
        /// Attribute name.
        feature: String,
        /// Left value (`Null` when absent).
        old: Value,
        /// Right value (`Null` when absent).
        new: Value,
    },
    /// A reference of a matched node gained a target.
    ReferenceAdd {
        /// The matched pair.
        subject: Subject,
        /// Reference name.
        feature: String,
        /// The new target, as found in the right graph.
        target: NodeRef,
    },
    /// A reference of a matched node lost a target.
    ReferenceRemove {
        /// The matched pair.
        subject: Subject,
        /// Reference name.
        feature: String,
        /// The lost target, as found in the left graph.
        target: NodeRef,
    },
    /// The targets common to both sides of an ordered reference appear in a
    /// different relative order.
    ReferenceOrderChange {
        /// The matched pair.
        subject: Subject,
        /// Reference name.
        feature: String,
        /// Common targets in left order (left ids).
        old: Vec<NodeId>,
        /// Common targets in right order (right ids).
        new: Vec<NodeId>,
    },
    /// A node exists only in the right graph.
    NodeAdd {
        /// The right-only node.
        subject: Subject,
        /// Its containment parent, absent for the root.
        parent: Option<NodeRef>,
        /// The containing reference, absent for the root.
        feature: Option<String>,
    },
    /// A node exists only in the left graph.
    NodeDelete {
        /// The left-only node.
        subject: Subject,
        /// Its containment parent, absent for the root.
        parent: Option<NodeRef>,
        /// The containing reference, absent for the root.
        feature: Option<String>,
    },
    /// A matched node sits under a different container or feature.
    NodeMove {
        /// The matched pair.
        subject: Subject,
        /// Left parent.
        old_parent: Option<NodeRef>,
        /// Right parent.
        new_parent: Option<NodeRef>,
        /// Left containing reference.
        old_feature: Option<String>,
        /// Right containing reference.
        new_feature: Option<String>,
    },
}

impl Difference {
    /// The variant of this difference.
    pub fn category(&self) -> DifferenceCategory {
        match self {
            Self::AttributeChange { .. } => DifferenceCategory::AttributeChange,
            Self::ReferenceAdd { .. } => DifferenceCategory::ReferenceAdd,
            Self::ReferenceRemove { .. } => DifferenceCategory::ReferenceRemove,
            Self::ReferenceOrderChange { .. } => DifferenceCategory::ReferenceOrderChange,
            Self::NodeAdd { .. } => DifferenceCategory::NodeAdd,
            Self::NodeDelete { .. } => DifferenceCategory::NodeDelete,
            Self::NodeMove { .. } => DifferenceCategory::NodeMove,
        }
    }

    /// ADD, DELETE, CHANGE or MOVE.
    pub fn kind(&self) -> DifferenceKind {
        self.category().kind()
    }

    /// The node this difference is about.
    pub fn subject(&self) -> &Subject {
        match self {
            Self::AttributeChange { subject, .. }
            | Self::ReferenceAdd { subject, .. }
            | Self::ReferenceRemove { subject, .. }
            | Self::ReferenceOrderChange { subject, .. }
            | Self::NodeAdd { subject, .. }
            | Self::NodeDelete { subject, .. }
            | Self::NodeMove { subject, .. } => subject,
        }
    }

    /// The attribute or reference involved; for node-level differences the
    /// containing reference (the right one for moves).
    pub fn feature(&self) -> Option<&str> {
        match self {
            Self::AttributeChange { feature, .. }
            | Self::ReferenceAdd { feature, .. }
            | Self::ReferenceRemove { feature, .. }
            | Self::ReferenceOrderChange { feature, .. } => Some(feature.as_str()),
            Self::NodeAdd { feature, .. } | Self::NodeDelete { feature, .. } => feature.as_deref(),
            Self::NodeMove {
                new_feature,
                old_feature,
                ..
            } => new_feature.as_deref().or(old_feature.as_deref()),
        }
    }

    /// Returns `true` if `name` is the feature involved, including either
    /// end of a move.
    pub fn touches_feature(&self, name: &str) -> bool {
        match self {
            Self::NodeMove {
                old_feature,
                new_feature,
                ..
            } => old_feature.as_deref() == Some(name) || new_feature.as_deref() == Some(name),
            Self::AttributeChange { .. }
            | Self::ReferenceAdd { .. }
            | Self::ReferenceRemove { .. }
            | Self::ReferenceOrderChange { .. }
            | Self::NodeAdd { .. }
            | Self::NodeDelete { .. } => self.feature() == Some(name),
        }
    }
}

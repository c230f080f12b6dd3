/// Building blocks of an object graph: node identifiers, scalar attribute
/// values, references and nodes.
///
/// Nodes refer to each other exclusively by [`NodeId`]; the owning
/// [`crate::graph::Graph`] resolves identifiers to nodes. This keeps ownership
/// of every node with exactly one graph even when cross references form cycles.
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Errors produced when constructing a [`NodeId`] from an invalid string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeIdError {
    /// The identifier was the empty string.
    #[error("invalid node id: expected non-empty string")]
    Empty,
}

/// Non-empty, graph-unique node identifier.
///
/// The identifier is opaque: no shape constraint beyond non-emptiness is
/// imposed. Implements [`Borrow<str>`] so maps keyed by `NodeId` can be
/// queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl TryFrom<&str> for NodeId {
    type Error = NodeIdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            Err(NodeIdError::Empty)
        } else {
            Ok(Self(s))
        }
    }
}

impl Deref for NodeId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::try_from(s).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A scalar attribute value.
///
/// An attribute that is absent from a node is equivalent to [`Value::Null`].
/// Floats compare by bit pattern so that equality (and hashing) is total,
/// which keeps identity matching deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or explicitly unset.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Integer above `i64::MAX`.
    Unsigned(u64),
    /// IEEE 754 double-precision float.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

/// Shared `null` returned for absent attributes.
pub(crate) static NULL: Value = Value::Null;

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string value if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::Unsigned(_)
            | Self::Float(_) => None,
        }
    }

    /// Renders the value without quoting strings; used for display labels.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::Unsigned(_)
            | Self::Float(_) => self.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Unsigned(a), Self::Unsigned(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (
                Self::Null
                | Self::Bool(_)
                | Self::Integer(_)
                | Self::Unsigned(_)
                | Self::Float(_)
                | Self::String(_),
                _,
            ) => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Integer(n) => n.hash(state),
            Self::Unsigned(n) => n.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::String(s) => s.hash(state),
        }
    }
}

/// Renders `<null>` for null, quotes strings and always gives floats a
/// fractional part, so `"1"`, `1` and `1.0` stay distinguishable in reports.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("<null>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Self::Unsigned(n), Self::Integer)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

fn default_ordered() -> bool {
    true
}

/// A named reference feature of a node: an ordered list of target ids.
///
/// Containment references establish the parent/child tree; every other
/// reference is a cross link that may point anywhere in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    /// Whether targets are owned children of the referencing node.
    #[serde(default)]
    pub containment: bool,
    /// Whether the relative order of targets is significant.
    #[serde(default = "default_ordered")]
    pub ordered: bool,
    /// Target node identifiers in declaration order.
    #[serde(default)]
    pub targets: Vec<NodeId>,
}

impl Reference {
    /// An ordered containment reference.
    pub fn containment(targets: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            containment: true,
            ordered: true,
            targets: targets.into_iter().collect(),
        }
    }

    /// An ordered cross reference.
    pub fn cross(targets: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            containment: false,
            ordered: true,
            targets: targets.into_iter().collect(),
        }
    }

    /// Marks the reference as unordered.
    #[must_use]
    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A typed node with ordered attributes and ordered references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    /// Identifier, unique within the owning graph.
    pub id: NodeId,

    /// Type tag (class name), e.g. `"Book"`.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Attribute values keyed by attribute name, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,

    /// References keyed by reference name, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub references: IndexMap<String, Reference>,
}

impl Node {
    /// Creates a node with no attributes and no references.
    pub fn new(id: NodeId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            attributes: IndexMap::new(),
            references: IndexMap::new(),
        }
    }

    /// Sets an attribute, replacing any previous value of the same name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets a reference, replacing any previous reference of the same name.
    #[must_use]
    pub fn with_reference(mut self, name: impl Into<String>, reference: Reference) -> Self {
        self.references.insert(name.into(), reference);
        self
    }

    /// Returns the value of an attribute; absent attributes read as null.
    pub fn attribute(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    /// Returns the `name` attribute rendered for display, if set.
    pub fn label(&self) -> Option<String> {
        let value = self.attribute("name");
        (!value.is_null()).then(|| value.to_plain_string())
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which of the two compared graphs something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The baseline graph.
    Left,
    /// The target graph.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn empty_node_id_is_rejected() {
        assert_eq!(NodeId::try_from(""), Err(NodeIdError::Empty));
        assert!(serde_json::from_str::<NodeId>("\"\"").is_err());
    }

    #[test]
    fn absent_attribute_reads_as_null() {
        let node = Node::new(NodeId::try_from("b1").expect("id"), "Book");
        assert!(node.attribute("isbn").is_null());
        assert_eq!(node.label(), None);
    }

    #[test]
    fn values_deserialize_by_shape() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 3, 2.5, "x"]"#).expect("parse values");
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Integer(3),
                Value::Float(2.5),
                Value::String("x".to_owned()),
            ]
        );
    }

    #[test]
    fn display_distinguishes_strings_from_numbers() {
        assert_eq!(Value::from("1").to_string(), "\"1\"");
        assert_eq!(Value::from(1_i64).to_string(), "1");
        assert_eq!(Value::Null.to_string(), "<null>");
    }

    #[test]
    fn display_distinguishes_floats_from_integers() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_ne!(Value::Float(1.0).to_string(), Value::Integer(1).to_string());
    }

    #[test]
    fn large_integers_keep_full_precision() {
        let values: Vec<Value> = serde_json::from_str(
            "[9223372036854775807, 18446744073709551614, 18446744073709551615]",
        )
        .expect("parse values");
        assert_eq!(
            values,
            vec![
                Value::Integer(i64::MAX),
                Value::Unsigned(u64::MAX - 1),
                Value::Unsigned(u64::MAX),
            ]
        );
        assert_ne!(values[1], values[2]);
        assert_eq!(values[2].to_string(), "18446744073709551615");
        assert_eq!(Value::from(u64::MAX), Value::Unsigned(u64::MAX));
        assert_eq!(Value::from(7_u64), Value::Integer(7));
    }

    #[test]
    fn nan_equals_itself() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    fn reference_defaults_to_ordered_cross_link() {
        let r: Reference = serde_json::from_str(r#"{"targets":["a"]}"#).expect("parse");
        assert!(!r.containment);
        assert!(r.ordered);
        assert_eq!(r.targets.len(), 1);
    }
}

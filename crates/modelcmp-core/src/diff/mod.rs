/// Difference extraction between two matched graphs.
///
/// Given a [`crate::matcher::Mapping`], [`extract`] walks both containment
/// trees in a fixed order and emits one [`Difference`] per atomic change:
///
/// 1. the left tree in depth-first order: an unmatched node yields
///    [`Difference::NodeDelete`]; a matched pair yields, in order, a
///    [`Difference::NodeMove`] (if its container changed), one
///    [`Difference::AttributeChange`] per unequal attribute, then the
///    reference differences of its containment references followed by its
///    cross references;
/// 2. the right tree in depth-first order: an unmatched node yields
///    [`Difference::NodeAdd`].
///
/// Attribute and reference names are visited in left declaration order,
/// followed by names that only the right node declares.
pub mod extract;
pub mod types;


pub use extract::{ExtractionError, extract};
pub use types::{
    Difference, DifferenceCategory, DifferenceKind, NodeRef, Observed, Subject,
};

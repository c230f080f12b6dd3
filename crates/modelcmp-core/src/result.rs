/// The outcome of comparing two graphs, and the query operations on it.
///
/// [`compare`] runs the whole pipeline: containment analysis of both graphs,
/// matching, and difference extraction. The resulting [`ComparisonResult`]
/// borrows both graphs and is immutable; every query returns differences in
/// discovery order.
use std::collections::HashSet;

use crate::containment::Containment;
use crate::diff::extract::extract_trees;
use crate::diff::{Difference, DifferenceCategory, DifferenceKind, ExtractionError};
use crate::graph::Graph;
use crate::matcher::{MatchConfig, MatchError, Mapping, match_trees};
use crate::model::{NodeId, Side};

/// Any failure of [`compare`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    /// Matching failed.
    #[error(transparent)]
    Match(#[from] MatchError),
    /// Extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Compares two graphs with the default [`MatchConfig`].
///
/// # Errors
///
/// See [`compare_with_config`].
pub fn compare<'a>(
    left: &'a Graph,
    right: &'a Graph,
) -> Result<ComparisonResult<'a>, CompareError> {
    compare_with_config(left, right, &MatchConfig::default())
}

/// Compares two graphs.
///
/// # Errors
///
/// Returns [`CompareError::Match`] if either graph has malformed containment,
/// the structural pass exceeds its budget or the configuration is invalid.
pub fn compare_with_config<'a>(
    left: &'a Graph,
    right: &'a Graph,
    config: &MatchConfig,
) -> Result<ComparisonResult<'a>, CompareError> {
    let left_tree = Containment::build(left).map_err(|source| MatchError::Structure {
        side: Side::Left,
        source,
    })?;
    let right_tree = Containment::build(right).map_err(|source| MatchError::Structure {
        side: Side::Right,
        source,
    })?;

    let mapping = match_trees(left, right, &left_tree, &right_tree, config)?;
    let differences = extract_trees(left, right, &left_tree, &right_tree, &mapping)?;

    let result = ComparisonResult {
        left,
        right,
        mapping,
        differences,
        left_tree,
        right_tree,
    };
    let summary = result.summary();
    tracing::info!(
        differences = result.len(),
        added = summary.added,
        deleted = summary.deleted,
        changed = summary.changed,
        moved = summary.moved,
        matched = summary.matched,
        "comparison complete"
    );
    Ok(result)
}

/// Counts of differences per kind plus matching statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffSummary {
    /// Differences of kind ADD.
    pub added: usize,
    /// Differences of kind DELETE.
    pub deleted: usize,
    /// Differences of kind CHANGE.
    pub changed: usize,
    /// Differences of kind MOVE.
    pub moved: usize,
    /// Matched node pairs.
    pub matched: usize,
    /// Nodes in the left graph.
    pub left_nodes: usize,
    /// Nodes in the right graph.
    pub right_nodes: usize,
}

impl DiffSummary {
    /// Total number of differences.
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.changed + self.moved
    }
}

/// A composable selection of differences.
///
/// Empty criteria select everything; non-empty criteria must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffFilter {
    /// Keep only these kinds.
    pub kinds: HashSet<DifferenceKind>,
    /// Keep only these categories.
    pub categories: HashSet<DifferenceCategory>,
    /// Keep only differences touching one of these features.
    pub features: HashSet<String>,
    /// Keep only differences inside the subtree rooted at this node.
    pub subtree: Option<(Side, NodeId)>,
}

impl DiffFilter {
    /// Returns `true` if the filter selects everything.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
            && self.categories.is_empty()
            && self.features.is_empty()
            && self.subtree.is_none()
    }
}

/// Differences between two graphs, with the graphs and mapping they came from.
#[derive(Debug, Clone)]
pub struct ComparisonResult<'a> {
    left: &'a Graph,
    right: &'a Graph,
    mapping: Mapping,
    differences: Vec<Difference>,
    left_tree: Containment,
    right_tree: Containment,
}

impl<'a> ComparisonResult<'a> {
    /// The baseline graph.
    pub fn left(&self) -> &'a Graph {
        self.left
    }

    /// The target graph.
    pub fn right(&self) -> &'a Graph {
        self.right
    }

    /// The node mapping the differences were computed under.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// All differences in discovery order.
    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    /// Iterates all differences in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Difference> {
        self.differences.iter()
    }

    /// Number of differences.
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// Returns `true` if the graphs are equivalent.
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Differences of one kind.
    pub fn of_kind(&self, kind: DifferenceKind) -> Vec<&Difference> {
        self.iter().filter(|d| d.kind() == kind).collect()
    }

    /// Differences of one category.
    pub fn of_category(&self, category: DifferenceCategory) -> Vec<&Difference> {
        self.iter().filter(|d| d.category() == category).collect()
    }

    /// Differences involving the named attribute or reference.
    pub fn for_feature(&self, name: &str) -> Vec<&Difference> {
        self.iter().filter(|d| d.touches_feature(name)).collect()
    }

    /// Differences whose subject lies in the subtree rooted at `id`.
    ///
    /// The anchor is looked up on `side`; when it is matched, the subtree of
    /// its partner counts too, so additions under the partner are included.
    /// An unknown anchor selects nothing.
    pub fn affecting(&self, side: Side, id: &str) -> Vec<&Difference> {
        let Some(scope) = self.scope(side, id) else {
            return Vec::new();
        };
        self.iter().filter(|d| scope.contains(d)).collect()
    }

    /// Differences selected by `filter`, in discovery order.
    pub fn filtered(&self, filter: &DiffFilter) -> Vec<&Difference> {
        self.filtered_indexed(filter).into_iter().map(|(_, d)| d).collect()
    }

    /// Like [`ComparisonResult::filtered`], keeping each difference's
    /// position in [`ComparisonResult::differences`].
    pub fn filtered_indexed(&self, filter: &DiffFilter) -> Vec<(usize, &Difference)> {
        let scope = match &filter.subtree {
            Some((side, id)) => match self.scope(*side, id) {
                Some(scope) => Some(scope),
                None => return Vec::new(),
            },
            None => None,
        };
        self.iter()
            .enumerate()
            .filter(|(_, d)| filter.kinds.is_empty() || filter.kinds.contains(&d.kind()))
            .filter(|(_, d)| {
                filter.categories.is_empty() || filter.categories.contains(&d.category())
            })
            .filter(|(_, d)| {
                filter.features.is_empty() || filter.features.iter().any(|f| d.touches_feature(f))
            })
            .filter(|(_, d)| scope.as_ref().is_none_or(|s| s.contains(d)))
            .collect()
    }

    /// Counts per kind plus matching statistics.
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary {
            matched: self.mapping.len(),
            left_nodes: self.left.node_count(),
            right_nodes: self.right.node_count(),
            ..DiffSummary::default()
        };
        for d in &self.differences {
            match d.kind() {
                DifferenceKind::Add => summary.added += 1,
                DifferenceKind::Delete => summary.deleted += 1,
                DifferenceKind::Change => summary.changed += 1,
                DifferenceKind::Move => summary.moved += 1,
            }
        }
        summary
    }

    fn scope(&self, side: Side, id: &str) -> Option<Scope<'_>> {
        let (left_anchor, right_anchor) = match side {
            Side::Left => {
                let anchor = self.left.index_of(id)?;
                let partner = self
                    .mapping
                    .right_of(id)
                    .and_then(|r| self.right.index_of(r));
                (Some(anchor), partner)
            }
            Side::Right => {
                let anchor = self.right.index_of(id)?;
                let partner = self
                    .mapping
                    .left_of(id)
                    .and_then(|l| self.left.index_of(l));
                (partner, Some(anchor))
            }
        };
        Some(Scope {
            result: self,
            left_anchor,
            right_anchor,
        })
    }
}

impl<'r> IntoIterator for &'r ComparisonResult<'_> {
    type Item = &'r Difference;
    type IntoIter = std::slice::Iter<'r, Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.differences.iter()
    }
}

/// Subtree anchors on each side, for ancestry checks.
struct Scope<'r> {
    result: &'r ComparisonResult<'r>,
    left_anchor: Option<usize>,
    right_anchor: Option<usize>,
}

impl Scope<'_> {
    fn contains(&self, difference: &Difference) -> bool {
        let observed = &difference.subject().observed;
        let inside = |side: Side, anchor: Option<usize>| {
            let (graph, tree) = match side {
                Side::Left => (self.result.left, &self.result.left_tree),
                Side::Right => (self.result.right, &self.result.right_tree),
            };
            match (anchor, observed.on(side).and_then(|id| graph.index_of(id))) {
                (Some(anchor), Some(node)) => tree.is_in_subtree(anchor, node),
                (Some(_) | None, _) => false,
            }
        };
        inside(Side::Left, self.left_anchor) || inside(Side::Right, self.right_anchor)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::model::{Node, Reference};
    use crate::test_helpers::{graph, id, ids, library, library_nodes, update};

    fn modified() -> Graph {
        let mut nodes = library_nodes();
        update(&mut nodes, "b1", |n| n.with_attribute("isbn", "123"));
        update(&mut nodes, "b2", |n| {
            n.with_reference("authors", Reference::cross(ids(&["w1", "w2"])))
        });
        update(&mut nodes, "lib", |n| {
            n.with_reference("writers", Reference::containment(ids(&["w1", "w2", "w3"])))
        });
        nodes.push(Node::new(id("w3"), "Writer").with_attribute("name", "Le Guin"));
        graph(nodes)
    }

    #[test]
    fn identical_graphs_compare_empty() {
        let g = library();
        let result = compare(&g, &g).expect("compare");
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert_eq!(result.mapping().len(), g.node_count());
        assert_eq!(result.summary().total(), 0);
    }

    #[test]
    fn summary_counts_per_kind() {
        let (left, right) = (library(), modified());
        let result = compare(&left, &right).expect("compare");
        let summary = result.summary();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.changed, 2);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.moved, 0);
        assert_eq!(summary.total(), result.len());
        assert_eq!(summary.matched, 5);
        assert_eq!((summary.left_nodes, summary.right_nodes), (5, 6));
    }

    #[test]
    fn kind_category_and_feature_queries() {
        let (left, right) = (library(), modified());
        let result = compare(&left, &right).expect("compare");
        assert_eq!(result.of_kind(DifferenceKind::Add).len(), 2);
        assert_eq!(
            result
                .of_category(DifferenceCategory::ReferenceOrderChange)
                .len(),
            1
        );
        assert_eq!(result.for_feature("isbn").len(), 1);
        assert_eq!(result.for_feature("writers").len(), 2);
        assert!(result.for_feature("nothing").is_empty());
    }

    #[test]
    fn affecting_covers_descendants_on_both_sides() {
        let (left, right) = (library(), modified());
        let result = compare(&left, &right).expect("compare");
        assert_eq!(result.affecting(Side::Left, "lib").len(), result.len());
        assert_eq!(result.affecting(Side::Left, "b1").len(), 1);
        assert_eq!(result.affecting(Side::Right, "w3").len(), 1);
        assert!(result.affecting(Side::Left, "w1").is_empty());
        assert!(result.affecting(Side::Left, "missing").is_empty());
    }

    #[test]
    fn filter_combines_criteria() {
        let (left, right) = (library(), modified());
        let result = compare(&left, &right).expect("compare");

        assert_eq!(result.filtered(&DiffFilter::default()).len(), result.len());

        let adds_on_writers = DiffFilter {
            kinds: [DifferenceKind::Add].into_iter().collect(),
            features: ["writers".to_owned()].into_iter().collect(),
            ..DiffFilter::default()
        };
        assert_eq!(result.filtered(&adds_on_writers).len(), 2);

        let changes_under_b1 = DiffFilter {
            kinds: [DifferenceKind::Change].into_iter().collect(),
            subtree: Some((Side::Left, id("b1"))),
            ..DiffFilter::default()
        };
        let indexed = result.filtered_indexed(&changes_under_b1);
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].1.feature(), Some("isbn"));
        assert!(std::ptr::eq(indexed[0].1, &result.differences()[indexed[0].0]));
    }

    #[test]
    fn malformed_containment_is_a_match_error() {
        let good = library();
        let bad = graph(vec![Node::new(id("r"), "T"), Node::new(id("x"), "T")]);
        let err = compare(&bad, &good).expect_err("malformed");
        assert!(matches!(
            err,
            CompareError::Match(MatchError::Structure {
                side: Side::Left,
                ..
            })
        ));
    }
}

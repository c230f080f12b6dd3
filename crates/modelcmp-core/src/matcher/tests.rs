#![allow(clippy::expect_used)]

use std::time::Duration;

use super::*;
use crate::model::{Node, Reference};
use crate::test_helpers::{graph, id, ids, library};

fn pairs(mapping: &Mapping) -> Vec<(String, String)> {
    mapping
        .pairs()
        .map(|(l, r)| (l.to_string(), r.to_string()))
        .collect()
}

fn pair(l: &str, r: &str) -> (String, String) {
    (l.to_owned(), r.to_owned())
}

fn sequential() -> MatchConfig {
    MatchConfig {
        parallel: false,
        ..MatchConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

#[test]
fn match_state_counts_pairs_once() {
    let mut state = MatchState::new(3, 2);
    assert_eq!(state.matched(), 0);
    assert!(state.pair(0, 1));
    assert!(!state.pair(0, 0));
    assert!(!state.pair(2, 1));
    assert!(state.pair(2, 0));
    assert!(!state.pair(5, 0));
    assert_eq!(state.matched(), 2);
    assert_eq!(state.right_of(2), Some(0));
    assert_eq!(state.left_of(1), Some(0));
}

#[test]
fn mapping_refuses_to_break_bijection() {
    let mut m = Mapping::new();
    assert!(m.insert(id("a"), id("x")));
    assert!(!m.insert(id("a"), id("y")));
    assert!(!m.insert(id("b"), id("x")));
    assert!(m.insert(id("b"), id("y")));
    assert_eq!(m.len(), 2);
    assert_eq!(m.right_of("a").map(|n| n.to_string()), Some("x".to_owned()));
    assert_eq!(m.left_of("y").map(|n| n.to_string()), Some("b".to_owned()));
    assert_eq!(m.partner(Side::Right, "x"), m.left_of("x"));
    assert!(m.right_of("zz").is_none());
}

// ---------------------------------------------------------------------------
// Pass 1
// ---------------------------------------------------------------------------

#[test]
fn identical_graphs_map_every_node_to_itself() {
    let g = library();
    let mapping = match_graphs(&g, &g, &MatchConfig::default()).expect("match");
    assert_eq!(
        pairs(&mapping),
        vec![
            pair("lib", "lib"),
            pair("b1", "b1"),
            pair("b2", "b2"),
            pair("w1", "w1"),
            pair("w2", "w2"),
        ]
    );
}

#[test]
fn identity_keys_match_across_different_ids() {
    let left = graph(vec![
        Node::new(id("l-root"), "Library")
            .with_attribute("name", "City")
            .with_reference("books", Reference::containment(ids(&["l-b"]))),
        Node::new(id("l-b"), "Book").with_attribute("name", "Dune"),
    ]);
    let right = graph(vec![
        Node::new(id("r-root"), "Library")
            .with_attribute("name", "City")
            .with_reference("books", Reference::containment(ids(&["r-b"]))),
        Node::new(id("r-b"), "Book").with_attribute("name", "Dune"),
    ]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(
        pairs(&mapping),
        vec![pair("l-root", "r-root"), pair("l-b", "r-b")]
    );
}

#[test]
fn first_identity_key_wins() {
    let left = graph(vec![
        Node::new(id("a"), "T")
            .with_attribute("id", "k1")
            .with_attribute("name", "same"),
    ]);
    let right = graph(vec![
        Node::new(id("b"), "T")
            .with_attribute("id", "k2")
            .with_attribute("name", "same"),
    ]);
    let config = MatchConfig {
        // Structural fallback would pair the roots; only identity is under test.
        similarity_threshold: 1.0,
        ..sequential()
    };
    let mapping = match_graphs(&left, &right, &config).expect("match");
    assert!(mapping.is_empty());
}

#[test]
fn identity_requires_equal_type_tags() {
    let left = graph(vec![Node::new(id("a"), "Book").with_attribute("name", "X")]);
    let right = graph(vec![Node::new(id("a"), "Film").with_attribute("name", "X")]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert!(mapping.is_empty());
}

#[test]
fn identity_prefers_candidate_under_matched_parent() {
    let shelf = |sid: &str, name: &str, book: &str| {
        Node::new(id(sid), "Shelf")
            .with_attribute("name", name)
            .with_reference("books", Reference::containment(ids(&[book])))
    };
    let book = |bid: &str| Node::new(id(bid), "Book").with_attribute("name", "X");

    let left = graph(vec![
        Node::new(id("root"), "Library")
            .with_attribute("name", "L")
            .with_reference("shelves", Reference::containment(ids(&["s1", "s2"]))),
        shelf("s1", "A", "x1"),
        shelf("s2", "B", "x2"),
        book("x1"),
        book("x2"),
    ]);
    let right = graph(vec![
        Node::new(id("root"), "Library")
            .with_attribute("name", "L")
            .with_reference("shelves", Reference::containment(ids(&["t1", "t2"]))),
        shelf("t1", "B", "y1"),
        shelf("t2", "A", "y2"),
        book("y1"),
        book("y2"),
    ]);

    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(mapping.right_of("s1").map(|n| n.to_string()), Some("t2".to_owned()));
    assert_eq!(mapping.right_of("x1").map(|n| n.to_string()), Some("y2".to_owned()));
    assert_eq!(mapping.right_of("x2").map(|n| n.to_string()), Some("y1".to_owned()));
}

// ---------------------------------------------------------------------------
// Pass 2
// ---------------------------------------------------------------------------

fn unnamed_items(root: &str, items: &[(&str, i64, &str)]) -> Graph {
    let children: Vec<&str> = items.iter().map(|(i, _, _)| *i).collect();
    let mut nodes = vec![
        Node::new(id(root), "Basket")
            .with_reference("items", Reference::containment(ids(&children))),
    ];
    for (item, qty, colour) in items {
        nodes.push(
            Node::new(id(item), "Item")
                .with_attribute("qty", *qty)
                .with_attribute("colour", *colour),
        );
    }
    graph(nodes)
}

#[test]
fn unnamed_roots_are_paired_structurally() {
    let left = unnamed_items("l", &[]);
    let right = unnamed_items("r", &[]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(pairs(&mapping), vec![pair("l", "r")]);
}

#[test]
fn roots_of_different_types_stay_unmatched() {
    let left = graph(vec![Node::new(id("a"), "Library")]);
    let right = graph(vec![Node::new(id("a"), "Archive")]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert!(mapping.is_empty());
}

#[test]
fn siblings_pair_by_best_similarity() {
    let left = unnamed_items("l", &[("c1", 1, "red"), ("c2", 2, "blue")]);
    let right = unnamed_items("r", &[("d1", 2, "blue"), ("d2", 1, "red")]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(
        pairs(&mapping),
        vec![pair("l", "r"), pair("c1", "d2"), pair("c2", "d1")]
    );
}

#[test]
fn half_agreement_meets_default_threshold() {
    let left = unnamed_items("l", &[("c1", 1, "red")]);
    let right = unnamed_items("r", &[("d1", 1, "green")]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(mapping.right_of("c1").map(|n| n.to_string()), Some("d1".to_owned()));
}

#[test]
fn dissimilar_siblings_stay_unmatched() {
    let left = unnamed_items("l", &[("c1", 1, "red")]);
    let right = unnamed_items("r", &[("d1", 7, "green")]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(pairs(&mapping), vec![pair("l", "r")]);
}

#[test]
fn structural_matches_descend_in_waves() {
    let tree = |p: &str, c: &str, g: &str| {
        graph(vec![
            Node::new(id(p), "Root").with_reference("kids", Reference::containment(ids(&[c]))),
            Node::new(id(c), "Mid")
                .with_attribute("level", 1_i64)
                .with_reference("kids", Reference::containment(ids(&[g]))),
            Node::new(id(g), "Leaf").with_attribute("level", 2_i64),
        ])
    };
    let left = tree("p", "c", "g");
    let right = tree("P", "C", "G");
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(
        pairs(&mapping),
        vec![pair("p", "P"), pair("c", "C"), pair("g", "G")]
    );
}

#[test]
fn cross_references_to_identified_nodes_drive_similarity() {
    let build = |loans: &[(&str, &str)]| {
        let loan_ids: Vec<&str> = loans.iter().map(|(l, _)| *l).collect();
        let mut nodes = vec![
            Node::new(id("lib"), "Library")
                .with_attribute("name", "City")
                .with_reference("books", Reference::containment(ids(&["b1", "b2"])))
                .with_reference("loans", Reference::containment(ids(&loan_ids))),
            Node::new(id("b1"), "Book").with_attribute("name", "Dune"),
            Node::new(id("b2"), "Book").with_attribute("name", "Emma"),
        ];
        for (loan, book) in loans {
            nodes.push(
                Node::new(id(loan), "Loan")
                    .with_reference("book", Reference::cross(ids(&[*book]))),
            );
        }
        graph(nodes)
    };
    let left = build(&[("n1", "b1"), ("n2", "b2")]);
    let right = build(&[("m1", "b2"), ("m2", "b1")]);
    let mapping = match_graphs(&left, &right, &sequential()).expect("match");
    assert_eq!(mapping.right_of("n1").map(|n| n.to_string()), Some("m2".to_owned()));
    assert_eq!(mapping.right_of("n2").map(|n| n.to_string()), Some("m1".to_owned()));
}

#[test]
fn parallel_and_sequential_scoring_agree() {
    let items: Vec<(String, i64, &str)> = (0..40)
        .map(|i| (format!("i{i}"), i % 7, if i % 2 == 0 { "red" } else { "blue" }))
        .collect();
    let left_items: Vec<(&str, i64, &str)> =
        items.iter().map(|(n, q, c)| (n.as_str(), *q, *c)).collect();
    let right_items: Vec<(&str, i64, &str)> = left_items.iter().rev().copied().collect();
    let left = unnamed_items("l", &left_items);
    let right = unnamed_items("r", &right_items);

    let par = match_graphs(&left, &right, &MatchConfig::default()).expect("parallel");
    let seq = match_graphs(&left, &right, &sequential()).expect("sequential");
    assert_eq!(par, seq);
}

// ---------------------------------------------------------------------------
// Errors and configuration
// ---------------------------------------------------------------------------

#[test]
fn zero_budget_fails_when_structural_work_remains() {
    let left = unnamed_items("l", &[("c1", 1, "red")]);
    let right = unnamed_items("r", &[("d1", 1, "red")]);
    let config = MatchConfig {
        fallback_budget: Some(Duration::ZERO),
        ..sequential()
    };
    let err = match_graphs(&left, &right, &config).expect_err("budget");
    assert!(matches!(err, MatchError::BudgetExhausted { pending: 1, .. }));
}

#[test]
fn zero_budget_is_fine_when_identity_matches_everything() {
    let g = library();
    let config = MatchConfig {
        fallback_budget: Some(Duration::ZERO),
        ..sequential()
    };
    let mapping = match_graphs(&g, &g, &config).expect("no structural work");
    assert_eq!(mapping.len(), g.node_count());
}

#[test]
fn out_of_range_threshold_is_rejected() {
    let g = library();
    for threshold in [-0.1, 1.5, f64::NAN] {
        let config = MatchConfig {
            similarity_threshold: threshold,
            ..MatchConfig::default()
        };
        assert!(matches!(
            match_graphs(&g, &g, &config),
            Err(MatchError::InvalidConfig(_))
        ));
    }
}

#[test]
fn malformed_containment_names_the_side() {
    let good = library();
    let bad = graph(vec![Node::new(id("r"), "T"), Node::new(id("orphan"), "T")]);
    let err = match_graphs(&good, &bad, &MatchConfig::default()).expect_err("structure");
    assert!(matches!(err, MatchError::Structure { side: Side::Right, .. }));
    assert!(err.to_string().starts_with("right model"));
}

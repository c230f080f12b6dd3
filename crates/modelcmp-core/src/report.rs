/// Rendering of a [`ComparisonResult`] as text or JSON.
///
/// Rendering is pure: the same result and options always produce the same
/// bytes, and differences are never reordered. Filtered reports keep each
/// difference's original number so lines can be correlated across runs.
///
/// A text line reads
///
/// ```text
/// 3. CHANGE AttributeChange Book "Dune" (b1) isbn: <null> -> "123"
/// ```
///
/// where ids observed on both sides appear as `left/right` when they differ.
use serde_json::{Map, Number, json};

use crate::diff::{Difference, DifferenceKind, NodeRef, Observed, Subject};
use crate::model::{Node, NodeId, Value};
use crate::result::{ComparisonResult, DiffFilter, DiffSummary};

/// Output format of [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One numbered line per difference.
    #[default]
    Text,
    /// A pretty-printed JSON document.
    Json,
}

/// What [`render`] includes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Output format.
    pub format: ReportFormat,
    /// Prefix text reports with both roots and match statistics.
    pub verbose: bool,
    /// Omit individual differences.
    pub summary_only: bool,
    /// Report only the selected differences.
    pub filter: DiffFilter,
}

/// Renders every difference as text.
pub fn format(result: &ComparisonResult<'_>) -> String {
    render(result, &ReportOptions::default())
}

/// Renders every difference as JSON.
pub fn format_json(result: &ComparisonResult<'_>) -> String {
    render(
        result,
        &ReportOptions {
            format: ReportFormat::Json,
            ..ReportOptions::default()
        },
    )
}

/// Renders `result` according to `options`.
pub fn render(result: &ComparisonResult<'_>, options: &ReportOptions) -> String {
    let selected = result.filtered_indexed(&options.filter);
    let summary = summarize(result, &selected);
    match options.format {
        ReportFormat::Text => render_text(result, options, &selected, &summary),
        ReportFormat::Json => render_json(result, options, &selected, &summary),
    }
}

/// Counts per kind over the selected differences.
fn summarize(result: &ComparisonResult<'_>, selected: &[(usize, &Difference)]) -> DiffSummary {
    let mut summary = DiffSummary {
        matched: result.mapping().len(),
        left_nodes: result.left().node_count(),
        right_nodes: result.right().node_count(),
        ..DiffSummary::default()
    };
    for (_, d) in selected {
        match d.kind() {
            DifferenceKind::Add => summary.added += 1,
            DifferenceKind::Delete => summary.deleted += 1,
            DifferenceKind::Change => summary.changed += 1,
            DifferenceKind::Move => summary.moved += 1,
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

fn render_text(
    result: &ComparisonResult<'_>,
    options: &ReportOptions,
    selected: &[(usize, &Difference)],
    summary: &DiffSummary,
) -> String {
    let mut lines = Vec::new();
    if options.verbose {
        lines.push(format!("Left root: {}", node_text(result.left().root_node())));
        lines.push(format!("Right root: {}", node_text(result.right().root_node())));
        lines.push(format!(
            "Matched: {} pairs ({} left nodes, {} right nodes)",
            summary.matched, summary.left_nodes, summary.right_nodes
        ));
    }
    if !options.summary_only {
        lines.extend(
            selected
                .iter()
                .map(|(index, d)| format!("{}. {}", index + 1, difference_line(d))),
        );
    }
    lines.push(summary_line(summary));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The summary line closing every text report.
pub fn summary_line(summary: &DiffSummary) -> String {
    format!(
        "Diff count = {} ({} added, {} deleted, {} changed, {} moved)",
        summary.total(),
        summary.added,
        summary.deleted,
        summary.changed,
        summary.moved
    )
}

/// One difference without its number.
pub fn difference_line(d: &Difference) -> String {
    let head = format!(
        "{} {} {}",
        d.kind(),
        d.category(),
        subject_text(d.subject())
    );
    let detail = match d {
        Difference::AttributeChange {
            feature, old, new, ..
        } => format!("{feature}: {old} -> {new}"),
        Difference::ReferenceAdd {
            feature, target, ..
        } => format!("{feature}: + {}", ref_text(target)),
        Difference::ReferenceRemove {
            feature, target, ..
        } => format!("{feature}: - {}", ref_text(target)),
        Difference::ReferenceOrderChange {
            feature, old, new, ..
        } => format!("{feature}: {} -> {}", id_list(old), id_list(new)),
        Difference::NodeAdd {
            parent, feature, ..
        } => format!("in {}", location(parent.as_ref(), feature.as_deref())),
        Difference::NodeDelete {
            parent, feature, ..
        } => format!("from {}", location(parent.as_ref(), feature.as_deref())),
        Difference::NodeMove {
            old_parent,
            new_parent,
            old_feature,
            new_feature,
            ..
        } => format!(
            "{} -> {}",
            location(old_parent.as_ref(), old_feature.as_deref()),
            location(new_parent.as_ref(), new_feature.as_deref())
        ),
    };
    format!("{head} {detail}")
}

fn labelled(type_name: &str, label: Option<&str>, id: &str) -> String {
    match label {
        Some(label) => format!("{type_name} {label:?} ({id})"),
        None => format!("{type_name} ({id})"),
    }
}

fn node_text(node: &Node) -> String {
    labelled(&node.type_name, node.label().as_deref(), &node.id)
}

fn ref_text(node: &NodeRef) -> String {
    labelled(&node.type_name, node.label.as_deref(), &node.id)
}

fn subject_text(subject: &Subject) -> String {
    let ids = match &subject.observed {
        Observed::Left(id) | Observed::Right(id) => id.to_string(),
        Observed::Both { left, right } if left == right => left.to_string(),
        Observed::Both { left, right } => format!("{left}/{right}"),
    };
    labelled(&subject.type_name, subject.label.as_deref(), &ids)
}

fn location(parent: Option<&NodeRef>, feature: Option<&str>) -> String {
    match (parent, feature) {
        (Some(parent), Some(feature)) => format!("{}.{feature}", ref_text(parent)),
        (Some(parent), None) => ref_text(parent),
        (None, Some(_) | None) => "<root>".to_owned(),
    }
}

fn id_list(ids: &[NodeId]) -> String {
    let parts: Vec<&str> = ids.iter().map(|id| &**id).collect();
    format!("[{}]", parts.join(", "))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn render_json(
    result: &ComparisonResult<'_>,
    options: &ReportOptions,
    selected: &[(usize, &Difference)],
    summary: &DiffSummary,
) -> String {
    let mut doc = Map::new();
    doc.insert(
        "left_root".to_owned(),
        node_json(result.left().root_node()),
    );
    doc.insert(
        "right_root".to_owned(),
        node_json(result.right().root_node()),
    );
    doc.insert(
        "summary".to_owned(),
        json!({
            "total": summary.total(),
            "added": summary.added,
            "deleted": summary.deleted,
            "changed": summary.changed,
            "moved": summary.moved,
            "matched": summary.matched,
            "left_nodes": summary.left_nodes,
            "right_nodes": summary.right_nodes,
        }),
    );
    if !options.summary_only {
        let records: Vec<serde_json::Value> = selected
            .iter()
            .map(|(index, d)| difference_json(*index, d))
            .collect();
        doc.insert("differences".to_owned(), serde_json::Value::Array(records));
    }
    let mut text = format!("{:#}", serde_json::Value::Object(doc));
    text.push('\n');
    text
}

fn difference_json(index: usize, d: &Difference) -> serde_json::Value {
    let subject = d.subject();
    let mut record = Map::new();
    record.insert("index".to_owned(), json!(index + 1));
    record.insert("kind".to_owned(), json!(d.kind().as_str()));
    record.insert("category".to_owned(), json!(d.category().as_str()));
    record.insert("type".to_owned(), json!(subject.type_name));
    record.insert("label".to_owned(), json!(subject.label));
    let (left, right) = match &subject.observed {
        Observed::Left(id) => (Some(id), None),
        Observed::Right(id) => (None, Some(id)),
        Observed::Both { left, right } => (Some(left), Some(right)),
    };
    record.insert("left".to_owned(), json!(left.map(|id| &**id)));
    record.insert("right".to_owned(), json!(right.map(|id| &**id)));

    match d {
        Difference::AttributeChange {
            feature, old, new, ..
        } => {
            record.insert("feature".to_owned(), json!(feature));
            record.insert("old".to_owned(), value_json(old));
            record.insert("new".to_owned(), value_json(new));
        }
        Difference::ReferenceAdd {
            feature, target, ..
        }
        | Difference::ReferenceRemove {
            feature, target, ..
        } => {
            record.insert("feature".to_owned(), json!(feature));
            record.insert("target".to_owned(), ref_json(target));
        }
        Difference::ReferenceOrderChange {
            feature, old, new, ..
        } => {
            record.insert("feature".to_owned(), json!(feature));
            record.insert("old".to_owned(), json!(old));
            record.insert("new".to_owned(), json!(new));
        }
        Difference::NodeAdd {
            parent, feature, ..
        }
        | Difference::NodeDelete {
            parent, feature, ..
        } => {
            record.insert("feature".to_owned(), json!(feature));
            record.insert(
                "parent".to_owned(),
                parent.as_ref().map_or(serde_json::Value::Null, ref_json),
            );
        }
        Difference::NodeMove {
            old_parent,
            new_parent,
            old_feature,
            new_feature,
            ..
        } => {
            record.insert(
                "old_parent".to_owned(),
                old_parent.as_ref().map_or(serde_json::Value::Null, ref_json),
            );
            record.insert("old_feature".to_owned(), json!(old_feature));
            record.insert(
                "new_parent".to_owned(),
                new_parent.as_ref().map_or(serde_json::Value::Null, ref_json),
            );
            record.insert("new_feature".to_owned(), json!(new_feature));
        }
    }
    serde_json::Value::Object(record)
}

fn node_json(node: &Node) -> serde_json::Value {
    json!({
        "id": &*node.id,
        "type": node.type_name,
        "label": node.label(),
    })
}

fn ref_json(node: &NodeRef) -> serde_json::Value {
    json!({
        "id": &*node.id,
        "type": node.type_name,
        "label": node.label,
    })
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number(Number::from(*n)),
        Value::Unsigned(n) => serde_json::Value::Number(Number::from(*n)),
        Value::Float(x) => {
            Number::from_f64(*x).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
    }
}

//! Cascade rebuilding of matched nodes.
//!
//! In cascade mode a node that survives `filter` (or `exclude`) is rebuilt
//! so that every related dataset reached by a predicate only keeps the
//! nested nodes that satisfy (or, for `exclude`, fail) that predicate. The
//! predicates reaching into the same related field are applied together,
//! one level at a time, and the rebuild recurses into the nested datasets.

use indexmap::IndexMap;
use tracing::trace;

use crate::clause::Clause;
use crate::error::Result;
use crate::field::{Field, FieldContent};
use crate::node::Node;

/// Whether matching nodes are kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    Keep,
    Drop,
}

impl Selection {
    /// Decides whether a node with the given match result stays.
    pub(crate) fn retains(self, matched: bool) -> bool {
        match self {
            Selection::Keep => matched,
            Selection::Drop => !matched,
        }
    }
}

/// Rebuilds `node` with its related datasets narrowed by `clauses`.
///
/// Fields no clause descends into are shared with the input node.
pub(crate) fn rebuild(node: &Node, clauses: &[Clause], selection: Selection) -> Result<Node> {
    let mut by_field: IndexMap<&str, Vec<Clause>> = IndexMap::new();
    for clause in clauses {
        if let Some(rest) = clause.descend() {
            by_field.entry(clause.head()).or_default().push(rest);
        }
    }
    if by_field.is_empty() {
        return Ok(node.clone());
    }

    let mut fields = IndexMap::with_capacity(node.len());
    for field in node.fields() {
        let name = field.name();
        let Some(nested) = by_field.get(name) else {
            fields.insert(name.to_string(), field.clone());
            continue;
        };
        let content = match field.content() {
            FieldContent::Dataset(dataset) => {
                trace!(field = name, clauses = nested.len(), "cascade into dataset");
                FieldContent::Dataset(dataset.select(nested, selection, true)?)
            }
            FieldContent::Node(child) => FieldContent::Node(rebuild(child, nested, selection)?),
            // Resolution already rejected paths through value fields
            FieldContent::Scalar(_) | FieldContent::Array(_) => field.content().clone(),
        };
        fields.insert(name.to_string(), Field::with_content(name, content));
    }
    Ok(Node::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use serde_json::json;

    fn donut() -> Node {
        Node::from_record(&json!({
            "id": "0001",
            "batters": {
                "batter": [
                    {"id": "1001", "type": "Regular"},
                    {"id": "1002", "type": "Chocolate"}
                ]
            },
            "topping": [
                {"id": "5001", "type": "None"},
                {"id": "5002", "type": "Glazed"},
                {"id": "5005", "type": "Sugar"}
            ]
        }))
        .unwrap()
    }

    fn clauses(query: impl Into<Query>) -> Vec<Clause> {
        query.into().compile().unwrap()
    }

    #[test]
    fn selection_retains() {
        assert!(Selection::Keep.retains(true));
        assert!(!Selection::Keep.retains(false));
        assert!(Selection::Drop.retains(false));
    }

    #[test]
    fn value_clauses_leave_node_untouched() {
        let node = donut();
        let rebuilt = rebuild(&node, &clauses([("id", "0001")]), Selection::Keep).unwrap();
        assert_eq!(rebuilt, node);
    }

    #[test]
    fn narrows_related_datasets() {
        let rebuilt = rebuild(&donut(), &clauses([("topping__type", "Glazed")]), Selection::Keep)
            .unwrap();
        let topping = rebuilt.get("topping").unwrap().as_dataset().unwrap();
        assert_eq!(topping.len(), 1);
        assert_eq!(topping[0].get("id").unwrap().as_str(), Some("5002"));

        // Other related fields are kept as they were
        assert_eq!(
            rebuilt.get("batters").unwrap(),
            donut().get("batters").unwrap()
        );
    }

    #[test]
    fn recurses_through_nested_nodes() {
        let rebuilt = rebuild(
            &donut(),
            &clauses([("batters__batter__type", "Chocolate")]),
            Selection::Keep,
        )
        .unwrap();
        let batter = rebuilt
            .get("batters")
            .unwrap()
            .as_node()
            .unwrap()
            .get("batter")
            .unwrap()
            .as_dataset()
            .unwrap();
        assert_eq!(batter.len(), 1);
        assert_eq!(batter[0].get("id").unwrap().as_str(), Some("1002"));
    }

    #[test]
    fn drop_removes_matching_children() {
        let rebuilt = rebuild(
            &donut(),
            &clauses([("topping__type__in", ["None", "Sugar"])]),
            Selection::Drop,
        )
        .unwrap();
        let topping = rebuilt.get("topping").unwrap().as_dataset().unwrap();
        let ids: Vec<_> = topping.iter().map(|n| n.get("id").unwrap().as_str()).collect();
        assert_eq!(ids, [Some("5002")]);
    }

    #[test]
    fn field_order_is_preserved() {
        let rebuilt = rebuild(&donut(), &clauses([("topping__id", "5001")]), Selection::Keep)
            .unwrap();
        assert_eq!(
            rebuilt.field_names().collect::<Vec<_>>(),
            ["id", "batters", "topping"]
        );
    }
}

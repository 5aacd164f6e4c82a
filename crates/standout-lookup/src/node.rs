//! A classified record.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::{LookupError, Result};
use crate::field::Field;
use crate::path::LOOKUP_SEP;
use crate::query::Query;

/// One record, with every member classified into a [`Field`].
///
/// Fields keep the key order of the source record. A node is immutable once
/// built; filtering returns new nodes and datasets. The field table is
/// reference counted, so cloning a node is cheap.
///
/// Equality is structural: two nodes are equal when they hold the same
/// named fields with equal content, regardless of field order.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use standout_lookup::Node;
///
/// let node = Node::from_record(&json!({
///     "author": "Agatha Christie",
///     "books": [{"name": "And Then There Were None", "published": "1939"}]
/// }))
/// .unwrap();
///
/// assert_eq!(node.get("author").unwrap().as_str(), Some("Agatha Christie"));
/// assert!(node.filter([("books__published", "1939")]).is_ok());
/// assert!(node.filter([("books__published", "1999")]).is_err());
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Node {
    fields: Arc<IndexMap<String, Field>>,
}

impl Node {
    /// Builds a node from a record, which must be a JSON object.
    pub fn from_record(record: &Json) -> Result<Node> {
        match record {
            Json::Object(map) => Node::build(map, 0),
            other => Err(LookupError::MalformedRecord(format!(
                "a node must be built from an object, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Builds a node from a JSON object's members.
    pub fn from_map(map: &Map<String, Json>) -> Result<Node> {
        Node::build(map, 0)
    }

    pub(crate) fn build(map: &Map<String, Json>, depth: usize) -> Result<Node> {
        let fields = map
            .iter()
            .map(|(key, value)| Ok((key.clone(), Field::classify(key.clone(), value, depth)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Node::from_fields(fields))
    }

    pub(crate) fn from_fields(fields: IndexMap<String, Field>) -> Node {
        Node {
            fields: Arc::new(fields),
        }
    }

    /// Returns the field with the given name.
    ///
    /// Fails with [`LookupError::UnknownField`] if the node has no such field.
    pub fn get(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| LookupError::UnknownField {
                field: name.to_string(),
                available: self.field_names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Returns the field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterates over fields in source order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Iterates over field names in source order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` for a node without fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Tests the node against the conjunction of the query's predicates.
    pub fn matches(&self, query: impl Into<Query>) -> Result<bool> {
        query.into().matches(self)
    }

    /// Returns this node if it satisfies every predicate of the query.
    ///
    /// Unlike [`Dataset::filter`](crate::Dataset::filter), a miss is an
    /// error: [`LookupError::ObjectNotFound`].
    pub fn filter(&self, query: impl Into<Query>) -> Result<Node> {
        if self.matches(query)? {
            Ok(self.clone())
        } else {
            Err(LookupError::ObjectNotFound)
        }
    }

    /// Converts the node back to a plain JSON object.
    pub fn values(&self) -> Map<String, Json> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.to_json()))
            .collect()
    }

    /// Lists every field path that can be used as a query key.
    ///
    /// Related fields contribute their own name plus the paths of their
    /// nested nodes, joined with `__`. Paths are listed once, in the order
    /// they are first seen.
    ///
    /// ```
    /// use serde_json::json;
    /// use standout_lookup::Node;
    ///
    /// let node = Node::from_record(&json!({"id": 1, "configs": {"name": "c"}})).unwrap();
    /// assert_eq!(node.paths(), ["id", "configs", "configs__name"]);
    /// ```
    pub fn paths(&self) -> Vec<String> {
        let mut paths = IndexSet::new();
        self.collect_paths("", &mut paths);
        paths.into_iter().collect()
    }

    fn collect_paths(&self, prefix: &str, paths: &mut IndexSet<String>) {
        for (name, field) in self.fields.iter() {
            let path = format!("{prefix}{name}");
            paths.insert(path.clone());
            for child in field.related_nodes() {
                child.collect_paths(&format!("{path}{LOOKUP_SEP}"), paths);
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(name, field)| (name, field.content())))
            .finish()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(name, field)| (name, field.to_json())))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = Json::deserialize(deserializer)?;
        Node::from_record(&record).map_err(D::Error::custom)
    }
}

pub(crate) fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, Shape};
    use crate::value::Scalar;
    use serde_json::json;

    fn sample() -> Json {
        json!({
            "id": 1,
            "name": "test",
            "configs": {"name": "config_1"},
            "group": ["group_1", "group_2"],
            "modes": [
                {"name": "mode_1"},
                {"name": "mode_2"},
                {"name": "mode_3"}
            ]
        })
    }

    #[test]
    fn populate_node() {
        let node = Node::from_record(&sample()).unwrap();
        assert_eq!(node.len(), 5);
        assert_eq!(node.get("id").unwrap().as_scalar(), Some(&Scalar::from(1i64)));

        let kinds: Vec<_> = node.fields().map(Field::kind).collect();
        assert_eq!(
            kinds.iter().filter(|k| **k == FieldKind::Value).count(),
            3
        );
        let shapes: Vec<_> = node.fields().map(Field::shape).collect();
        assert_eq!(
            shapes,
            [Shape::Scalar, Shape::Scalar, Shape::Node, Shape::Array, Shape::Dataset]
        );
    }

    #[test]
    fn non_object_records_are_rejected() {
        let err = Node::from_record(&json!([])).unwrap_err();
        assert!(matches!(err, LookupError::MalformedRecord(_)));
    }

    #[test]
    fn empty_record_is_valid() {
        let node = Node::from_record(&json!({})).unwrap();
        assert!(node.is_empty());
        assert!(node.values().is_empty());
    }

    #[test]
    fn unknown_field_lists_available_fields() {
        let node = Node::from_record(&json!({"a": 1, "b": 2})).unwrap();
        match node.get("c").unwrap_err() {
            LookupError::UnknownField { field, available } => {
                assert_eq!(field, "c");
                assert_eq!(available, "a, b");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(node.field("c").is_none());
    }

    #[test]
    fn values_round_trip_in_source_order() {
        let node = Node::from_record(&sample()).unwrap();
        assert_eq!(Json::Object(node.values()), sample());
        let keys: Vec<_> = node.field_names().collect();
        assert_eq!(keys, ["id", "name", "configs", "group", "modes"]);
    }

    #[test]
    fn paths_cover_related_fields() {
        let node = Node::from_record(&sample()).unwrap();
        assert_eq!(
            node.paths(),
            ["id", "name", "configs", "configs__name", "group", "modes", "modes__name"]
        );
    }

    #[test]
    fn equality_is_structural_and_order_insensitive() {
        let a = Node::from_record(&json!({"x": 1, "y": [1, 2]})).unwrap();
        let b = Node::from_record(&json!({"y": [1, 2], "x": 1})).unwrap();
        let c = Node::from_record(&json!({"x": 2, "y": [1, 2]})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn filter_returns_self_or_not_found() {
        let node = Node::from_record(&sample()).unwrap();
        assert_eq!(node.filter([("name", "test")]).unwrap(), node);
        assert!(matches!(
            node.filter([("name", "other")]),
            Err(LookupError::ObjectNotFound)
        ));
        assert_eq!(node.filter(Query::new()).unwrap(), node);
    }

    #[test]
    fn serde_round_trip() {
        let node: Node = serde_json::from_value(sample()).unwrap();
        assert_eq!(serde_json::to_value(&node).unwrap(), sample());
        assert!(serde_json::from_value::<Node>(json!("x")).is_err());
    }
}

//! Classified fields and the value classifier.
//!
//! Every member of a record becomes a [`Field`] when its node is built. The
//! classifier decides once, from the runtime shape of the raw value, whether
//! the field holds a plain value or a related record:
//!
//! | Raw value | Field |
//! |---|---|
//! | string, number, bool, null | value field holding a [`Scalar`] |
//! | array of scalars | value field holding an array |
//! | object | related field holding a [`Node`] |
//! | array of objects (or empty array) | related field holding a [`Dataset`] |
//!
//! Arrays mixing objects with scalars, and arrays of arrays, are rejected
//! with [`LookupError::MalformedRecord`].

use serde_json::Value as Json;

use crate::dataset::Dataset;
use crate::error::{LookupError, Result};
use crate::node::Node;
use crate::path::LOOKUP_SEP;
use crate::value::Scalar;

/// Maximum nesting depth accepted when building nodes from records.
pub const MAX_DEPTH: usize = 128;

/// Whether a field holds a value or a related record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A scalar or an array of scalars.
    Value,
    /// A nested node or dataset.
    Related,
}

/// The runtime shape of a field's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single scalar.
    Scalar,
    /// An array of scalars.
    Array,
    /// One nested record.
    Node,
    /// An array of nested records.
    Dataset,
}

impl Shape {
    /// Returns the field kind of this shape.
    pub fn kind(self) -> FieldKind {
        match self {
            Shape::Scalar | Shape::Array => FieldKind::Value,
            Shape::Node | Shape::Dataset => FieldKind::Related,
        }
    }

    /// Returns the display name of this shape.
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Array => "array",
            Shape::Node => "node",
            Shape::Dataset => "dataset",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of a classified field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldContent {
    /// A single scalar value.
    Scalar(Scalar),
    /// An array of scalars.
    Array(Vec<Scalar>),
    /// A nested record.
    Node(Node),
    /// An array of nested records.
    Dataset(Dataset),
}

/// A named, classified member of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    content: FieldContent,
}

impl Field {
    /// Classifies a raw value into a field.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use standout_lookup::{Field, FieldKind, Shape};
    ///
    /// let genres = Field::new("genres", &json!(["Fantasy", "Drama"])).unwrap();
    /// assert_eq!(genres.shape(), Shape::Array);
    ///
    /// let books = Field::new("books", &json!([{"name": "Sourcery"}])).unwrap();
    /// assert_eq!(books.kind(), FieldKind::Related);
    /// ```
    pub fn new(name: impl Into<String>, value: &Json) -> Result<Field> {
        Field::classify(name.into(), value, 0)
    }

    pub(crate) fn classify(name: String, value: &Json, depth: usize) -> Result<Field> {
        if name.contains(LOOKUP_SEP) {
            return Err(LookupError::MalformedRecord(format!(
                "field name '{name}' must not contain '{LOOKUP_SEP}'"
            )));
        }
        if depth > MAX_DEPTH {
            return Err(LookupError::MalformedRecord(format!(
                "field '{name}' is nested deeper than {MAX_DEPTH} levels"
            )));
        }

        let content = match value {
            Json::Object(map) => FieldContent::Node(Node::build(map, depth + 1)?),
            Json::Array(items) => classify_array(&name, items, depth)?,
            scalar => FieldContent::Scalar(Scalar::from_json(scalar).unwrap_or(Scalar::Null)),
        };
        Ok(Field { name, content })
    }

    pub(crate) fn with_content(name: impl Into<String>, content: FieldContent) -> Field {
        Field {
            name: name.into(),
            content,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the classified content.
    pub fn content(&self) -> &FieldContent {
        &self.content
    }

    /// Returns the runtime shape of the content.
    pub fn shape(&self) -> Shape {
        match self.content {
            FieldContent::Scalar(_) => Shape::Scalar,
            FieldContent::Array(_) => Shape::Array,
            FieldContent::Node(_) => Shape::Node,
            FieldContent::Dataset(_) => Shape::Dataset,
        }
    }

    /// Returns whether this is a value or a related field.
    pub fn kind(&self) -> FieldKind {
        self.shape().kind()
    }

    /// Returns `true` for fields holding a nested node or dataset.
    pub fn is_related(&self) -> bool {
        self.kind() == FieldKind::Related
    }

    /// Returns the value view of a value field, `None` for related fields.
    pub fn value_ref(&self) -> Option<ValueRef<'_>> {
        match &self.content {
            FieldContent::Scalar(s) => Some(ValueRef::Scalar(s)),
            FieldContent::Array(items) => Some(ValueRef::Array(items)),
            FieldContent::Node(_) | FieldContent::Dataset(_) => None,
        }
    }

    /// Extracts the scalar, if this is a scalar field.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.content {
            FieldContent::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the string, if this is a string scalar field.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Extracts the items, if this is an array field.
    pub fn as_array(&self) -> Option<&[Scalar]> {
        match &self.content {
            FieldContent::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extracts the nested node, if this is a single related record.
    pub fn as_node(&self) -> Option<&Node> {
        match &self.content {
            FieldContent::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Extracts the nested dataset, if this is a related array of records.
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match &self.content {
            FieldContent::Dataset(dataset) => Some(dataset),
            _ => None,
        }
    }

    /// Returns the nested nodes of a related field.
    ///
    /// A single related node is returned as a one-element slice; value
    /// fields return an empty slice.
    pub fn related_nodes(&self) -> &[Node] {
        match &self.content {
            FieldContent::Node(node) => std::slice::from_ref(node),
            FieldContent::Dataset(dataset) => dataset.nodes(),
            FieldContent::Scalar(_) | FieldContent::Array(_) => &[],
        }
    }

    /// Converts the field content back to plain JSON.
    pub fn to_json(&self) -> Json {
        match &self.content {
            FieldContent::Scalar(s) => s.to_json(),
            FieldContent::Array(items) => Json::Array(items.iter().map(Scalar::to_json).collect()),
            FieldContent::Node(node) => Json::Object(node.values()),
            FieldContent::Dataset(dataset) => {
                Json::Array(dataset.values().into_iter().map(Json::Object).collect())
            }
        }
    }
}

fn classify_array(name: &str, items: &[Json], depth: usize) -> Result<FieldContent> {
    if items.iter().all(Json::is_object) {
        // Empty arrays land here as an empty related dataset; array lookups
        // still read them as an empty array.
        return Ok(FieldContent::Dataset(Dataset::build(items, depth + 1)?));
    }

    items
        .iter()
        .map(|item| {
            Scalar::from_json(item).ok_or_else(|| {
                LookupError::MalformedRecord(format!(
                    "field '{name}' mixes records with scalars or nests arrays"
                ))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(FieldContent::Array)
}

/// Borrowed view of a value field, handed to lookup predicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    /// A scalar field.
    Scalar(&'a Scalar),
    /// An array field.
    Array(&'a [Scalar]),
}

impl<'a> ValueRef<'a> {
    /// Returns the shape of the viewed field.
    pub fn shape(self) -> Shape {
        match self {
            ValueRef::Scalar(_) => Shape::Scalar,
            ValueRef::Array(_) => Shape::Array,
        }
    }

    /// Extracts the scalar, if present.
    pub fn as_scalar(self) -> Option<&'a Scalar> {
        match self {
            ValueRef::Scalar(s) => Some(s),
            ValueRef::Array(_) => None,
        }
    }

    /// Extracts the array items, if present.
    pub fn as_array(self) -> Option<&'a [Scalar]> {
        match self {
            ValueRef::Array(items) => Some(items),
            ValueRef::Scalar(_) => None,
        }
    }

    /// Returns `true` if the value is a null scalar.
    pub fn is_null(self) -> bool {
        matches!(self, ValueRef::Scalar(Scalar::Null))
    }
}

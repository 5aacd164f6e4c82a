//! Ordered collections of nodes and the query surface.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::{BitOr, Index};
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::cascade::{rebuild, Selection};
use crate::clause::Clause;
use crate::error::{LookupError, Result};
use crate::node::{json_type_name, Node};
use crate::query::{matches_all, Query};

/// Number of nodes shown by `Debug` before the output is truncated.
pub const DEBUG_OUTPUT_SIZE: usize = 20;

/// An ordered sequence of [`Node`]s.
///
/// Every query operation returns a new dataset and leaves the receiver
/// untouched. Result order always follows the order of the input.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use standout_lookup::Dataset;
///
/// let authors = Dataset::from_value(&json!([
///     {"author": "J. K. Rowling", "books": [{"name": "Chamber of Secrets", "published": "1998"}]},
///     {"author": "Agatha Christie", "books": [{"name": "Murder on the Orient Express", "published": "1934"}]}
/// ]))
/// .unwrap();
///
/// let modern = authors.filter([("books__published__gt", "1950")]).unwrap();
/// assert_eq!(modern.len(), 1);
/// assert_eq!(modern[0].get("author").unwrap().as_str(), Some("J. K. Rowling"));
/// ```
#[derive(Clone, Default)]
pub struct Dataset {
    nodes: Vec<Node>,
    cascade: bool,
}

impl Dataset {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Builds a dataset from records, each of which must be a JSON object.
    pub fn from_records(records: &[Json]) -> Result<Dataset> {
        Dataset::build(records, 0)
    }

    /// Builds a dataset from one record or an array of records.
    pub fn from_value(value: &Json) -> Result<Dataset> {
        match value {
            Json::Object(map) => Ok(Dataset::from_nodes(vec![Node::from_map(map)?])),
            Json::Array(items) => Dataset::from_records(items),
            other => Err(LookupError::MalformedRecord(format!(
                "a dataset must be built from an object or an array of objects, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Wraps already built nodes.
    pub fn from_nodes(nodes: Vec<Node>) -> Dataset {
        Dataset {
            nodes,
            cascade: false,
        }
    }

    /// Parses JSON text holding one record or an array of records.
    pub fn from_json_str(text: &str) -> Result<Dataset> {
        let value: Json = serde_json::from_str(text)?;
        Dataset::from_value(&value)
    }

    /// Reads JSON holding one record or an array of records.
    pub fn from_reader<R: Read>(reader: R) -> Result<Dataset> {
        let value: Json = serde_json::from_reader(reader)?;
        Dataset::from_value(&value)
    }

    /// Reads a JSON file holding one record or an array of records.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading dataset");
        let file = File::open(path)?;
        Dataset::from_reader(BufReader::new(file))
    }

    pub(crate) fn build(items: &[Json], depth: usize) -> Result<Dataset> {
        let nodes = items
            .iter()
            .map(|item| match item {
                Json::Object(map) => Node::build(map, depth),
                other => Err(LookupError::MalformedRecord(format!(
                    "dataset members must be objects, got {}",
                    json_type_name(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Dataset::from_nodes(nodes))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Keeps the nodes that satisfy every predicate of the query.
    ///
    /// An empty query returns the whole dataset. Errors raised while
    /// evaluating any node abort the whole call.
    pub fn filter(&self, query: impl Into<Query>) -> Result<Dataset> {
        let query = query.into();
        let clauses = query.compile()?;
        let result = self.select(&clauses, Selection::Keep, self.cascade)?;
        debug!(
            predicates = query.len(),
            nodes = self.len(),
            cascade = self.cascade,
            matched = result.len(),
            "filter"
        );
        Ok(result)
    }

    /// Keeps the nodes that do not satisfy the conjunction of the query.
    ///
    /// An empty query excludes nothing.
    pub fn exclude(&self, query: impl Into<Query>) -> Result<Dataset> {
        let query = query.into();
        let clauses = query.compile()?;
        let result = self.select(&clauses, Selection::Drop, self.cascade)?;
        debug!(
            predicates = query.len(),
            nodes = self.len(),
            cascade = self.cascade,
            matched = result.len(),
            "exclude"
        );
        Ok(result)
    }

    /// Filters the nested nodes of a related field across every node.
    ///
    /// `name` is a related field of each node, or a dotted chain of related
    /// fields (`batters.batter`) to reach deeper levels. Results are
    /// concatenated in parent order; a single related node counts as a
    /// one-element dataset.
    ///
    /// # Errors
    ///
    /// - [`LookupError::UnknownField`] if a node lacks the field
    /// - [`LookupError::InvalidPath`] if the name is malformed or resolves
    ///   to a value field
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use standout_lookup::Dataset;
    ///
    /// let authors = Dataset::from_value(&json!([
    ///     {"author": "Terry Pratchett", "books": [{"name": "Sourcery"}, {"name": "Eric"}]},
    ///     {"author": "Jane Austen", "books": [{"name": "Emma"}]}
    /// ]))
    /// .unwrap();
    ///
    /// let short = authors.filter_related("books", [("name__len", 4)]);
    /// assert!(short.is_err()); // `len` applies to arrays only
    ///
    /// let e = authors.filter_related("books", [("name__startswith", "E")]).unwrap();
    /// assert_eq!(e.len(), 2);
    /// ```
    pub fn filter_related(&self, name: &str, query: impl Into<Query>) -> Result<Dataset> {
        debug!(field = name, nodes = self.len(), "filter_related");
        let mut nodes = self.nodes.clone();
        for segment in name.split('.') {
            if segment.is_empty() {
                return Err(LookupError::invalid_path(name, "related field name has an empty segment"));
            }
            let mut next = Vec::new();
            for node in &nodes {
                let field = node.get(segment)?;
                if !field.is_related() {
                    return Err(LookupError::invalid_path(
                        name,
                        format!("'{segment}' is a value field"),
                    ));
                }
                next.extend(field.related_nodes().iter().cloned());
            }
            nodes = next;
        }
        Dataset {
            nodes,
            cascade: self.cascade,
        }
        .filter(query)
    }

    /// Returns a copy of the dataset whose next `filter` or `exclude` also
    /// narrows the related datasets reached by the query.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use standout_lookup::Dataset;
    ///
    /// let authors = Dataset::from_value(&json!([
    ///     {"author": "Jane Austen", "books": [
    ///         {"name": "Emma", "published": "1815"},
    ///         {"name": "Persuasion", "published": "1817"}
    ///     ]}
    /// ]))
    /// .unwrap();
    ///
    /// let plain = authors.filter([("books__published", "1817")]).unwrap();
    /// assert_eq!(plain[0].get("books").unwrap().related_nodes().len(), 2);
    ///
    /// let narrowed = authors.on_cascade().filter([("books__published", "1817")]).unwrap();
    /// assert_eq!(narrowed[0].get("books").unwrap().related_nodes().len(), 1);
    /// assert!(!narrowed.is_cascading());
    /// ```
    pub fn on_cascade(&self) -> Dataset {
        Dataset {
            nodes: self.nodes.clone(),
            cascade: true,
        }
    }

    /// Evaluates compiled clauses against every node.
    pub(crate) fn select(
        &self,
        clauses: &[Clause],
        selection: Selection,
        cascade: bool,
    ) -> Result<Dataset> {
        if clauses.is_empty() {
            return Ok(Dataset::from_nodes(self.nodes.clone()));
        }
        let mut nodes = Vec::new();
        for node in &self.nodes {
            if !selection.retains(matches_all(clauses, node)?) {
                continue;
            }
            nodes.push(if cascade {
                rebuild(node, clauses, selection)?
            } else {
                node.clone()
            });
        }
        Ok(Dataset::from_nodes(nodes))
    }

    // ========================================================================
    // Combination
    // ========================================================================

    /// Ordered union: the distinct nodes of `self`, followed by the nodes of
    /// `other` not already present.
    ///
    /// Also available as `&a | &b`.
    pub fn union(&self, other: &Dataset) -> Dataset {
        let mut merged = self.distinct().nodes;
        for node in &other.nodes {
            if !merged.contains(node) {
                merged.push(node.clone());
            }
        }
        debug!(left = self.len(), right = other.len(), merged = merged.len(), "union");
        Dataset::from_nodes(merged)
    }

    /// Drops structurally equal duplicates; the first occurrence wins.
    pub fn distinct(&self) -> Dataset {
        let mut unique: Vec<Node> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !unique.contains(node) {
                unique.push(node.clone());
            }
        }
        Dataset::from_nodes(unique)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Converts every node back to a plain JSON object.
    pub fn values(&self) -> Vec<Map<String, Json>> {
        self.nodes.iter().map(Node::values).collect()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` for an empty dataset.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `index`.
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Returns the first node.
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Returns the last node.
    pub fn last(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Iterates over nodes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Returns the nodes as a slice.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns `true` if the next `filter` or `exclude` cascades.
    pub fn is_cascading(&self) -> bool {
        self.cascade
    }
}

/// Datasets are equal when they hold equal nodes in the same order. The
/// cascade flag is not compared.
impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Index<usize> for Dataset {
    type Output = Node;

    fn index(&self, index: usize) -> &Node {
        &self.nodes[index]
    }
}

impl BitOr for &Dataset {
    type Output = Dataset;

    fn bitor(self, other: &Dataset) -> Dataset {
        self.union(other)
    }
}

impl BitOr for Dataset {
    type Output = Dataset;

    fn bitor(self, other: Dataset) -> Dataset {
        self.union(&other)
    }
}

impl From<Vec<Node>> for Dataset {
    fn from(nodes: Vec<Node>) -> Self {
        Dataset::from_nodes(nodes)
    }
}

impl FromIterator<Node> for Dataset {
    fn from_iter<I: IntoIterator<Item = Node>>(nodes: I) -> Self {
        Dataset::from_nodes(nodes.into_iter().collect())
    }
}

impl IntoIterator for Dataset {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dataset ")?;
        let mut list = f.debug_list();
        list.entries(self.nodes.iter().take(DEBUG_OUTPUT_SIZE));
        if self.nodes.len() > DEBUG_OUTPUT_SIZE {
            list.entry(&format_args!("...(remaining elements truncated)..."));
        }
        list.finish()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.nodes)
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        Dataset::from_value(&value).map_err(D::Error::custom)
    }
}

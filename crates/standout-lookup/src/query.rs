//! Query builder.
//!
//! A [`Query`] is an ordered mapping from compound keys to operands. All of
//! its predicates must hold for a node to match; there is no OR or NOT
//! inside a single query. Alternatives are expressed by filtering twice
//! and taking the [`union`](crate::Dataset::union) of the results, negation
//! with [`exclude`](crate::Dataset::exclude).

use indexmap::IndexMap;

use crate::clause::{Clause, Operand};
use crate::error::Result;
use crate::node::Node;
use crate::registry::{with_registry, LookupRegistry};

/// A conjunction of `key -> operand` predicates.
///
/// Most callers never name this type: every filtering method accepts
/// anything that converts into a query, including arrays of pairs.
///
/// # Example
///
/// ```
/// use standout_lookup::Query;
///
/// let query = Query::new()
///     .and("books__published__gte", "1998")
///     .and("genres__contains", "Fantasy")
///     .and("author__in", ["J. K. Rowling", "Terry Pratchett"]);
/// assert_eq!(query.len(), 3);
///
/// // Same predicates, pair syntax
/// let same = Query::from([("author__startswith", "J.")]);
/// assert_eq!(same.keys().collect::<Vec<_>>(), ["author__startswith"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    predicates: IndexMap<String, Operand>,
}

impl Query {
    /// Creates a new empty query.
    ///
    /// An empty query matches every node.
    pub fn new() -> Self {
        Query::default()
    }

    /// Adds a predicate. A key already present is replaced in place.
    pub fn and(mut self, key: impl Into<String>, operand: impl Into<Operand>) -> Self {
        self.predicates.insert(key.into(), operand.into());
        self
    }

    /// Returns the operand for a key.
    pub fn get(&self, key: &str) -> Option<&Operand> {
        self.predicates.get(key)
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    /// Iterates over `(key, operand)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.predicates.iter().map(|(key, operand)| (key.as_str(), operand))
    }

    /// Returns the number of predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns `true` if the query has no predicates.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Parses every key against the process-wide registry.
    ///
    /// The registry is read once; the returned clauses own their lookups.
    pub fn compile(&self) -> Result<Vec<Clause>> {
        with_registry(|registry| self.compile_with(registry))
    }

    /// Parses every key against the given registry.
    pub fn compile_with(&self, registry: &LookupRegistry) -> Result<Vec<Clause>> {
        self.predicates
            .iter()
            .map(|(key, operand)| Clause::parse_with(registry, key, operand.clone()))
            .collect()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Tests a node against every predicate.
    pub fn matches(&self, node: &Node) -> Result<bool> {
        matches_all(&self.compile()?, node)
    }
}

/// Returns `true` if every clause holds for the node.
///
/// Every clause is evaluated, even after one has failed, so an error in any
/// of them is raised whatever the outcome of the others.
pub(crate) fn matches_all(clauses: &[Clause], node: &Node) -> Result<bool> {
    let mut all = true;
    for clause in clauses {
        all &= clause.matches(node)?;
    }
    Ok(all)
}

impl<K: Into<String>, V: Into<Operand>, const N: usize> From<[(K, V); N]> for Query {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Operand>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        pairs
            .into_iter()
            .fold(Query::new(), |query, (key, operand)| query.and(key, operand))
    }
}

impl From<&Query> for Query {
    fn from(query: &Query) -> Self {
        query.clone()
    }
}

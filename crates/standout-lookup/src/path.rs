//! Compound keys and their resolution against nodes.
//!
//! A query key such as `books__published__gt` names a path through the
//! record (`books`, then `published`) followed by an optional lookup
//! (`gt`). Segments are separated by [`LOOKUP_SEP`].
//!
//! When the path crosses a related dataset, the rest of the path is
//! evaluated against every node of that dataset and the results are OR-ed:
//! `books__published__gt=2000` holds when *any* book was published after
//! 2000.

use regex::Regex;
use tracing::trace;

use crate::clause::Operand;
use crate::error::{LookupError, Result};
use crate::field::{FieldContent, Shape, ValueRef};
use crate::node::Node;
use crate::op::Op;
use crate::registry::{with_registry, Lookup, LookupRegistry};

/// Separator between path segments and the trailing lookup name.
pub const LOOKUP_SEP: &str = "__";

/// A parsed compound key: field segments plus the lookup to apply.
///
/// A trailing segment that names a registered lookup is always taken as the
/// lookup. To compare a field that happens to share a lookup's name, spell
/// the lookup out: `in__exact`.
///
/// # Example
///
/// ```
/// use standout_lookup::KeyPath;
///
/// let path = KeyPath::parse("author__books__name__icontains").unwrap();
/// assert_eq!(path.segments(), ["author", "books", "name"]);
/// assert_eq!(path.lookup().name(), "icontains");
///
/// // No trailing lookup means exact equality
/// assert_eq!(KeyPath::parse("author").unwrap().lookup().name(), "exact");
/// ```
#[derive(Debug, Clone)]
pub struct KeyPath {
    key: String,
    segments: Vec<String>,
    lookup: Lookup,
}

impl KeyPath {
    /// Parses a key against the process-wide lookup registry.
    pub fn parse(key: &str) -> Result<KeyPath> {
        with_registry(|registry| KeyPath::parse_with(registry, key))
    }

    /// Parses a key against the given registry.
    pub fn parse_with(registry: &LookupRegistry, key: &str) -> Result<KeyPath> {
        if key.is_empty() {
            return Err(LookupError::invalid_path(key, "key is empty"));
        }

        let mut segments: Vec<String> = key.split(LOOKUP_SEP).map(str::to_string).collect();
        let explicit = segments
            .last()
            .and_then(|last| registry.get(last))
            .cloned();
        let lookup = match explicit {
            Some(lookup) => {
                segments.pop();
                lookup
            }
            // `exact` itself may have been overridden
            None => registry
                .get(Op::Exact.as_str())
                .cloned()
                .unwrap_or(Lookup::Builtin(Op::Exact)),
        };

        if segments.is_empty() {
            return Err(LookupError::invalid_path(key, "key names a lookup but no field"));
        }
        if segments.iter().any(String::is_empty) {
            return Err(LookupError::invalid_path(key, "key has an empty segment"));
        }

        Ok(KeyPath {
            key: key.to_string(),
            segments,
            lookup,
        })
    }

    /// Returns the key as written.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the field segments, without the lookup.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the lookup applied at the end of the path.
    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    pub(crate) fn head(&self) -> &str {
        &self.segments[0]
    }

    /// The path below the first segment, if any.
    pub(crate) fn tail(&self) -> Option<KeyPath> {
        if self.segments.len() < 2 {
            return None;
        }
        let rest = self.key[self.segments[0].len() + LOOKUP_SEP.len()..].to_string();
        Some(KeyPath {
            key: rest,
            segments: self.segments[1..].to_vec(),
            lookup: self.lookup.clone(),
        })
    }

    /// Evaluates the path against a node.
    ///
    /// Every node reached through a related dataset is evaluated, so an
    /// error in any of them is raised whatever their order.
    ///
    /// # Errors
    ///
    /// - [`LookupError::UnknownField`] if a segment is missing from the node
    ///   it is looked up in
    /// - [`LookupError::InvalidPath`] if a value field has segments left
    ///   after it
    /// - [`LookupError::UnsupportedLookup`] if the path ends on a related
    ///   field, or the lookup does not accept the field's shape
    /// - whatever the lookup itself raises
    pub fn resolve(&self, node: &Node, operand: &Operand) -> Result<bool> {
        let pattern = self.lookup.prepare(operand)?;
        self.resolve_with(node, operand, pattern.as_ref())
    }

    /// Evaluates the path with an operand pattern compiled ahead of time.
    pub(crate) fn resolve_with(
        &self,
        node: &Node,
        operand: &Operand,
        pattern: Option<&Regex>,
    ) -> Result<bool> {
        self.resolve_at(node, 0, operand, pattern)
    }

    fn resolve_at(
        &self,
        node: &Node,
        depth: usize,
        operand: &Operand,
        pattern: Option<&Regex>,
    ) -> Result<bool> {
        let name = &self.segments[depth];
        let field = node.get(name)?;
        let last = depth + 1 == self.segments.len();

        match field.content() {
            FieldContent::Scalar(scalar) if last => {
                self.lookup.apply_with(ValueRef::Scalar(scalar), operand, pattern)
            }
            FieldContent::Array(items) if last => {
                self.lookup.apply_with(ValueRef::Array(items), operand, pattern)
            }
            FieldContent::Scalar(_) | FieldContent::Array(_) => Err(LookupError::invalid_path(
                &self.key,
                format!("'{name}' is a value field and has no field '{}'", self.segments[depth + 1]),
            )),
            FieldContent::Node(_) if last => Err(self.lookup.unsupported(Shape::Node)),
            // `[]` is classified as a dataset but also reads as an empty array
            FieldContent::Dataset(dataset) if last && dataset.is_empty() => {
                if !self.lookup.accepts().allows(Shape::Array) {
                    return Err(self.lookup.unsupported(Shape::Dataset));
                }
                self.lookup.apply_with(ValueRef::Array(&[]), operand, pattern)
            }
            FieldContent::Dataset(_) if last => Err(self.lookup.unsupported(Shape::Dataset)),
            FieldContent::Node(child) => self.resolve_at(child, depth + 1, operand, pattern),
            FieldContent::Dataset(dataset) => {
                trace!(key = %self.key, field = %name, nodes = dataset.len(), "fan out");
                let mut any = false;
                for child in dataset.iter() {
                    any |= self.resolve_at(child, depth + 1, operand, pattern)?;
                }
                Ok(any)
            }
        }
    }
}

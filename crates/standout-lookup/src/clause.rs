//! Clause types for query predicates.
//!
//! A [`Clause`] is one compiled predicate: a parsed [`KeyPath`] (field
//! segments plus the lookup to apply) and the [`Operand`] to compare
//! against.

use regex::Regex;
use serde_json::Value as Json;

use crate::error::{LookupError, Result};
use crate::node::{json_type_name, Node};
use crate::path::KeyPath;
use crate::registry::{Lookup, LookupRegistry};
use crate::value::{Number, Scalar};

/// Owned right-hand side of a predicate.
///
/// Most lookups take a single scalar; `in`, `range`, `contained_by`,
/// `overlap` and the list form of `contains` take a list.
///
/// # Example
///
/// ```
/// use standout_lookup::{Operand, Scalar};
///
/// let name: Operand = "Emma".into();
/// assert_eq!(name.as_str(), Some("Emma"));
///
/// let bounds: Operand = (1990, 2000).into();
/// assert_eq!(bounds.as_list().map(|l| l.len()), Some(2));
///
/// let genres: Operand = vec!["Fantasy", "Thriller"].into();
/// assert_eq!(genres.as_list().unwrap()[1], Scalar::from("Thriller"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single scalar.
    Scalar(Scalar),
    /// A sequence of scalars.
    List(Vec<Scalar>),
}

impl Operand {
    /// Extracts the scalar, if this is a single value.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Operand::Scalar(s) => Some(s),
            Operand::List(_) => None,
        }
    }

    /// Extracts the items, if this is a list.
    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Operand::List(items) => Some(items),
            Operand::Scalar(_) => None,
        }
    }

    /// Extracts the string, if this is a single string value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Returns the operand as a slice: a scalar is a one-element list.
    pub fn items(&self) -> &[Scalar] {
        match self {
            Operand::Scalar(s) => std::slice::from_ref(s),
            Operand::List(items) => items,
        }
    }

    /// Name of the operand's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Operand::Scalar(s) => s.type_name(),
            Operand::List(_) => "list",
        }
    }
}

macro_rules! operand_from_scalar {
    ($($source:ty),+) => {
        $(
            impl From<$source> for Operand {
                fn from(value: $source) -> Self {
                    Operand::Scalar(Scalar::from(value))
                }
            }
        )+
    };
}

operand_from_scalar!(
    &str, String, &String, bool, Number, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize,
    f32, f64
);

impl From<Scalar> for Operand {
    fn from(value: Scalar) -> Self {
        Operand::Scalar(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Operand::Scalar(Scalar::from(value))
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Scalar>> From<&[T]> for Operand {
    fn from(values: &[T]) -> Self {
        Operand::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<A: Into<Scalar>, B: Into<Scalar>> From<(A, B)> for Operand {
    fn from((low, high): (A, B)) -> Self {
        Operand::List(vec![low.into(), high.into()])
    }
}

impl TryFrom<Json> for Operand {
    type Error = LookupError;

    /// Converts a JSON scalar or an array of scalars.
    fn try_from(value: Json) -> Result<Self> {
        if let Some(scalar) = Scalar::from_json(&value) {
            return Ok(Operand::Scalar(scalar));
        }
        match &value {
            Json::Array(items) => items
                .iter()
                .map(|item| {
                    Scalar::from_json(item).ok_or_else(|| {
                        LookupError::invalid_argument(
                            "operand",
                            format!("list items must be scalars, got {}", json_type_name(item)),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Operand::List),
            other => Err(LookupError::invalid_argument(
                "operand",
                format!("expected a scalar or a list, got {}", json_type_name(other)),
            )),
        }
    }
}

/// A single compiled predicate.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use standout_lookup::{Clause, Node};
///
/// let clause = Clause::parse("books__name__icontains", "prisoner".into()).unwrap();
/// assert_eq!(clause.path().segments(), ["books", "name"]);
/// assert_eq!(clause.lookup().name(), "icontains");
///
/// let node = Node::from_record(&json!({
///     "books": [{"name": "Harry Potter and the Prisoner of Azkaban"}]
/// }))
/// .unwrap();
/// assert!(clause.matches(&node).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Clause {
    path: KeyPath,
    operand: Operand,
    /// `regex`/`iregex` operand, compiled once when the clause is built.
    pattern: Option<Regex>,
}

impl Clause {
    /// Parses a compound key against the process-wide lookup registry.
    ///
    /// Fails with [`LookupError::InvalidPattern`] if a `regex` or `iregex`
    /// operand does not compile.
    pub fn parse(key: &str, operand: Operand) -> Result<Clause> {
        Clause::new(KeyPath::parse(key)?, operand)
    }

    /// Parses a compound key against the given registry.
    pub fn parse_with(registry: &LookupRegistry, key: &str, operand: Operand) -> Result<Clause> {
        Clause::new(KeyPath::parse_with(registry, key)?, operand)
    }

    fn new(path: KeyPath, operand: Operand) -> Result<Clause> {
        let pattern = path.lookup().prepare(&operand)?;
        Ok(Clause {
            path,
            operand,
            pattern,
        })
    }

    /// Returns the original key.
    pub fn key(&self) -> &str {
        self.path.key()
    }

    /// Returns the parsed path.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Returns the lookup applied at the end of the path.
    pub fn lookup(&self) -> &Lookup {
        self.path.lookup()
    }

    /// Returns the operand.
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Evaluates this clause against a node.
    pub fn matches(&self, node: &Node) -> Result<bool> {
        self.path.resolve_with(node, &self.operand, self.pattern.as_ref())
    }

    /// Returns the first field segment.
    pub(crate) fn head(&self) -> &str {
        self.path.head()
    }

    /// Returns the clause for the rest of the path below the first segment,
    /// or `None` if the path ends at the first segment.
    pub(crate) fn descend(&self) -> Option<Clause> {
        self.path.tail().map(|path| Clause {
            path,
            operand: self.operand.clone(),
            pattern: self.pattern.clone(),
        })
    }
}

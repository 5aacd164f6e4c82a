//! The lookup registry.
//!
//! A [`LookupRegistry`] maps lookup names to predicates. The process-wide
//! registry starts with every built-in [`Op`] and can be extended with
//! [`register_lookup`]:
//!
//! ```
//! use standout_lookup::{register_lookup, Accepts, Dataset, Operand, ValueRef};
//! use serde_json::json;
//!
//! // `word_count`: the string has exactly N whitespace-separated words
//! register_lookup("word_count", Accepts::SCALAR, |value: ValueRef<'_>, operand: &Operand| {
//!     let words = value.as_scalar().and_then(|s| s.as_str()).map(|s| s.split_whitespace().count());
//!     let wanted = operand.as_scalar().and_then(|s| s.as_number()).and_then(|n| n.as_u64());
//!     matches!((words, wanted), (Some(w), Some(n)) if w as u64 == n)
//! });
//!
//! let books = Dataset::from_value(&json!([{"name": "Watership Down"}, {"name": "Emma"}])).unwrap();
//! let found = books.filter([("name__word_count", 2)]).unwrap();
//! assert_eq!(found.len(), 1);
//! ```
//!
//! Registration is expected to happen at startup, before the registry is
//! read from several threads. Each query takes its own copy of the lookups
//! it names, so evaluation never holds the registry lock.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::clause::Operand;
use crate::error::{LookupError, Result};
use crate::field::{Shape, ValueRef};
use crate::op::Op;

/// The set of value-field shapes a lookup can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accepts {
    scalar: bool,
    array: bool,
}

impl Accepts {
    /// Scalar fields only.
    pub const SCALAR: Accepts = Accepts {
        scalar: true,
        array: false,
    };
    /// Array fields only.
    pub const ARRAY: Accepts = Accepts {
        scalar: false,
        array: true,
    };
    /// Scalar and array fields.
    pub const ANY: Accepts = Accepts {
        scalar: true,
        array: true,
    };

    /// Returns `true` if a field of this shape is accepted.
    ///
    /// Related shapes are never accepted.
    pub fn allows(self, shape: Shape) -> bool {
        match shape {
            Shape::Scalar => self.scalar,
            Shape::Array => self.array,
            Shape::Node | Shape::Dataset => false,
        }
    }
}

/// Signature of a custom lookup predicate.
pub type LookupFn = dyn Fn(ValueRef<'_>, &Operand) -> bool + Send + Sync;

/// A registered lookup.
#[derive(Clone)]
pub enum Lookup {
    /// One of the built-in operators.
    Builtin(Op),
    /// A lookup added with [`register_lookup`].
    Custom {
        /// Registered name.
        name: Arc<str>,
        /// Shapes the predicate accepts.
        accepts: Accepts,
        /// The predicate itself.
        predicate: Arc<LookupFn>,
    },
}

impl Lookup {
    /// Returns the registered name.
    pub fn name(&self) -> &str {
        match self {
            Lookup::Builtin(op) => op.as_str(),
            Lookup::Custom { name, .. } => name,
        }
    }

    /// Returns the accepted shapes.
    pub fn accepts(&self) -> Accepts {
        match self {
            Lookup::Builtin(op) => op.accepts(),
            Lookup::Custom { accepts, .. } => *accepts,
        }
    }

    /// Applies the lookup to a value field.
    ///
    /// Fails with [`LookupError::UnsupportedLookup`] if the field's shape is
    /// not accepted.
    pub fn apply(&self, value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
        self.apply_with(value, operand, None)
    }

    /// Compiles the operand pattern of `regex`/`iregex`, `None` for every
    /// other lookup.
    pub(crate) fn prepare(&self, operand: &Operand) -> Result<Option<Regex>> {
        match self {
            Lookup::Builtin(op) => op.prepare(operand),
            Lookup::Custom { .. } => Ok(None),
        }
    }

    pub(crate) fn apply_with(
        &self,
        value: ValueRef<'_>,
        operand: &Operand,
        pattern: Option<&Regex>,
    ) -> Result<bool> {
        if !self.accepts().allows(value.shape()) {
            return Err(self.unsupported(value.shape()));
        }
        match self {
            Lookup::Builtin(op) => op.eval_with(value, operand, pattern),
            Lookup::Custom { predicate, .. } => Ok(predicate(value, operand)),
        }
    }

    pub(crate) fn unsupported(&self, shape: Shape) -> LookupError {
        LookupError::UnsupportedLookup {
            lookup: self.name().to_string(),
            shape: shape.as_str(),
        }
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Builtin(op) => f.debug_tuple("Builtin").field(op).finish(),
            Lookup::Custom { name, accepts, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("accepts", accepts)
                .finish_non_exhaustive(),
        }
    }
}

/// A table of lookups by name, in registration order.
#[derive(Debug, Clone)]
pub struct LookupRegistry {
    entries: IndexMap<String, Lookup>,
}

impl LookupRegistry {
    /// Creates a registry holding every built-in lookup.
    pub fn builtin() -> Self {
        let entries = Op::ALL
            .into_iter()
            .map(|op| (op.as_str().to_string(), Lookup::Builtin(op)))
            .collect();
        LookupRegistry { entries }
    }

    /// Adds a lookup, replacing any entry with the same name.
    pub fn register<F>(&mut self, name: &str, accepts: Accepts, predicate: F)
    where
        F: Fn(ValueRef<'_>, &Operand) -> bool + Send + Sync + 'static,
    {
        let replaced = self
            .entries
            .insert(
                name.to_string(),
                Lookup::Custom {
                    name: Arc::from(name),
                    accepts,
                    predicate: Arc::new(predicate),
                },
            )
            .is_some();
        trace!(lookup = name, replaced, "registered lookup");
    }

    /// Returns the lookup registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Lookup> {
        self.entries.get(name)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for LookupRegistry {
    fn default() -> Self {
        LookupRegistry::builtin()
    }
}

static REGISTRY: Lazy<RwLock<LookupRegistry>> =
    Lazy::new(|| RwLock::new(LookupRegistry::builtin()));

/// Adds a lookup to the process-wide registry, replacing any entry with the
/// same name (built-ins included).
///
/// Names containing `__` can never be matched by a query key.
pub fn register_lookup<F>(name: &str, accepts: Accepts, predicate: F)
where
    F: Fn(ValueRef<'_>, &Operand) -> bool + Send + Sync + 'static,
{
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, accepts, predicate);
}

/// Lists the names in the process-wide registry, in registration order.
pub fn registered_lookups() -> Vec<String> {
    with_registry(|registry| registry.names().map(str::to_string).collect())
}

/// Returns `true` if `name` is in the process-wide registry.
pub fn is_registered(name: &str) -> bool {
    with_registry(|registry| registry.contains(name))
}

pub(crate) fn with_registry<R>(f: impl FnOnce(&LookupRegistry) -> R) -> R {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    f(&registry)
}

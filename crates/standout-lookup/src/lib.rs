//! Lookup - declarative field lookups over nested JSON-like records.
//!
//! Records are classified once into [`Node`]s, whose fields are either plain
//! values (scalars and arrays of scalars) or related records (a nested node,
//! or a nested [`Dataset`] of nodes). Queries are maps from compound keys to
//! operands:
//!
//! - Keys are field paths joined with `__`, optionally ending in a lookup:
//!   `books__published__gt`
//! - Keys without a lookup compare with `exact`
//! - All predicates of a query must hold (AND)
//! - Paths through a related dataset hold if they hold for any nested node
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use standout_lookup::{Dataset, Query};
//!
//! let authors = Dataset::from_value(&json!([
//!     {
//!         "author": "J. K. Rowling",
//!         "genres": ["Fantasy", "Drama"],
//!         "books": [
//!             {"name": "Harry Potter and the Chamber of Secrets", "published": "1998"},
//!             {"name": "Harry Potter and the Prisoner of Azkaban", "published": "1999"}
//!         ]
//!     },
//!     {
//!         "author": "Agatha Christie",
//!         "genres": ["Mystery"],
//!         "books": [
//!             {"name": "And Then There Were None", "published": "1939"}
//!         ]
//!     }
//! ]))
//! .unwrap();
//!
//! let query = Query::new()
//!     .and("genres__contains", "Fantasy")
//!     .and("books__name__icontains", "prisoner");
//! let found = authors.filter(query).unwrap();
//! assert_eq!(found.len(), 1);
//!
//! // Everyone else
//! let others = authors.exclude([("genres__contains", "Fantasy")]).unwrap();
//! assert_eq!(others[0].get("author").unwrap().as_str(), Some("Agatha Christie"));
//!
//! // Keep only the matching books inside each author
//! let narrowed = authors
//!     .on_cascade()
//!     .filter([("books__published", "1999")])
//!     .unwrap();
//! assert_eq!(narrowed.values()[0]["books"].as_array().unwrap().len(), 1);
//! ```
//!
//! # Lookups
//!
//! | Lookup | Field | Holds when |
//! |---|---|---|
//! | `exact`, `iexact` | any value | equal (case-folded) |
//! | `contains`, `icontains` | any value | substring, or array membership |
//! | `startswith`, `endswith` (+ `i` forms) | scalar | string prefix / suffix |
//! | `in` | any value | value (or any array element) in the operand |
//! | `gt`, `gte`, `lt`, `lte` | scalar | comparison with the operand |
//! | `range` | scalar | `low <= value <= high` |
//! | `isnull` | any value | value is null, matching the bool operand |
//! | `regex`, `iregex` | scalar | pattern matches anywhere |
//! | `contained_by` | array | every element in the operand |
//! | `overlap` | array | at least one element in the operand |
//! | `len` | array | length equals the operand |
//!
//! More lookups can be added with [`register_lookup`].

mod cascade;
mod clause;
mod dataset;
mod error;
mod field;
mod lookup;
mod node;
mod op;
mod ordering;
mod path;
mod query;
mod registry;
mod value;

// Re-export public API
pub use clause::{Clause, Operand};
pub use dataset::{Dataset, DEBUG_OUTPUT_SIZE};
pub use error::{LookupError, Result};
pub use field::{Field, FieldContent, FieldKind, Shape, ValueRef, MAX_DEPTH};
pub use node::Node;
pub use op::Op;
pub use ordering::compare_scalars;
pub use path::{KeyPath, LOOKUP_SEP};
pub use query::Query;
pub use registry::{
    is_registered, register_lookup, registered_lookups, Accepts, Lookup, LookupFn, LookupRegistry,
};
pub use value::{Number, Scalar};

//! Total ordering between scalars, used by the comparison lookups.

use std::cmp::Ordering;

use crate::value::Scalar;

/// Compares two scalars of the same kind.
///
/// Strings compare lexicographically, numbers by value across storage
/// variants, booleans with `false < true`. Returns `None` when the kinds
/// differ, when either side is null, or when a float comparison involves NaN.
pub fn compare_scalars(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    match (a, b) {
        (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
        (Scalar::Number(a), Scalar::Number(b)) => a.compare(*b),
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

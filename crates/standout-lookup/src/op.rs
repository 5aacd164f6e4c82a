//! Built-in lookup operators.
//!
//! The [`Op`] enum is the closed set of lookups every registry starts with.
//! Custom lookups live next to them in the
//! [`LookupRegistry`](crate::LookupRegistry) but are not part of this enum.

use std::cmp::Ordering;

use crate::registry::Accepts;

/// Built-in lookup operator.
///
/// Operators are grouped by the field shapes they accept:
/// - **Any value field**: `Exact`, `IExact`, `Contains`, `IContains`, `In`, `IsNull`
/// - **Scalar only**: string prefix/suffix/regex lookups, comparisons, `Range`
/// - **Array only**: `ContainedBy`, `Overlap`, `Len`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Structural equality. The default when a key names no lookup.
    Exact,
    /// Equality after case-folding strings.
    IExact,
    /// Substring or element membership.
    Contains,
    /// Case-folded `Contains`.
    IContains,
    /// String starts with prefix.
    StartsWith,
    /// Case-folded `StartsWith`.
    IStartsWith,
    /// String ends with suffix.
    EndsWith,
    /// Case-folded `EndsWith`.
    IEndsWith,
    /// Value is a member of the operand.
    In,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Inclusive `(low, high)` range.
    Range,
    /// Value is (or is not) null.
    IsNull,
    /// String matches a regular expression.
    Regex,
    /// Case-insensitive `Regex`.
    IRegex,
    /// Every array element is in the operand.
    ContainedBy,
    /// Array shares at least one element with the operand.
    Overlap,
    /// Array length equals the operand.
    Len,
}

impl Op {
    /// Every built-in, in registration order.
    pub const ALL: [Op; 20] = [
        Op::Exact,
        Op::IExact,
        Op::Contains,
        Op::IContains,
        Op::StartsWith,
        Op::IStartsWith,
        Op::EndsWith,
        Op::IEndsWith,
        Op::In,
        Op::Gt,
        Op::Gte,
        Op::Lt,
        Op::Lte,
        Op::Range,
        Op::IsNull,
        Op::Regex,
        Op::IRegex,
        Op::ContainedBy,
        Op::Overlap,
        Op::Len,
    ];

    /// Looks up a built-in by its name.
    pub fn from_name(name: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Returns the field shapes this operator accepts.
    pub fn accepts(self) -> Accepts {
        match self {
            Op::Exact | Op::IExact | Op::Contains | Op::IContains | Op::In | Op::IsNull => {
                Accepts::ANY
            }
            Op::ContainedBy | Op::Overlap | Op::Len => Accepts::ARRAY,
            _ => Accepts::SCALAR,
        }
    }

    /// Returns `true` for the case-folding variants.
    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            Op::IExact | Op::IContains | Op::IStartsWith | Op::IEndsWith | Op::IRegex
        )
    }

    /// Maps a case-folding variant to its case-sensitive counterpart.
    pub fn case_sensitive(self) -> Op {
        match self {
            Op::IExact => Op::Exact,
            Op::IContains => Op::Contains,
            Op::IStartsWith => Op::StartsWith,
            Op::IEndsWith => Op::EndsWith,
            Op::IRegex => Op::Regex,
            other => other,
        }
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// This is used for the `gt`/`gte`/`lt`/`lte` lookups once the field and
    /// operand have been compared.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Exact => ordering == Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false, // Not an ordering-based operator
        }
    }

    /// Returns the registered name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Exact => "exact",
            Op::IExact => "iexact",
            Op::Contains => "contains",
            Op::IContains => "icontains",
            Op::StartsWith => "startswith",
            Op::IStartsWith => "istartswith",
            Op::EndsWith => "endswith",
            Op::IEndsWith => "iendswith",
            Op::In => "in",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Range => "range",
            Op::IsNull => "isnull",
            Op::Regex => "regex",
            Op::IRegex => "iregex",
            Op::ContainedBy => "contained_by",
            Op::Overlap => "overlap",
            Op::Len => "len",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_accepted_shapes() {
        assert_eq!(Op::Exact.accepts(), Accepts::ANY);
        assert_eq!(Op::Contains.accepts(), Accepts::ANY);
        assert_eq!(Op::In.accepts(), Accepts::ANY);
        assert_eq!(Op::Gt.accepts(), Accepts::SCALAR);
        assert_eq!(Op::Regex.accepts(), Accepts::SCALAR);
        assert_eq!(Op::Range.accepts(), Accepts::SCALAR);
        assert_eq!(Op::Overlap.accepts(), Accepts::ARRAY);
        assert_eq!(Op::Len.accepts(), Accepts::ARRAY);
    }

    #[test]
    fn op_names_round_trip() {
        for op in Op::ALL {
            assert_eq!(Op::from_name(op.as_str()), Some(op));
        }
        assert_eq!(Op::from_name("eq"), None);
    }

    #[test]
    fn op_case_variants() {
        assert!(Op::IExact.is_case_insensitive());
        assert!(!Op::Exact.is_case_insensitive());
        assert_eq!(Op::IContains.case_sensitive(), Op::Contains);
        assert_eq!(Op::IRegex.case_sensitive(), Op::Regex);
        assert_eq!(Op::Gt.case_sensitive(), Op::Gt);
    }

    #[test]
    fn op_eval_ordering() {
        assert!(Op::Gt.eval_ordering(Ordering::Greater));
        assert!(!Op::Gt.eval_ordering(Ordering::Equal));

        assert!(Op::Gte.eval_ordering(Ordering::Equal));
        assert!(!Op::Gte.eval_ordering(Ordering::Less));

        assert!(Op::Lt.eval_ordering(Ordering::Less));
        assert!(!Op::Lt.eval_ordering(Ordering::Greater));

        assert!(Op::Lte.eval_ordering(Ordering::Equal));
        assert!(!Op::Lte.eval_ordering(Ordering::Greater));

        assert!(!Op::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn op_display() {
        assert_eq!(Op::Exact.to_string(), "exact");
        assert_eq!(Op::ContainedBy.to_string(), "contained_by");
        assert_eq!(Op::IStartsWith.to_string(), "istartswith");
    }
}

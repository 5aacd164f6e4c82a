//! Evaluation of the built-in lookups.
//!
//! Each [`Op`] is evaluated against a borrowed value field and an owned
//! [`Operand`]. The registry checks accepted shapes before calling in here;
//! the helpers below still refuse a shape they cannot handle instead of
//! guessing.

use regex::{Regex, RegexBuilder};

use crate::clause::Operand;
use crate::error::{LookupError, Result};
use crate::field::{Shape, ValueRef};
use crate::op::Op;
use crate::ordering::compare_scalars;
use crate::value::Scalar;

impl Op {
    /// Evaluates this operator against a value field.
    ///
    /// # Example
    ///
    /// ```
    /// use standout_lookup::{Op, Operand, Scalar, ValueRef};
    ///
    /// let year = Scalar::from(1998);
    /// let value = ValueRef::Scalar(&year);
    /// assert!(Op::Range.eval(value, &Operand::from((1990, 2000))).unwrap());
    /// assert!(!Op::Gt.eval(value, &Operand::from(2000)).unwrap());
    /// ```
    pub fn eval(self, value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
        self.eval_with(value, operand, None)
    }

    /// Compiles the pattern operand of `regex` and `iregex`.
    ///
    /// Other operators take no pattern and return `None`.
    pub(crate) fn prepare(self, operand: &Operand) -> Result<Option<Regex>> {
        match self {
            Op::Regex | Op::IRegex => compile_pattern(self, operand).map(Some),
            _ => Ok(None),
        }
    }

    /// Evaluates with a pattern compiled by [`Op::prepare`]; without one, a
    /// regex operator compiles its operand on the spot.
    pub(crate) fn eval_with(
        self,
        value: ValueRef<'_>,
        operand: &Operand,
        pattern: Option<&Regex>,
    ) -> Result<bool> {
        match self {
            Op::Exact => Ok(exact(value, operand, false)),
            Op::IExact => Ok(exact(value, operand, true)),
            Op::Contains | Op::IContains => contains(self, value, operand),
            Op::StartsWith | Op::IStartsWith | Op::EndsWith | Op::IEndsWith => {
                affix(self, value, operand)
            }
            Op::In => is_in(value, operand),
            Op::Gt | Op::Gte | Op::Lt | Op::Lte => compare(self, value, operand),
            Op::Range => range(value, operand),
            Op::IsNull => is_null(value, operand),
            Op::Regex | Op::IRegex => match pattern {
                Some(re) => regex_match(self, value, re),
                None => regex_match(self, value, &compile_pattern(self, operand)?),
            },
            Op::ContainedBy => {
                let items = array(self, value)?;
                let allowed = operand.items();
                Ok(items.iter().all(|item| allowed.contains(item)))
            }
            Op::Overlap => {
                let items = array(self, value)?;
                Ok(operand.items().iter().any(|wanted| items.contains(wanted)))
            }
            Op::Len => {
                let items = array(self, value)?;
                let wanted = operand
                    .as_scalar()
                    .and_then(Scalar::as_number)
                    .and_then(|n| n.as_u64())
                    .ok_or_else(|| {
                        LookupError::invalid_argument(
                            self.as_str(),
                            format!("expected a non-negative integer, got {}", operand.type_name()),
                        )
                    })?;
                Ok(u64::try_from(items.len()).is_ok_and(|len| len == wanted))
            }
        }
    }
}

fn scalar(op: Op, value: ValueRef<'_>) -> Result<&Scalar> {
    value.as_scalar().ok_or_else(|| LookupError::UnsupportedLookup {
        lookup: op.as_str().to_string(),
        shape: Shape::Array.as_str(),
    })
}

fn array(op: Op, value: ValueRef<'_>) -> Result<&[Scalar]> {
    value.as_array().ok_or_else(|| LookupError::UnsupportedLookup {
        lookup: op.as_str().to_string(),
        shape: Shape::Scalar.as_str(),
    })
}

fn same(a: &Scalar, b: &Scalar, fold: bool) -> bool {
    if fold {
        a.fold_case() == b.fold_case()
    } else {
        a == b
    }
}

fn exact(value: ValueRef<'_>, operand: &Operand, fold: bool) -> bool {
    match (value, operand) {
        (ValueRef::Scalar(s), Operand::Scalar(o)) => same(s, o, fold),
        (ValueRef::Array(items), Operand::List(list)) => {
            items.len() == list.len() && items.iter().zip(list).all(|(a, b)| same(a, b, fold))
        }
        _ => false,
    }
}

/// String operands of a string lookup; every item must be a string.
fn needles(op: Op, operand: &Operand) -> Result<Vec<String>> {
    operand
        .items()
        .iter()
        .map(|item| match item.as_str() {
            Some(s) if op.is_case_insensitive() => Ok(s.to_lowercase()),
            Some(s) => Ok(s.to_string()),
            None => Err(LookupError::invalid_argument(
                op.as_str(),
                format!("expected a string, got {}", item.type_name()),
            )),
        })
        .collect()
}

/// The field's string, case-folded as the lookup requires. `None` for null.
fn haystack(op: Op, value: &Scalar) -> Result<Option<String>> {
    match value {
        Scalar::Null => Ok(None),
        Scalar::String(s) if op.is_case_insensitive() => Ok(Some(s.to_lowercase())),
        Scalar::String(s) => Ok(Some(s.clone())),
        other => Err(LookupError::TypeMismatch {
            lookup: op.as_str().to_string(),
            left: other.type_name(),
            right: "string",
        }),
    }
}

fn contains(op: Op, value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
    let fold = op.is_case_insensitive();
    match value {
        ValueRef::Scalar(s) => {
            let needles = needles(op, operand)?;
            Ok(haystack(op, s)?.is_some_and(|hay| needles.iter().all(|n| hay.contains(n.as_str()))))
        }
        ValueRef::Array(items) => Ok(operand
            .items()
            .iter()
            .all(|wanted| items.iter().any(|item| same(item, wanted, fold)))),
    }
}

fn affix(op: Op, value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
    let s = scalar(op, value)?;
    let needle = match operand {
        Operand::Scalar(_) => needles(op, operand)?.remove(0),
        Operand::List(_) => {
            return Err(LookupError::invalid_argument(op.as_str(), "expected a string, got list"))
        }
    };
    let Some(hay) = haystack(op, s)? else {
        return Ok(false);
    };
    Ok(match op.case_sensitive() {
        Op::StartsWith => hay.starts_with(&needle),
        _ => hay.ends_with(&needle),
    })
}

fn is_in(value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
    let member = |candidate: &Scalar| -> bool {
        match operand {
            Operand::List(list) => list.contains(candidate),
            // A string operand is a sequence of characters
            Operand::Scalar(Scalar::String(chars)) => candidate.as_str().is_some_and(|c| {
                let mut it = c.chars();
                matches!((it.next(), it.next()), (Some(ch), None) if chars.contains(ch))
            }),
            Operand::Scalar(_) => false,
        }
    };
    if let Operand::Scalar(other) = operand {
        if !other.is_string() {
            return Err(LookupError::invalid_argument(
                Op::In.as_str(),
                format!("expected a list or a string, got {}", other.type_name()),
            ));
        }
    }
    Ok(match value {
        ValueRef::Scalar(s) => member(s),
        ValueRef::Array(items) => items.iter().any(member),
    })
}

fn compare(op: Op, value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
    let s = scalar(op, value)?;
    let other = operand.as_scalar().ok_or_else(|| LookupError::TypeMismatch {
        lookup: op.as_str().to_string(),
        left: s.type_name(),
        right: "list",
    })?;
    let ordering = ordered(op, s, other)?;
    Ok(op.eval_ordering(ordering))
}

fn ordered(op: Op, a: &Scalar, b: &Scalar) -> Result<std::cmp::Ordering> {
    compare_scalars(a, b).ok_or_else(|| LookupError::TypeMismatch {
        lookup: op.as_str().to_string(),
        left: a.type_name(),
        right: b.type_name(),
    })
}

fn range(value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
    let s = scalar(Op::Range, value)?;
    let [low, high] = operand.as_list().unwrap_or_default() else {
        return Err(LookupError::invalid_argument(
            Op::Range.as_str(),
            "expected a (low, high) pair",
        ));
    };
    Ok(ordered(Op::Range, s, low)?.is_ge() && ordered(Op::Range, s, high)?.is_le())
}

fn is_null(value: ValueRef<'_>, operand: &Operand) -> Result<bool> {
    let wanted = operand.as_scalar().and_then(Scalar::as_bool).ok_or_else(|| {
        LookupError::invalid_argument(
            Op::IsNull.as_str(),
            format!("expected a bool, got {}", operand.type_name()),
        )
    })?;
    Ok(value.is_null() == wanted)
}

fn compile_pattern(op: Op, operand: &Operand) -> Result<Regex> {
    let pattern = operand.as_str().ok_or_else(|| {
        LookupError::invalid_argument(
            op.as_str(),
            format!("expected a pattern string, got {}", operand.type_name()),
        )
    })?;
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(op == Op::IRegex)
        .build()?)
}

fn regex_match(op: Op, value: ValueRef<'_>, re: &Regex) -> Result<bool> {
    match scalar(op, value)? {
        Scalar::Null => Ok(false),
        Scalar::String(text) => Ok(re.is_match(text)),
        other => Err(LookupError::TypeMismatch {
            lookup: op.as_str().to_string(),
            left: other.type_name(),
            right: "string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: impl Into<Scalar>) -> Scalar {
        v.into()
    }

    fn eval_scalar(op: Op, value: impl Into<Scalar>, operand: impl Into<Operand>) -> Result<bool> {
        let value = value.into();
        op.eval(ValueRef::Scalar(&value), &operand.into())
    }

    fn eval_array(op: Op, items: &[Scalar], operand: impl Into<Operand>) -> Result<bool> {
        op.eval(ValueRef::Array(items), &operand.into())
    }

    #[test]
    fn exact_and_iexact() {
        assert!(eval_scalar(Op::Exact, "Emma", "Emma").unwrap());
        assert!(!eval_scalar(Op::Exact, "Emma", "emma").unwrap());
        assert!(eval_scalar(Op::IExact, "Emma", "eMMA").unwrap());
        assert!(eval_scalar(Op::Exact, 3i64, 3.0f64).unwrap());
        assert!(!eval_scalar(Op::Exact, "3", 3i64).unwrap());
        assert!(eval_scalar(Op::Exact, None::<&str>, None::<&str>).unwrap());

        // A list operand never equals a scalar
        assert!(!eval_scalar(Op::Exact, "a", ["a"]).unwrap());
    }

    #[test]
    fn exact_on_arrays_is_elementwise() {
        let genres = [s("Fantasy"), s("Drama")];
        assert!(eval_array(Op::Exact, &genres, ["Fantasy", "Drama"]).unwrap());
        assert!(!eval_array(Op::Exact, &genres, ["Drama", "Fantasy"]).unwrap());
        assert!(!eval_array(Op::Exact, &genres, "Fantasy").unwrap());
        assert!(eval_array(Op::IExact, &genres, ["fantasy", "DRAMA"]).unwrap());
    }

    #[test]
    fn contains_on_strings() {
        assert!(eval_scalar(Op::Contains, "Chamber of Secrets", "of").unwrap());
        assert!(!eval_scalar(Op::Contains, "Chamber of Secrets", "OF").unwrap());
        assert!(eval_scalar(Op::IContains, "Chamber of Secrets", "SECRET").unwrap());
        assert!(eval_scalar(Op::Contains, "Chamber of Secrets", ["Chamber", "Secrets"]).unwrap());
        assert!(!eval_scalar(Op::Contains, "Chamber of Secrets", ["Chamber", "Stone"]).unwrap());
        assert!(!eval_scalar(Op::Contains, None::<&str>, "x").unwrap());
    }

    #[test]
    fn contains_type_errors() {
        assert!(matches!(
            eval_scalar(Op::Contains, 12i64, "1"),
            Err(LookupError::TypeMismatch { .. })
        ));
        assert!(matches!(
            eval_scalar(Op::Contains, "12", 1i64),
            Err(LookupError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn contains_on_arrays_is_membership() {
        let toppings = [s("Glazed"), s("Sugar"), s("Maple")];
        assert!(eval_array(Op::Contains, &toppings, "Sugar").unwrap());
        assert!(!eval_array(Op::Contains, &toppings, "sugar").unwrap());
        assert!(eval_array(Op::IContains, &toppings, "sugar").unwrap());
        assert!(eval_array(Op::Contains, &toppings, ["Glazed", "Maple"]).unwrap());
        assert!(!eval_array(Op::Contains, &toppings, ["Glazed", "Chocolate"]).unwrap());
    }

    #[test]
    fn prefix_and_suffix() {
        assert!(eval_scalar(Op::StartsWith, "J. K. Rowling", "J.").unwrap());
        assert!(!eval_scalar(Op::StartsWith, "J. K. Rowling", "j.").unwrap());
        assert!(eval_scalar(Op::IStartsWith, "J. K. Rowling", "j. k").unwrap());
        assert!(eval_scalar(Op::EndsWith, "Agatha Christie", "Christie").unwrap());
        assert!(eval_scalar(Op::IEndsWith, "Agatha Christie", "CHRISTIE").unwrap());
        assert!(!eval_scalar(Op::EndsWith, None::<&str>, "x").unwrap());
        assert!(matches!(
            eval_scalar(Op::StartsWith, "abc", ["a"]),
            Err(LookupError::InvalidArgument { .. })
        ));
        assert!(matches!(
            eval_scalar(Op::EndsWith, true, "e"),
            Err(LookupError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn in_lists_and_strings() {
        assert!(eval_scalar(Op::In, "Emma", ["Emma", "Sourcery"]).unwrap());
        assert!(!eval_scalar(Op::In, "Dune", ["Emma", "Sourcery"]).unwrap());
        assert!(eval_scalar(Op::In, 2i64, [1i64, 2, 3]).unwrap());

        // Characters of a string operand
        assert!(eval_scalar(Op::In, "b", "abc").unwrap());
        assert!(!eval_scalar(Op::In, "ab", "abc").unwrap());

        let genres = [s("Fantasy"), s("Drama")];
        assert!(eval_array(Op::In, &genres, ["Drama", "Horror"]).unwrap());
        assert!(!eval_array(Op::In, &genres, ["Horror"]).unwrap());

        assert!(matches!(
            eval_scalar(Op::In, 1i64, 1i64),
            Err(LookupError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn comparisons() {
        assert!(eval_scalar(Op::Gt, 3i64, 2i64).unwrap());
        assert!(!eval_scalar(Op::Gt, 2i64, 2i64).unwrap());
        assert!(eval_scalar(Op::Gte, 2i64, 2.0f64).unwrap());
        assert!(eval_scalar(Op::Lt, "1998", "1999").unwrap());
        assert!(eval_scalar(Op::Lte, "b", "b").unwrap());
        assert!(matches!(
            eval_scalar(Op::Gt, "3", 2i64),
            Err(LookupError::TypeMismatch { left: "string", right: "number", .. })
        ));
        assert!(matches!(
            eval_scalar(Op::Lt, 1i64, [2i64]),
            Err(LookupError::TypeMismatch { right: "list", .. })
        ));
        assert!(matches!(
            eval_scalar(Op::Gt, None::<i64>, 1i64),
            Err(LookupError::TypeMismatch { left: "null", .. })
        ));
    }

    #[test]
    fn range_is_inclusive() {
        assert!(eval_scalar(Op::Range, 1990i64, (1990i64, 2000i64)).unwrap());
        assert!(eval_scalar(Op::Range, 2000i64, (1990i64, 2000i64)).unwrap());
        assert!(!eval_scalar(Op::Range, 2001i64, (1990i64, 2000i64)).unwrap());
        assert!(eval_scalar(Op::Range, "1999", ("1990", "2000")).unwrap());
        assert!(matches!(
            eval_scalar(Op::Range, 1i64, [1i64]),
            Err(LookupError::InvalidArgument { .. })
        ));
        assert!(matches!(
            eval_scalar(Op::Range, 1i64, 1i64),
            Err(LookupError::InvalidArgument { .. })
        ));
        assert!(matches!(
            eval_scalar(Op::Range, "1999", (1990i64, 2000i64)),
            Err(LookupError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn isnull() {
        assert!(eval_scalar(Op::IsNull, None::<&str>, true).unwrap());
        assert!(!eval_scalar(Op::IsNull, "x", true).unwrap());
        assert!(eval_scalar(Op::IsNull, "x", false).unwrap());
        assert!(!eval_array(Op::IsNull, &[], true).unwrap());
        assert!(matches!(
            eval_scalar(Op::IsNull, "x", "yes"),
            Err(LookupError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn regex_lookups() {
        assert!(eval_scalar(Op::Regex, "Harry Potter", r"^Harry\s").unwrap());
        assert!(eval_scalar(Op::Regex, "Harry Potter", "Pot").unwrap());
        assert!(!eval_scalar(Op::Regex, "Harry Potter", "^potter").unwrap());
        assert!(eval_scalar(Op::IRegex, "Harry Potter", "^harry").unwrap());
        assert!(!eval_scalar(Op::Regex, None::<&str>, ".*").unwrap());
        assert!(matches!(
            eval_scalar(Op::Regex, "x", "("),
            Err(LookupError::InvalidPattern(_))
        ));
        assert!(matches!(
            eval_scalar(Op::Regex, 1i64, "1"),
            Err(LookupError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn prepared_patterns() {
        let pattern = Op::IRegex.prepare(&Operand::from("^harry")).unwrap().unwrap();
        let title = s("Harry Potter");
        assert!(Op::IRegex
            .eval_with(ValueRef::Scalar(&title), &Operand::from("^harry"), Some(&pattern))
            .unwrap());

        assert!(Op::Exact.prepare(&Operand::from("(")).unwrap().is_none());
        assert!(matches!(
            Op::Regex.prepare(&Operand::from("(")),
            Err(LookupError::InvalidPattern(_))
        ));
        assert!(matches!(
            Op::Regex.prepare(&Operand::from(1i64)),
            Err(LookupError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn array_lookups() {
        let toppings = [s("Glazed"), s("Sugar")];
        assert!(eval_array(Op::ContainedBy, &toppings, ["Glazed", "Sugar", "Maple"]).unwrap());
        assert!(!eval_array(Op::ContainedBy, &toppings, ["Glazed"]).unwrap());
        assert!(eval_array(Op::ContainedBy, &[], ["Glazed"]).unwrap());
        assert!(eval_array(Op::Overlap, &toppings, ["Maple", "Sugar"]).unwrap());
        assert!(!eval_array(Op::Overlap, &toppings, ["Maple"]).unwrap());
        assert!(eval_array(Op::Overlap, &toppings, "Sugar").unwrap());
        assert!(eval_array(Op::Len, &toppings, 2i64).unwrap());
        assert!(!eval_array(Op::Len, &toppings, 3u64).unwrap());
        assert!(matches!(
            eval_array(Op::Len, &toppings, -1i64),
            Err(LookupError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn wrong_shape_is_unsupported() {
        assert!(matches!(
            eval_scalar(Op::Len, "ab", 2i64),
            Err(LookupError::UnsupportedLookup { shape: "scalar", .. })
        ));
        assert!(matches!(
            eval_array(Op::Gt, &[s(1i64)], 0i64),
            Err(LookupError::UnsupportedLookup { shape: "array", .. })
        ));
    }
}

//! Scalar values held by value fields.
//!
//! A [`Scalar`] is the leaf of a record tree: a string, a number, a boolean,
//! or null. Scalars are owned, so a built [`Node`](crate::Node) never borrows
//! from the record it was classified from.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value as Json;

/// A leaf value of a record.
///
/// # Example
///
/// ```
/// use standout_lookup::{Number, Scalar};
///
/// let name = Scalar::from("Agatha Christie");
/// assert_eq!(name.as_str(), Some("Agatha Christie"));
///
/// // Numbers compare by value, whatever their storage
/// assert_eq!(Scalar::from(3i32), Scalar::Number(Number::U64(3)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Absent or null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
}

impl Scalar {
    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Returns `true` if this is a `String` value.
    pub fn is_string(&self) -> bool {
        matches!(self, Scalar::String(_))
    }

    /// Returns `true` if this is a `Number` value.
    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Number(_))
    }

    /// Returns `true` if this is a `Bool` value.
    pub fn is_bool(&self) -> bool {
        matches!(self, Scalar::Bool(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
        }
    }

    /// Converts a JSON leaf into a scalar.
    ///
    /// Returns `None` for arrays and objects.
    pub fn from_json(value: &Json) -> Option<Scalar> {
        match value {
            Json::Null => Some(Scalar::Null),
            Json::Bool(b) => Some(Scalar::Bool(*b)),
            Json::Number(n) => Some(Scalar::Number(Number::from_json(n))),
            Json::String(s) => Some(Scalar::String(s.clone())),
            Json::Array(_) | Json::Object(_) => None,
        }
    }

    /// Converts the scalar back to JSON.
    pub fn to_json(&self) -> Json {
        match self {
            Scalar::Null => Json::Null,
            Scalar::Bool(b) => Json::Bool(*b),
            Scalar::Number(n) => n.to_json(),
            Scalar::String(s) => Json::String(s.clone()),
        }
    }

    /// Lowercases string values; other variants are returned unchanged.
    pub(crate) fn fold_case(&self) -> Scalar {
        match self {
            Scalar::String(s) => Scalar::String(s.to_lowercase()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Equality and ordering work across variants, so `I64(3) == U64(3)` and
/// `I64(3) == F64(3.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns the value as a `u64` if it is a non-negative integer.
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Number::I64(n) => u64::try_from(n).ok(),
            Number::U64(n) => Some(n),
            Number::F64(_) => None,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),

            // Integers of different signedness compare exactly
            (Number::I64(a), Number::U64(b)) => Some(match u64::try_from(a) {
                Ok(a) => a.cmp(&b),
                Err(_) => Ordering::Less,
            }),
            (Number::U64(_), Number::I64(_)) => other.compare(self).map(Ordering::reverse),

            (Number::I64(a), Number::F64(b)) => compare_int_float(i128::from(a), b),
            (Number::U64(a), Number::F64(b)) => compare_int_float(i128::from(a), b),
            (Number::F64(_), _) => other.compare(self).map(Ordering::reverse),
        }
    }

    fn from_json(n: &serde_json::Number) -> Number {
        if let Some(i) = n.as_i64() {
            Number::I64(i)
        } else if let Some(u) = n.as_u64() {
            Number::U64(u)
        } else {
            Number::F64(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    fn to_json(self) -> Json {
        match self {
            Number::I64(n) => Json::from(n),
            Number::U64(n) => Json::from(n),
            Number::F64(n) => serde_json::Number::from_f64(n).map_or(Json::Null, Json::Number),
        }
    }
}

/// Exact comparison of an integer with a float, without rounding the
/// integer through `f64`.
fn compare_int_float(int: i128, float: f64) -> Option<Ordering> {
    // 2^64 and -2^63 lie outside every I64/U64 value
    const ABOVE_ALL: f64 = 18_446_744_073_709_551_616.0;
    const BELOW_ALL: f64 = -9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= ABOVE_ALL {
        return Some(Ordering::Less);
    }
    if float < BELOW_ALL {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => (whole - float).partial_cmp(&0.0),
        unequal => Some(unequal),
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }

            impl From<$source> for Scalar {
                fn from(n: $source) -> Self {
                    Scalar::Number(Number::from(n))
                }
            }
        )+
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::String(s.clone())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_type_checks() {
        assert!(Scalar::Null.is_null());
        assert!(Scalar::from("x").is_string());
        assert!(Scalar::from(1i64).is_number());
        assert!(Scalar::from(true).is_bool());
        assert!(!Scalar::from("x").is_null());
    }

    #[test]
    fn scalar_extractors() {
        assert_eq!(Scalar::from("hello").as_str(), Some("hello"));
        assert_eq!(Scalar::from(42i64).as_number(), Some(Number::I64(42)));
        assert_eq!(Scalar::from(true).as_bool(), Some(true));

        // Wrong type returns None
        assert_eq!(Scalar::from("test").as_number(), None);
        assert_eq!(Scalar::from(1i64).as_str(), None);
        assert_eq!(Scalar::Null.as_bool(), None);
    }

    #[test]
    fn json_leaves_convert_both_ways() {
        for value in [json!(null), json!(true), json!(12), json!(-3), json!(2.5), json!("a")] {
            let scalar = Scalar::from_json(&value).unwrap();
            assert_eq!(scalar.to_json(), value);
        }
        assert_eq!(Scalar::from_json(&json!([1])), None);
        assert_eq!(Scalar::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn number_comparisons_same_type() {
        assert_eq!(Number::I64(5).compare(Number::I64(10)), Some(Ordering::Less));
        assert_eq!(Number::U64(10).compare(Number::U64(5)), Some(Ordering::Greater));
        assert_eq!(Number::F64(5.0).compare(Number::F64(5.0)), Some(Ordering::Equal));
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(Number::I64(5).compare(Number::U64(10)), Some(Ordering::Less));
        assert_eq!(Number::I64(-1).compare(Number::U64(0)), Some(Ordering::Less));
        assert_eq!(Number::U64(u64::MAX).compare(Number::I64(1)), Some(Ordering::Greater));
        assert_eq!(Number::I64(5).compare(Number::F64(5.0)), Some(Ordering::Equal));
        assert_eq!(Number::U64(10).compare(Number::F64(5.5)), Some(Ordering::Greater));
    }

    #[test]
    fn integers_beyond_f64_precision_compare_exactly() {
        let big = Number::I64(9_007_199_254_740_993);
        let near = Number::F64(9_007_199_254_740_992.0);
        assert_eq!(big.compare(near), Some(Ordering::Greater));
        assert_eq!(near.compare(big), Some(Ordering::Less));
        assert_ne!(big, near);

        let max = Number::U64(u64::MAX);
        assert_eq!(max.compare(Number::F64(1e20)), Some(Ordering::Less));
        assert_eq!(max.compare(Number::F64(u64::MAX as f64)), Some(Ordering::Less));
        assert_eq!(Number::I64(i64::MIN).compare(Number::F64(-1e19)), Some(Ordering::Greater));
        assert_eq!(Number::I64(-3).compare(Number::F64(-3.5)), Some(Ordering::Greater));
        assert_eq!(Number::I64(3).compare(Number::F64(3.5)), Some(Ordering::Less));
        assert_eq!(Number::I64(3).compare(Number::F64(f64::INFINITY)), Some(Ordering::Less));
        assert_eq!(Number::I64(3).compare(Number::F64(f64::NAN)), None);
    }

    #[test]
    fn number_equality_ignores_storage() {
        assert_eq!(Number::I64(3), Number::U64(3));
        assert_eq!(Number::F64(3.0), Number::I64(3));
        assert_ne!(Number::F64(f64::NAN), Number::F64(f64::NAN));
    }

    #[test]
    fn number_as_u64() {
        assert_eq!(Number::I64(3).as_u64(), Some(3));
        assert_eq!(Number::I64(-3).as_u64(), None);
        assert_eq!(Number::F64(3.0).as_u64(), None);
    }

    #[test]
    fn case_folding_only_touches_strings() {
        assert_eq!(Scalar::from("FanTasy").fold_case(), Scalar::from("fantasy"));
        assert_eq!(Scalar::from(7i64).fold_case(), Scalar::from(7i64));
    }

    #[test]
    fn display() {
        assert_eq!(Scalar::from("a").to_string(), "\"a\"");
        assert_eq!(Scalar::from(1.5f64).to_string(), "1.5");
        assert_eq!(Scalar::Null.to_string(), "null");
    }
}

//! Condition vocabulary: combinators, scalar values and owned node snapshots.

use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::domain::error::DomainError;

/// Boolean aggregation mode of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    /// Conjunction, serialized as `all`
    #[default]
    All,
    /// Disjunction, serialized as `any`
    Any,
}

impl Combinator {
    /// Key used in the serialized document.
    pub fn key(self) -> &'static str {
        match self {
            Combinator::All => "all",
            Combinator::Any => "any",
        }
    }

    /// Human label, as shown in the group header.
    pub fn label(self) -> &'static str {
        match self {
            Combinator::All => "ALL of these conditions (AND)",
            Combinator::Any => "ANY of these conditions (OR)",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Combinator {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "and" => Ok(Combinator::All),
            "any" | "or" => Ok(Combinator::Any),
            other => Err(DomainError::UnknownCombinator(other.to_string())),
        }
    }
}

/// Leaf value: boolean, number or string.
///
/// Values typed in by a user arrive as [`Scalar::Text`] and are coerced on
/// serialization. Values read from a document keep their JSON type.
///
/// Equality compares coerced values, so `Text("18")` equals `Number(18)`:
/// both serialize to the same document.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Text(String::new())
    }
}

impl Scalar {
    /// Raw text input, uncoerced.
    pub fn text(raw: impl Into<String>) -> Self {
        Scalar::Text(raw.into())
    }

    /// Convert a JSON value; `None` for null, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            _ => None,
        }
    }

    /// Apply input coercion.
    ///
    /// Only text is touched: exact `true`/`false` become booleans, a non-empty
    /// finite numeric literal becomes a number. Anything else stays text.
    pub fn coerce(&self) -> Scalar {
        match self {
            Scalar::Text(raw) => coerce_text(raw),
            other => other.clone(),
        }
    }

    /// JSON form after coercion.
    pub fn to_json(&self) -> Value {
        match self.coerce() {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::Text(s) => Value::String(s),
        }
    }

    /// Text as it would appear in an input box.
    pub fn as_input(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self.coerce(), other.coerce()) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => {
                a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
            }
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.as_input()),
        }
    }
}

fn coerce_text(raw: &str) -> Scalar {
    match raw {
        "true" => return Scalar::Bool(true),
        "false" => return Scalar::Bool(false),
        _ => {}
    }
    parse_number(raw)
        .map(Scalar::Number)
        .unwrap_or_else(|| Scalar::Text(raw.to_string()))
}

/// Parse a decimal numeric literal.
///
/// Integral results are emitted as integers so `"18"` and `"1e3"` serialize
/// as `18` and `1000`.
fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() || !is_decimal_literal(trimmed) {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Some(Number::from(u));
    }
    let f = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

/// Digits with optional sign, fraction and exponent. Rejects `inf`, `NaN` and hex.
fn is_decimal_literal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && all_digits(digits)
        }
    }
}

/// Owned, structural view of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Group {
        combinator: Combinator,
        children: Vec<ConditionNode>,
    },
    Leaf {
        fact: String,
        operator: String,
        value: Scalar,
    },
}

impl ConditionNode {
    pub fn group(combinator: Combinator, children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group {
            combinator,
            children,
        }
    }

    pub fn leaf(fact: impl Into<String>, operator: impl Into<String>, value: Scalar) -> Self {
        ConditionNode::Leaf {
            fact: fact.into(),
            operator: operator.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("true", json!(true))]
    #[case("false", json!(false))]
    #[case("TRUE", json!("TRUE"))]
    #[case("42", json!(42))]
    #[case("-7", json!(-7))]
    #[case("2.5", json!(2.5))]
    #[case("1e3", json!(1000))]
    #[case(" 12 ", json!(12))]
    #[case("42abc", json!("42abc"))]
    #[case("", json!(""))]
    #[case("   ", json!("   "))]
    #[case("inf", json!("inf"))]
    #[case("NaN", json!("NaN"))]
    #[case("0x1A", json!("0x1A"))]
    #[case(".", json!("."))]
    #[case("1e", json!("1e"))]
    fn test_text_coercion(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(Scalar::text(raw).to_json(), expected);
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let once = Scalar::text("18").coerce();
        let twice = once.coerce();
        assert_eq!(once, twice);
        assert_eq!(twice.to_json(), json!(18));
    }

    #[test]
    fn test_typed_values_are_not_coerced() {
        assert!(matches!(Scalar::Bool(false).coerce(), Scalar::Bool(false)));
        assert!(matches!(
            Scalar::Number(Number::from(3)).coerce(),
            Scalar::Number(n) if n == Number::from(3)
        ));
    }

    #[rstest]
    #[case(Scalar::text("18"), Scalar::Number(Number::from(18)), true)]
    #[case(Scalar::text("true"), Scalar::Bool(true), true)]
    #[case(Scalar::text("1e3"), Scalar::Number(Number::from(1000)), true)]
    #[case(Scalar::Number(Number::from(2)), Scalar::Number(Number::from_f64(2.0).unwrap()), true)]
    #[case(Scalar::text("18"), Scalar::text("18.5"), false)]
    #[case(Scalar::text("True"), Scalar::Bool(true), false)]
    #[case(Scalar::text(""), Scalar::Number(Number::from(0)), false)]
    fn test_equality_compares_coerced_values(
        #[case] left: Scalar,
        #[case] right: Scalar,
        #[case] equal: bool,
    ) {
        assert_eq!(left == right, equal);
        assert_eq!(right == left, equal);
    }

    #[test]
    fn test_from_json_rejects_compound_values() {
        assert!(Scalar::from_json(&json!(null)).is_none());
        assert!(Scalar::from_json(&json!([1, 2])).is_none());
        assert!(Scalar::from_json(&json!({"a": 1})).is_none());
        assert_eq!(Scalar::from_json(&json!("x")), Some(Scalar::text("x")));
    }

    #[rstest]
    #[case("all", Combinator::All)]
    #[case("ANY", Combinator::Any)]
    #[case("and", Combinator::All)]
    #[case("or", Combinator::Any)]
    fn test_combinator_parse(#[case] raw: &str, #[case] expected: Combinator) {
        assert_eq!(raw.parse::<Combinator>().unwrap(), expected);
    }

    #[test]
    fn test_combinator_parse_rejects_unknown() {
        assert!(matches!(
            "xor".parse::<Combinator>(),
            Err(DomainError::UnknownCombinator(_))
        ));
    }
}

//! Statically known JavaScript values.
//!
//! The resolver only ever produces primitives. Objects, functions and
//! anything the resolver cannot compute collapse into [`Resolved::Unknown`].

use std::fmt;

/// A JavaScript primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any IEEE-754 number, including `NaN` and the infinities.
    Number(f64),
    /// A string.
    String(String),
}

/// Result of resolving an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The expression has a statically known value.
    Known(Value),
    /// The expression cannot be decided without running it.
    Unknown,
}

impl Resolved {
    /// Shorthand for a known string.
    pub fn string(s: impl Into<String>) -> Self {
        Self::Known(Value::String(s.into()))
    }

    /// Shorthand for a known number.
    pub fn number(n: f64) -> Self {
        Self::Known(Value::Number(n))
    }

    /// The known value, if any.
    pub fn known(&self) -> Option<&Value> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown => None,
        }
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Self::Known(value)
    }
}

impl Value {
    /// ECMAScript `ToBoolean`.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
        }
    }

    /// `undefined` or `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// ECMAScript `ToNumber`.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
        }
    }

    /// ECMAScript `ToInt32`.
    pub fn to_int32(&self) -> i32 {
        self.to_uint32() as i32
    }

    /// ECMAScript `ToUint32`.
    pub fn to_uint32(&self) -> u32 {
        let n = self.to_number();
        if !n.is_finite() {
            return 0;
        }
        n.trunc().rem_euclid(4_294_967_296.0) as u32
    }

    /// ECMAScript `ToString`.
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
        }
    }

    /// The result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// `==` (IsLooselyEqual restricted to primitives).
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => a.strict_equals(b),
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (Self::Number(n), Self::String(_)) => *n == other.to_number(),
            (Self::String(_), Self::Number(n)) => self.to_number() == *n,
            (Self::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Self::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.to_js_string()),
        }
    }
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return match u64::from_str_radix(&trimmed[2..], radix) {
            Ok(v) => v as f64,
            Err(_) => f64::NAN,
        };
    }

    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" && trimmed.len() - unsigned.len() <= 1 {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    // Rust accepts "inf", "nan" and friends; JS does not.
    let decimal_shape = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal_shape {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }
    // 1e21 -> "1e+21", 1e-7 -> "1e-7"
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_to_boolean() {
        assert!(Value::Number(1.0).truthy());
        assert!(Value::String("0".into()).truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::String(String::new()).truthy());
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Null.truthy());
    }

    #[test]
    fn string_to_number_matches_js() {
        assert_eq!(Value::String("  42 ".into()).to_number(), 42.0);
        assert_eq!(Value::String("".into()).to_number(), 0.0);
        assert_eq!(Value::String("0x10".into()).to_number(), 16.0);
        assert_eq!(Value::String("-Infinity".into()).to_number(), f64::NEG_INFINITY);
        assert!(Value::String("inf".into()).to_number().is_nan());
        assert!(Value::String("12px".into()).to_number().is_nan());
    }

    #[test]
    fn number_formatting_matches_js() {
        assert_eq!(Value::Number(2.0).to_js_string(), "2");
        assert_eq!(Value::Number(0.5).to_js_string(), "0.5");
        assert_eq!(Value::Number(-0.0).to_js_string(), "0");
        assert_eq!(Value::Number(1e21).to_js_string(), "1e+21");
        assert_eq!(Value::Number(f64::NAN).to_js_string(), "NaN");
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(Value::Number(1.0).loose_equals(&Value::String("1".into())));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(!Value::Number(f64::NAN).loose_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn int32_wraps() {
        assert_eq!(Value::Number(4_294_967_297.0).to_int32(), 1);
        assert_eq!(Value::Number(-1.0).to_uint32(), u32::MAX);
        assert_eq!(Value::Number(f64::NAN).to_int32(), 0);
    }
}

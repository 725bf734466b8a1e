//! Operator evaluation over statically known primitives.
//!
//! The table is closed: every operator the resolver can meet is listed in
//! [`BinaryOp`]. A symbol outside the table is an
//! [`AnalyzeError::UnsupportedOperator`], never a silent `Unknown`.

use std::cmp::Ordering;

use crate::error::AnalyzeError;
use crate::value::{Resolved, Value};

/// Binary and logical operators known to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    BitOr,
    BitAnd,
    BitXor,
    Shl,
    Shr,
    UShr,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Or,
    And,
    Coalesce,
    In,
    InstanceOf,
}

impl BinaryOp {
    /// Look up an operator by its source symbol.
    pub fn from_symbol(symbol: &str) -> Result<Self, AnalyzeError> {
        let op = match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "**" => Self::Exp,
            "|" => Self::BitOr,
            "&" => Self::BitAnd,
            "^" => Self::BitXor,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            ">>>" => Self::UShr,
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNotEq,
            "<" => Self::Lt,
            "<=" => Self::LtEq,
            ">" => Self::Gt,
            ">=" => Self::GtEq,
            "||" => Self::Or,
            "&&" => Self::And,
            "??" => Self::Coalesce,
            "in" => Self::In,
            "instanceof" => Self::InstanceOf,
            other => {
                return Err(AnalyzeError::UnsupportedOperator {
                    operator: other.to_string(),
                })
            }
        };
        Ok(op)
    }

    /// The value of the left operand alone, when it already decides the
    /// result of a short-circuiting operator.
    pub fn short_circuit(self, left: &Value) -> Option<Value> {
        match self {
            Self::Or if left.truthy() => Some(left.clone()),
            Self::And if !left.truthy() => Some(left.clone()),
            Self::Coalesce if !left.is_nullish() => Some(left.clone()),
            _ => None,
        }
    }

    /// Apply the operator with JavaScript semantics.
    pub fn apply(self, left: &Value, right: &Value) -> Resolved {
        let num = |f: fn(f64, f64) -> f64| Resolved::number(f(left.to_number(), right.to_number()));
        let shift = right.to_uint32() & 31;

        match self {
            Self::Add => match (left, right) {
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Resolved::string(left.to_js_string() + &right.to_js_string())
                }
                _ => num(|a, b| a + b),
            },
            Self::Sub => num(|a, b| a - b),
            Self::Mul => num(|a, b| a * b),
            Self::Div => num(|a, b| a / b),
            Self::Rem => num(|a, b| a % b),
            Self::Exp => num(js_pow),
            Self::BitOr => Resolved::number(f64::from(left.to_int32() | right.to_int32())),
            Self::BitAnd => Resolved::number(f64::from(left.to_int32() & right.to_int32())),
            Self::BitXor => Resolved::number(f64::from(left.to_int32() ^ right.to_int32())),
            Self::Shl => Resolved::number(f64::from(left.to_int32().wrapping_shl(shift))),
            Self::Shr => Resolved::number(f64::from(left.to_int32() >> shift)),
            Self::UShr => Resolved::number(f64::from(left.to_uint32() >> shift)),
            Self::Eq => Value::Bool(left.loose_equals(right)).into(),
            Self::NotEq => Value::Bool(!left.loose_equals(right)).into(),
            Self::StrictEq => Value::Bool(left.strict_equals(right)).into(),
            Self::StrictNotEq => Value::Bool(!left.strict_equals(right)).into(),
            Self::Lt => Value::Bool(less_than(left, right) == Some(true)).into(),
            Self::Gt => Value::Bool(less_than(right, left) == Some(true)).into(),
            Self::LtEq => Value::Bool(less_than(right, left) == Some(false)).into(),
            Self::GtEq => Value::Bool(less_than(left, right) == Some(false)).into(),
            Self::Or | Self::And | Self::Coalesce => self
                .short_circuit(left)
                .unwrap_or_else(|| right.clone())
                .into(),
            // A primitive right-hand side makes both throw at runtime.
            Self::In | Self::InstanceOf => Resolved::Unknown,
        }
    }
}

/// Evaluate `left <operator> right`.
pub fn evaluate_binary(
    operator: &str,
    left: &Value,
    right: &Value,
) -> Result<Resolved, AnalyzeError> {
    Ok(BinaryOp::from_symbol(operator)?.apply(left, right))
}

/// Evaluate a prefix unary operator.
pub fn evaluate_unary(operator: &str, operand: &Value) -> Result<Resolved, AnalyzeError> {
    let resolved = match operator {
        "!" => Value::Bool(!operand.truthy()).into(),
        "-" => Resolved::number(-operand.to_number()),
        "+" => Resolved::number(operand.to_number()),
        "~" => Resolved::number(f64::from(!operand.to_int32())),
        "typeof" => Resolved::string(operand.type_of()),
        "void" => Value::Undefined.into(),
        "delete" => Resolved::Unknown,
        other => {
            return Err(AnalyzeError::UnsupportedOperator {
                operator: other.to_string(),
            })
        }
    };
    Ok(resolved)
}

fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// Abstract relational comparison. `None` stands for an `undefined` result
/// (a NaN was involved).
fn less_than(a: &Value, b: &Value) -> Option<bool> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.encode_utf16().cmp(y.encode_utf16()) == Ordering::Less);
    }
    let (x, y) = (a.to_number(), b.to_number());
    x.partial_cmp(&y).map(|ord| ord == Ordering::Less)
}

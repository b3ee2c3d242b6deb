// src/ops.rs

//! Stock computations for common node shapes.
//!
//! These cover what a source-to-graph compiler needs when lowering a
//! function body: parameter passthrough ([`echo`]), literals ([`constant`])
//! and the binary arithmetic operators. Anything else goes through
//! [`computation`] with a user closure.
//!
//! Numeric rules: `Int op Int` stays `Int`; a `Float` on either side
//! promotes the result to `Float`. [`div`] is true division and always
//! yields a `Float`; [`floor_div`] is flooring integer division.

use std::sync::Arc;

use crate::graph::Computation;
use crate::value::{ComputeError, Value};

/// Wrap a closure as a [`Computation`].
pub fn computation<F>(f: F) -> Computation
where
    F: Fn(&[Value]) -> Result<Value, ComputeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Pass a single argument through unchanged. The idiomatic computation for
/// input and return tasks that only forward values.
pub fn echo() -> Computation {
    computation(|args| match args {
        [value] => Ok(value.clone()),
        _ => Err(ComputeError::Arity {
            expected: 1,
            got: args.len(),
        }),
    })
}

/// Always produce the given value; takes no arguments.
pub fn constant(value: Value) -> Computation {
    computation(move |args| {
        if args.is_empty() {
            Ok(value.clone())
        } else {
            Err(ComputeError::Arity {
                expected: 0,
                got: args.len(),
            })
        }
    })
}

pub fn add() -> Computation {
    binop("add", i64::checked_add, |a, b| a + b)
}

pub fn sub() -> Computation {
    binop("sub", i64::checked_sub, |a, b| a - b)
}

pub fn mul() -> Computation {
    binop("mul", i64::checked_mul, |a, b| a * b)
}

/// True division: always yields a `Float`.
pub fn div() -> Computation {
    computation(|args| {
        let (a, b) = two_numeric("div", args)?;
        let divisor = b.as_float().unwrap_or(0.0);
        if divisor == 0.0 {
            return Err(ComputeError::DivisionByZero);
        }
        Ok(Value::Float(a.as_float().unwrap_or(0.0) / divisor))
    })
}

/// Flooring integer division on two `Int`s.
pub fn floor_div() -> Computation {
    computation(|args| {
        let (a, b) = two_numeric("floor_div", args)?;
        match (a, b) {
            (Value::Int(_), Value::Int(0)) => Err(ComputeError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => {
                let q = a.checked_div(*b).ok_or(ComputeError::Overflow)?;
                let r = a % b;
                // Round toward negative infinity, matching floor semantics.
                if r != 0 && (r < 0) != (*b < 0) {
                    Ok(Value::Int(q - 1))
                } else {
                    Ok(Value::Int(q))
                }
            }
            _ => Err(ComputeError::Type(
                "floor_div expects two Int operands".to_string(),
            )),
        }
    })
}

fn binop(
    name: &'static str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Computation {
    computation(move |args| {
        let (a, b) = two_numeric(name, args)?;
        match (a, b) {
            (Value::Int(a), Value::Int(b)) => {
                int_op(*a, *b).map(Value::Int).ok_or(ComputeError::Overflow)
            }
            _ => {
                let a = a.as_float().unwrap_or(0.0);
                let b = b.as_float().unwrap_or(0.0);
                Ok(Value::Float(float_op(a, b)))
            }
        }
    })
}

fn two_numeric<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), ComputeError> {
    match args {
        [a, b] if a.is_numeric() && b.is_numeric() => Ok((a, b)),
        [_, _] => Err(ComputeError::Type(format!(
            "{name} expects numeric operands"
        ))),
        _ => Err(ComputeError::Arity {
            expected: 2,
            got: args.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::task::invoke;

    fn ints(a: i64, b: i64) -> Vec<Value> {
        vec![Value::Int(a), Value::Int(b)]
    }

    #[test]
    fn int_arithmetic() {
        assert_eq!(invoke(&add(), &ints(2, 1)), Ok(Value::Int(3)));
        assert_eq!(invoke(&sub(), &ints(2, 1)), Ok(Value::Int(1)));
        assert_eq!(invoke(&mul(), &ints(2, 1)), Ok(Value::Int(2)));
        assert_eq!(invoke(&floor_div(), &ints(2, 1)), Ok(Value::Int(2)));
    }

    #[test]
    fn float_promotion() {
        assert_eq!(
            invoke(&add(), &[Value::Int(1), Value::Float(0.5)]),
            Ok(Value::Float(1.5))
        );
        assert_eq!(invoke(&div(), &ints(3, 2)), Ok(Value::Float(1.5)));
    }

    #[test]
    fn floor_div_rounds_toward_negative_infinity() {
        assert_eq!(invoke(&floor_div(), &ints(-7, 2)), Ok(Value::Int(-4)));
        assert_eq!(invoke(&floor_div(), &ints(7, -2)), Ok(Value::Int(-4)));
        assert_eq!(invoke(&floor_div(), &ints(-7, -2)), Ok(Value::Int(3)));
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(invoke(&div(), &ints(1, 0)), Err(ComputeError::DivisionByZero));
        assert_eq!(
            invoke(&floor_div(), &ints(1, 0)),
            Err(ComputeError::DivisionByZero)
        );
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            invoke(&mul(), &ints(i64::MAX, 2)),
            Err(ComputeError::Overflow)
        );
    }

    #[test]
    fn arity_and_type_errors() {
        assert_eq!(
            invoke(&add(), &[Value::Int(1)]),
            Err(ComputeError::Arity {
                expected: 2,
                got: 1
            })
        );
        assert!(matches!(
            invoke(&add(), &[Value::Str("a".into()), Value::Int(1)]),
            Err(ComputeError::Type(_))
        ));
        assert_eq!(invoke(&echo(), &[Value::Int(9)]), Ok(Value::Int(9)));
        assert_eq!(invoke(&constant(Value::Int(5)), &[]), Ok(Value::Int(5)));
    }
}

//! # Mathematical Operations
//!
//! Arithmetic atoms. All are pure functions over `Value::Number` (f64).
//!
//! ## Atoms Provided
//!
//! - **Arithmetic**: `+`, `-`, `*`, `/`, `mod`
//! - **Math Functions**: `abs`, `min`, `max`

use crate::atoms::helpers::{extract_number, require_arity, require_min_arity, AtomResult};
use crate::atoms::AtomRegistry;
use crate::runtime::value::{NativeFn, Thrown, Value};

fn numbers(name: &str, args: &[Value]) -> Result<Vec<f64>, Thrown> {
    args.iter().map(|arg| extract_number(name, arg)).collect()
}

// ============================================================================
// ARITHMETIC OPERATIONS
// ============================================================================

/// Adds numbers.
///
/// Usage: (+ <a> <b> ...)
///
/// Example:
///   (+ 1 2 3) ; => 6
pub const ATOM_ADD: NativeFn = |_context, args| Ok(Value::Number(numbers("+", args)?.iter().sum()));

/// Subtracts numbers from the first, or negates a single number.
///
/// Usage: (- <a> <b> ...)
///
/// Example:
///   (- 5 2) ; => 3
///   (- 4)   ; => -4
pub const ATOM_SUB: NativeFn = |_context, args| {
    require_min_arity("-", args, 1)?;
    let numbers = numbers("-", args)?;
    Ok(Value::Number(match numbers.split_first() {
        Some((first, [])) => -first,
        Some((first, rest)) => rest.iter().fold(*first, |acc, n| acc - n),
        None => 0.0,
    }))
};

/// Multiplies numbers.
///
/// Usage: (* <a> <b> ...)
///
/// Example:
///   (* 2 3 4) ; => 24
pub const ATOM_MUL: NativeFn =
    |_context, args| Ok(Value::Number(numbers("*", args)?.iter().product()));

/// Divides the first number by the rest.
///
/// Usage: (/ <a> <b> ...)
///
/// Example:
///   (/ 10 4) ; => 2.5
///   (/ 1 0)  ; raises ZeroDivisionError
pub const ATOM_DIV: NativeFn = |_context, args| {
    require_min_arity("/", args, 2)?;
    let numbers = numbers("/", args)?;
    let mut result = numbers[0];
    for divisor in &numbers[1..] {
        if *divisor == 0.0 {
            return Err(Thrown::error("ZeroDivisionError", "division by zero"));
        }
        result /= divisor;
    }
    Ok(Value::Number(result))
};

/// Remainder of integer-valued division, with the sign of the divisor.
///
/// Usage: (mod <a> <b>)
///
/// Example:
///   (mod 7 3)  ; => 1
///   (mod -7 3) ; => 2
pub const ATOM_MOD: NativeFn = |_context, args| {
    require_arity("mod", args, 2)?;
    let a = extract_number("mod", &args[0])?;
    let b = extract_number("mod", &args[1])?;
    if b == 0.0 {
        return Err(Thrown::error("ZeroDivisionError", "modulo by zero"));
    }
    Ok(Value::Number(a - b * (a / b).floor()))
};

// ============================================================================
// MATH FUNCTIONS
// ============================================================================

pub const ATOM_ABS: NativeFn = |_context, args| {
    require_arity("abs", args, 1)?;
    Ok(Value::Number(extract_number("abs", &args[0])?.abs()))
};

pub const ATOM_MIN: NativeFn = |_context, args| fold_extreme("min", args, f64::min);

pub const ATOM_MAX: NativeFn = |_context, args| fold_extreme("max", args, f64::max);

fn fold_extreme(name: &str, args: &[Value], pick: fn(f64, f64) -> f64) -> AtomResult {
    require_min_arity(name, args, 1)?;
    let numbers = numbers(name, args)?;
    Ok(Value::Number(numbers[1..].iter().fold(numbers[0], |acc, n| pick(acc, *n))))
}

// ============================================================================
// REGISTRATION
// ============================================================================

pub fn register_math_atoms(registry: &mut AtomRegistry) {
    registry.register("+", ATOM_ADD);
    registry.register("-", ATOM_SUB);
    registry.register("*", ATOM_MUL);
    registry.register("/", ATOM_DIV);
    registry.register("mod", ATOM_MOD);
    registry.register("abs", ATOM_ABS);
    registry.register("min", ATOM_MIN);
    registry.register("max", ATOM_MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::eval::EvaluationContext;

    fn call(atom: NativeFn, args: &[Value]) -> AtomResult {
        atom(&mut EvaluationContext::new(), args)
    }

    fn n(value: f64) -> Value {
        Value::Number(value)
    }

    #[test]
    fn arithmetic() {
        assert_eq!(call(ATOM_ADD, &[n(1.0), n(2.0), n(3.0)]).unwrap(), n(6.0));
        assert_eq!(call(ATOM_ADD, &[]).unwrap(), n(0.0));
        assert_eq!(call(ATOM_SUB, &[n(5.0), n(2.0)]).unwrap(), n(3.0));
        assert_eq!(call(ATOM_SUB, &[n(4.0)]).unwrap(), n(-4.0));
        assert_eq!(call(ATOM_MUL, &[n(2.0), n(3.0), n(4.0)]).unwrap(), n(24.0));
        assert_eq!(call(ATOM_DIV, &[n(10.0), n(4.0)]).unwrap(), n(2.5));
        assert_eq!(call(ATOM_MOD, &[n(-7.0), n(3.0)]).unwrap(), n(2.0));
        assert_eq!(call(ATOM_MAX, &[n(1.0), n(9.0), n(3.0)]).unwrap(), n(9.0));
    }

    #[test]
    fn division_by_zero_throws() {
        let err = call(ATOM_DIV, &[n(1.0), n(0.0)]).unwrap_err();
        assert_eq!(err.as_error().unwrap().name, "ZeroDivisionError");
    }

    #[test]
    fn non_numbers_are_type_errors() {
        let err = call(ATOM_ADD, &[n(1.0), Value::String("2".into())]).unwrap_err();
        assert_eq!(err.as_error().unwrap().name, "TypeError");
    }
}

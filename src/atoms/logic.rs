//! # Logic and Comparison Operations
//!
//! ## Atoms Provided
//!
//! - **Equality**: `=`, `not=` (deep, structural)
//! - **Ordering**: `<`, `>`, `<=`, `>=` (numbers, or strings compared lexically)
//! - **Negation**: `not`

use std::cmp::Ordering;

use crate::atoms::helpers::{require_arity, require_min_arity, type_error, AtomResult};
use crate::atoms::AtomRegistry;
use crate::runtime::value::{NativeFn, Thrown, Value};

// ============================================================================
// EQUALITY
// ============================================================================

/// True when every argument is deeply equal to the first.
///
/// Usage: (= <a> <b> ...)
///
/// Example:
///   (= [1 {:a 2}] [1 {:a 2}]) ; => true
pub const ATOM_EQ: NativeFn = |_context, args| {
    require_min_arity("=", args, 1)?;
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
};

pub const ATOM_NOT_EQ: NativeFn = |context, args| {
    let equal = ATOM_EQ(context, args)?;
    Ok(Value::Bool(!equal.is_truthy()))
};

// ============================================================================
// ORDERING
// ============================================================================

fn compare(name: &str, a: &Value, b: &Value) -> Result<Ordering, Thrown> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Number(_), other) | (Value::String(_), other) => {
            Err(type_error(name, &format!("a {}", a.type_name()), other))
        }
        (other, _) => Err(type_error(name, "a number or string", other)),
    }
}

/// Checks that each adjacent pair of arguments satisfies `accept`.
fn chain(name: &str, args: &[Value], accept: fn(Ordering) -> bool) -> AtomResult {
    require_min_arity(name, args, 2)?;
    for pair in args.windows(2) {
        let ordering = compare(name, &pair[0], &pair[1])?;
        let incomparable = matches!((&pair[0], &pair[1]), (Value::Number(x), Value::Number(y)) if x.is_nan() || y.is_nan());
        if incomparable || !accept(ordering) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub const ATOM_LT: NativeFn = |_context, args| chain("<", args, Ordering::is_lt);
pub const ATOM_GT: NativeFn = |_context, args| chain(">", args, Ordering::is_gt);
pub const ATOM_LTE: NativeFn = |_context, args| chain("<=", args, Ordering::is_le);
pub const ATOM_GTE: NativeFn = |_context, args| chain(">=", args, Ordering::is_ge);

// ============================================================================
// NEGATION
// ============================================================================

/// Usage: (not <x>)
///
/// Example:
///   (not nil) ; => true
pub const ATOM_NOT: NativeFn = |_context, args| {
    require_arity("not", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
};

pub fn register_logic_atoms(registry: &mut AtomRegistry) {
    registry.register("=", ATOM_EQ);
    registry.register("not=", ATOM_NOT_EQ);
    registry.register("<", ATOM_LT);
    registry.register(">", ATOM_GT);
    registry.register("<=", ATOM_LTE);
    registry.register(">=", ATOM_GTE);
    registry.register("not", ATOM_NOT);
}

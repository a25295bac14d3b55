//! # Atom Helper Infrastructure
//!
//! Argument checking and typed extraction shared by every atom. All failures
//! are `Thrown` errors with the atom's name in the message, so they read the
//! same from whichever atom raised them.

use im::{OrdMap, Vector};

use crate::runtime::value::{MapKey, Thrown, Value};

/// Return type of every atom.
pub type AtomResult = Result<Value, Thrown>;

// ============================================================================
// ARITY
// ============================================================================

pub fn require_arity(name: &str, args: &[Value], expected: usize) -> Result<(), Thrown> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Thrown::arity(name, &expected.to_string(), args.len()))
    }
}

pub fn require_min_arity(name: &str, args: &[Value], min: usize) -> Result<(), Thrown> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(Thrown::arity(name, &format!("at least {min}"), args.len()))
    }
}

pub fn require_arity_range(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), Thrown> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(Thrown::arity(name, &format!("{min} to {max}"), args.len()))
    }
}

// ============================================================================
// TYPE EXTRACTION
// ============================================================================

/// Builds the error for an argument of the wrong type.
pub fn type_error(name: &str, expected: &str, found: &Value) -> Thrown {
    Thrown::type_error(format!(
        "{name} expects {expected}, got {} {found}",
        found.type_name()
    ))
}

pub fn extract_number(name: &str, value: &Value) -> Result<f64, Thrown> {
    value.as_number().ok_or_else(|| type_error(name, "a number", value))
}

/// Extracts a non-negative whole number, as used for indices.
pub fn extract_index(name: &str, value: &Value) -> Result<usize, Thrown> {
    match value.as_number() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(type_error(name, "a non-negative integer", value)),
    }
}

pub fn extract_string<'v>(name: &str, value: &'v Value) -> Result<&'v str, Thrown> {
    value.as_str().ok_or_else(|| type_error(name, "a string", value))
}

/// Lists are taken as they are; `nil` is the empty list.
pub fn extract_list(name: &str, value: &Value) -> Result<Vector<Value>, Thrown> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Nil => Ok(Vector::new()),
        other => Err(type_error(name, "a list", other)),
    }
}

pub fn extract_map(name: &str, value: &Value) -> Result<OrdMap<MapKey, Value>, Thrown> {
    match value {
        Value::Map(map) => Ok(map.clone()),
        Value::Nil => Ok(OrdMap::new()),
        other => Err(type_error(name, "a map", other)),
    }
}

pub fn extract_key(name: &str, value: &Value) -> Result<MapKey, Thrown> {
    MapKey::from_value(value).ok_or_else(|| type_error(name, "a keyword or string key", value))
}

pub fn extract_callable<'v>(name: &str, value: &'v Value) -> Result<&'v Value, Thrown> {
    if value.is_callable() {
        Ok(value)
    } else {
        Err(type_error(name, "a function", value))
    }
}

//! # Execution Atoms
//!
//! Error values, raising, type inspection, and the queue instrumented
//! programs record their doctests on.
//!
//! ## Atoms Provided
//!
//! - **Errors**: `error`, `raise`, `error-name`, `error-message`
//! - **Types**: `type-of`
//! - **Doctest queue**: `doctest/queue`, `enqueue!`

use crate::atoms::helpers::{extract_string, require_arity, require_arity_range, type_error};
use crate::atoms::AtomRegistry;
use crate::runtime::value::{ErrorValue, NativeFn, Queue, Thrown, Value};

// ============================================================================
// ERRORS
// ============================================================================

/// Builds an error value. Does not raise it.
///
/// Usage: (error <name> [message])
///
/// Example:
///   (error "DivisionError" "cannot divide by zero")
pub const ATOM_ERROR: NativeFn = |_context, args| {
    require_arity_range("error", args, 1, 2)?;
    let name = extract_string("error", &args[0])?;
    let message = match args.get(1) {
        Some(message) => extract_string("error", message)?,
        None => "",
    };
    Ok(Value::error(name, message))
};

/// Throws a value, usually one built with `error`.
///
/// Usage: (raise <value>)
///
/// Example:
///   (raise (error "DivisionError" "cannot divide by zero"))
pub const ATOM_RAISE: NativeFn = |_context, args| {
    require_arity("raise", args, 1)?;
    Err(Thrown(args[0].clone()))
};

fn extract_error<'v>(name: &str, value: &'v Value) -> Result<&'v ErrorValue, Thrown> {
    value.as_error().ok_or_else(|| type_error(name, "an error", value))
}

pub const ATOM_ERROR_NAME: NativeFn = |_context, args| {
    require_arity("error-name", args, 1)?;
    Ok(Value::String(extract_error("error-name", &args[0])?.name.clone()))
};

pub const ATOM_ERROR_MESSAGE: NativeFn = |_context, args| {
    require_arity("error-message", args, 1)?;
    Ok(Value::String(extract_error("error-message", &args[0])?.message.clone()))
};

// ============================================================================
// TYPES
// ============================================================================

/// Usage: (type-of <value>)
///
/// Example:
///   (type-of [1]) ; => "list"
pub const ATOM_TYPE_OF: NativeFn = |_context, args| {
    require_arity("type-of", args, 1)?;
    Ok(Value::String(args[0].type_name().to_string()))
};

// ============================================================================
// DOCTEST QUEUE
// ============================================================================

/// Creates an empty queue.
pub const ATOM_QUEUE: NativeFn = |_context, args| {
    require_arity("doctest/queue", args, 0)?;
    Ok(Value::Queue(Queue::default()))
};

/// Usage: (enqueue! <queue> <value>)
pub const ATOM_ENQUEUE: NativeFn = |_context, args| {
    require_arity("enqueue!", args, 2)?;
    let queue = args[0]
        .as_queue()
        .ok_or_else(|| type_error("enqueue!", "a queue", &args[0]))?;
    queue.push(args[1].clone());
    Ok(Value::Nil)
};

pub fn register_execution_atoms(registry: &mut AtomRegistry) {
    registry.register("error", ATOM_ERROR);
    registry.register("raise", ATOM_RAISE);
    registry.register("error-name", ATOM_ERROR_NAME);
    registry.register("error-message", ATOM_ERROR_MESSAGE);
    registry.register("type-of", ATOM_TYPE_OF);
    registry.register("doctest/queue", ATOM_QUEUE);
    registry.register("enqueue!", ATOM_ENQUEUE);
}

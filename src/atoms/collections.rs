//! Collection operations for sx.
//!
//! Lists are `im::Vector`s and maps are `im::OrdMap`s, so every operation here
//! returns a new collection and leaves its arguments untouched. `nil` is
//! accepted wherever a list or map is expected and behaves as an empty one.

use im::Vector;

use crate::atoms::helpers::{
    extract_callable, extract_index, extract_key, extract_list, extract_map, require_arity,
    require_arity_range, type_error, AtomResult,
};
use crate::atoms::AtomRegistry;
use crate::runtime::eval::EvaluationContext;
use crate::runtime::value::{NativeFn, Thrown, Value};

// ============================================================================
// LIST OPERATIONS
// ============================================================================

/// Usage: (list <a> <b> ...)
///
/// Example:
///   (list 1 2) ; => [1 2]
pub const ATOM_LIST: NativeFn = |_context, args| Ok(Value::list(args.iter().cloned()));

/// Length of a list, map or string (in characters).
///
/// Example:
///   (len "héllo") ; => 5
pub const ATOM_LEN: NativeFn = |_context, args| {
    require_arity("len", args, 1)?;
    let len = match &args[0] {
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        Value::String(s) => s.chars().count(),
        Value::Nil => 0,
        other => return Err(type_error("len", "a list, map or string", other)),
    };
    Ok(Value::Number(len as f64))
};

pub const ATOM_FIRST: NativeFn = |_context, args| {
    require_arity("first", args, 1)?;
    Ok(extract_list("first", &args[0])?.front().cloned().unwrap_or_default())
};

pub const ATOM_REST: NativeFn = |_context, args| {
    require_arity("rest", args, 1)?;
    let mut items = extract_list("rest", &args[0])?;
    items.pop_front();
    Ok(Value::List(items))
};

/// Usage: (nth <list> <index>); `nil` when out of range.
pub const ATOM_NTH: NativeFn = |_context, args| {
    require_arity("nth", args, 2)?;
    let items = extract_list("nth", &args[0])?;
    let index = extract_index("nth", &args[1])?;
    Ok(items.get(index).cloned().unwrap_or_default())
};

/// Usage: (cons <x> <list>)
///
/// Example:
///   (cons 0 [1 2]) ; => [0 1 2]
pub const ATOM_CONS: NativeFn = |_context, args| {
    require_arity("cons", args, 2)?;
    let mut items = extract_list("cons", &args[1])?;
    items.push_front(args[0].clone());
    Ok(Value::List(items))
};

/// Concatenates lists.
///
/// Example:
///   (append [1] [] [2 3]) ; => [1 2 3]
pub const ATOM_APPEND: NativeFn = |_context, args| {
    let mut result = Vector::new();
    for arg in args {
        result.append(extract_list("append", arg)?);
    }
    Ok(Value::List(result))
};

// ============================================================================
// MAP OPERATIONS
// ============================================================================

/// Usage: (get <map> <key> [default])
///
/// Also indexes lists by number.
pub const ATOM_GET: NativeFn = |_context, args| {
    require_arity_range("get", args, 2, 3)?;
    let default = args.get(2).cloned().unwrap_or_default();
    let found = match &args[0] {
        Value::List(items) => items.get(extract_index("get", &args[1])?).cloned(),
        other => extract_map("get", other)?.get(&extract_key("get", &args[1])?).cloned(),
    };
    Ok(found.unwrap_or(default))
};

/// Usage: (assoc <map> <key> <value> ...)
///
/// Example:
///   (assoc {:a 1} :b 2) ; => {:a 1 :b 2}
pub const ATOM_ASSOC: NativeFn = |_context, args| {
    if args.len() < 3 || args.len() % 2 == 0 {
        return Err(Thrown::arity(
            "assoc",
            "a map and key/value pairs",
            args.len(),
        ));
    }
    let mut map = extract_map("assoc", &args[0])?;
    for pair in args[1..].chunks(2) {
        map.insert(extract_key("assoc", &pair[0])?, pair[1].clone());
    }
    Ok(Value::Map(map))
};

/// Keys of a map, in order.
pub const ATOM_KEYS: NativeFn = |_context, args| {
    require_arity("keys", args, 1)?;
    let map = extract_map("keys", &args[0])?;
    Ok(Value::list(map.keys().map(|key| key.to_value())))
};

// ============================================================================
// HIGHER-ORDER OPERATIONS
// ============================================================================

/// Usage: (map <fn> <list>)
///
/// Example:
///   (map (fn (x) (* x x)) [1 2 3]) ; => [1 4 9]
pub const ATOM_MAP: NativeFn = |context, args| {
    require_arity("map", args, 2)?;
    let func = extract_callable("map", &args[0])?;
    let mut result = Vector::new();
    for item in extract_list("map", &args[1])? {
        result.push_back(context.apply(func, &[item])?);
    }
    Ok(Value::List(result))
};

/// Usage: (filter <fn> <list>)
pub const ATOM_FILTER: NativeFn = |context, args| {
    require_arity("filter", args, 2)?;
    let func = extract_callable("filter", &args[0])?;
    let mut result = Vector::new();
    for item in extract_list("filter", &args[1])? {
        if context.apply(func, &[item.clone()])?.is_truthy() {
            result.push_back(item);
        }
    }
    Ok(Value::List(result))
};

/// Usage: (reduce <fn> <init> <list>)
///
/// Example:
///   (reduce + 0 [1 2 3]) ; => 6
pub const ATOM_REDUCE: NativeFn = |context, args| {
    require_arity("reduce", args, 3)?;
    let func = extract_callable("reduce", &args[0])?;
    fold(context, func, args[1].clone(), extract_list("reduce", &args[2])?)
};

fn fold(context: &mut EvaluationContext, func: &Value, init: Value, items: Vector<Value>) -> AtomResult {
    items
        .into_iter()
        .try_fold(init, |acc, item| context.apply(func, &[acc, item]))
}

pub fn register_collection_atoms(registry: &mut AtomRegistry) {
    registry.register("list", ATOM_LIST);
    registry.register("len", ATOM_LEN);
    registry.register("first", ATOM_FIRST);
    registry.register("rest", ATOM_REST);
    registry.register("nth", ATOM_NTH);
    registry.register("cons", ATOM_CONS);
    registry.register("append", ATOM_APPEND);
    registry.register("get", ATOM_GET);
    registry.register("assoc", ATOM_ASSOC);
    registry.register("keys", ATOM_KEYS);
    registry.register("map", ATOM_MAP);
    registry.register("filter", ATOM_FILTER);
    registry.register("reduce", ATOM_REDUCE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::math::ATOM_ADD;
    use crate::runtime::value::NativeFunction;

    fn call(atom: NativeFn, args: &[Value]) -> AtomResult {
        atom(&mut EvaluationContext::new(), args)
    }

    fn nums(values: &[f64]) -> Value {
        Value::list(values.iter().copied().map(Value::Number))
    }

    #[test]
    fn list_basics() {
        let list = nums(&[1.0, 2.0, 3.0]);
        assert_eq!(call(ATOM_LEN, &[list.clone()]).unwrap(), Value::Number(3.0));
        assert_eq!(call(ATOM_FIRST, &[list.clone()]).unwrap(), Value::Number(1.0));
        assert_eq!(call(ATOM_REST, &[list.clone()]).unwrap(), nums(&[2.0, 3.0]));
        assert_eq!(call(ATOM_NTH, &[list.clone(), Value::Number(5.0)]).unwrap(), Value::Nil);
        assert_eq!(
            call(ATOM_CONS, &[Value::Number(0.0), list.clone()]).unwrap(),
            nums(&[0.0, 1.0, 2.0, 3.0])
        );
        assert_eq!(
            call(ATOM_APPEND, &[list, Value::Nil, nums(&[4.0])]).unwrap(),
            nums(&[1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(call(ATOM_FIRST, &[Value::Nil]).unwrap(), Value::Nil);
    }

    #[test]
    fn maps() {
        let map = call(
            ATOM_ASSOC,
            &[Value::Nil, Value::Keyword("a".into()), Value::Number(1.0)],
        )
        .unwrap();
        assert_eq!(map.to_string(), "{:a 1}");
        assert_eq!(
            call(ATOM_GET, &[map.clone(), Value::Keyword("a".into())]).unwrap(),
            Value::Number(1.0)
        );
        assert_eq!(
            call(ATOM_GET, &[map.clone(), Value::Keyword("b".into()), Value::Number(0.0)]).unwrap(),
            Value::Number(0.0)
        );
        assert_eq!(call(ATOM_KEYS, &[map]).unwrap().to_string(), "[:a]");
    }

    #[test]
    fn reduce_with_native_function() {
        let add = Value::Native(NativeFunction {
            name: "+",
            func: ATOM_ADD,
        });
        let sum = call(ATOM_REDUCE, &[add, Value::Number(0.0), nums(&[1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(sum, Value::Number(6.0));
    }

    #[test]
    fn map_requires_a_function() {
        let err = call(ATOM_MAP, &[Value::Number(1.0), nums(&[1.0])]).unwrap_err();
        assert_eq!(err.as_error().unwrap().name, "TypeError");
    }
}

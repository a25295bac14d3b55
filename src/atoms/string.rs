//! # String Manipulation Atoms
//!
//! ## Atoms Provided
//!
//! - **`str`**: concatenates values; strings contribute their contents, other
//!   values their printed form.
//! - **`upper`**, **`lower`**: case conversion.

use crate::atoms::helpers::{extract_string, require_arity};
use crate::atoms::AtomRegistry;
use crate::runtime::value::{NativeFn, Value};

/// Usage: (str <value1> <value2> ...)
///
/// Example:
///   (str "n = " 4) ; => "n = 4"
pub const ATOM_STR: NativeFn = |_context, args| {
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::String(s) => result.push_str(s),
            other => result.push_str(&other.to_string()),
        }
    }
    Ok(Value::String(result))
};

pub const ATOM_UPPER: NativeFn = |_context, args| {
    require_arity("upper", args, 1)?;
    Ok(Value::String(extract_string("upper", &args[0])?.to_uppercase()))
};

pub const ATOM_LOWER: NativeFn = |_context, args| {
    require_arity("lower", args, 1)?;
    Ok(Value::String(extract_string("lower", &args[0])?.to_lowercase()))
};

pub fn register_string_atoms(registry: &mut AtomRegistry) {
    registry.register("str", ATOM_STR);
    registry.register("upper", ATOM_UPPER);
    registry.register("lower", ATOM_LOWER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::eval::EvaluationContext;

    #[test]
    fn str_concatenates_printed_values() {
        let args = [
            Value::String("n = ".into()),
            Value::Number(4.0),
            Value::Keyword("k".into()),
        ];
        let result = ATOM_STR(&mut EvaluationContext::new(), &args).unwrap();
        assert_eq!(result, Value::String("n = 4:k".into()));
    }

    #[test]
    fn case_conversion() {
        let mut context = EvaluationContext::new();
        let shout = ATOM_UPPER(&mut context, &[Value::String("hi".into())]).unwrap();
        assert_eq!(shout, Value::String("HI".into()));
        assert!(ATOM_LOWER(&mut context, &[Value::Nil]).is_err());
    }
}

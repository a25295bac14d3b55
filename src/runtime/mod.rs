//! # sx runtime
//!
//! - **`value`**: runtime values, equality and printing
//! - **`env`**: lexical environments
//! - **`eval`**: the evaluator and its special forms

pub mod env;
pub mod eval;
pub mod value;

pub use env::{Env, WeakEnv};
pub use eval::EvaluationContext;
pub use value::{ErrorValue, MapKey, NativeFn, NativeFunction, Queue, Thrown, Value};

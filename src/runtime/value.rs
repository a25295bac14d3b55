//! Runtime values of the sx language.
//!
//! All evaluation produces or manipulates these types. Lists and maps are
//! persistent (`im`) collections, so passing them around is cheap and values
//! stay immutable once built. Equality is structural; the canonical `Display`
//! form is what doctest reports show.

use std::{cell::RefCell, fmt, rc::Rc};

use im::{OrdMap, Vector};

use crate::ast::AstNode;
use crate::runtime::env::Env;
use crate::runtime::eval::EvaluationContext;

/// Signature shared by every native function (atom).
pub type NativeFn = fn(context: &mut EvaluationContext, args: &[Value]) -> Result<Value, Thrown>;

/// Canonical runtime value for sx evaluation.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Keyword(String),
    /// Only produced by `quote`.
    Symbol(String),
    List(Vector<Value>),
    Map(OrdMap<MapKey, Value>),
    Lambda(Rc<Lambda>),
    Native(NativeFunction),
    Error(ErrorValue),
    Queue(Queue),
}

/// Keys allowed in maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Keyword(String),
    String(String),
}

/// A user-defined function with its captured environment.
pub struct Lambda {
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Receives the remaining arguments as a list (`(fn (a & rest) ...)`).
    pub rest: Option<String>,
    pub body: Vec<AstNode>,
    pub env: Env,
}

/// A named Rust function exposed to sx.
#[derive(Debug, Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

/// The value built by `(error name message)` and thrown by `raise`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
}

/// Shared, append-only queue of values. Identity matters: every holder sees
/// the same entries.
#[derive(Clone, Default)]
pub struct Queue(Rc<RefCell<Vec<Value>>>);

/// A value in flight after `raise`, or a runtime error of the language itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown(pub Value);

// ============================================================================
// VALUE API
// ============================================================================

impl Value {
    /// Returns the type name of the value (as reported by `type-of`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Lambda(_) | Value::Native(_) => "fn",
            Value::Error(_) => "error",
            Value::Queue(_) => "queue",
        }
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_queue(&self) -> Option<&Queue> {
        match self {
            Value::Queue(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OrdMap<MapKey, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Lambda(_) | Value::Native(_))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Value::Error(ErrorValue {
            name: name.into(),
            message: message.into(),
        })
    }

    /// Looks up a keyword entry of a map value.
    pub fn get_keyword(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(&MapKey::Keyword(key.to_string()))
    }
}

impl MapKey {
    /// Converts a value into a map key, if it is a keyword or string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Keyword(k) => Some(MapKey::Keyword(k.clone())),
            Value::String(s) => Some(MapKey::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Keyword(k) => Value::Keyword(k.clone()),
            MapKey::String(s) => Value::String(s.clone()),
        }
    }
}

impl Queue {
    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns every entry, in enqueue order.
    pub fn drain(&self) -> Vec<Value> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn ptr_eq(&self, other: &Queue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Thrown {
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        Thrown(Value::error(name, message))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::error("TypeError", message)
    }

    pub fn arity(name: &str, expected: &str, actual: usize) -> Self {
        Self::error(
            "ArityError",
            format!("{name} expects {expected} arguments, got {actual}"),
        )
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        self.0.as_error()
    }

    /// Renders the thrown value as `! Name` or `! Name: message`.
    pub fn display(&self, include_message: bool) -> String {
        match self.as_error() {
            Some(error) if include_message => format!("! {}: {}", error.name, error.message),
            Some(error) => format!("! {}", error.name),
            None => format!("! {}", self.0),
        }
    }
}

// ============================================================================
// EQUALITY
// ============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Queue(a), Value::Queue(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", quote(s)),
            Value::Keyword(k) => write!(f, ":{k}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{} {value}", key.to_value())?;
                }
                write!(f, "}}")
            }
            Value::Lambda(lambda) => match &lambda.name {
                Some(name) => write!(f, "<fn {name}>"),
                None => write!(f, "<fn>"),
            },
            Value::Native(native) => write!(f, "<native {}>", native.name),
            Value::Error(error) => write!(
                f,
                "(error {} {})",
                quote(&error.name),
                quote(&error.message)
            ),
            Value::Queue(_) => write!(f, "<queue>"),
        }
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("rest", &self.rest)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue({} entries)", self.len())
    }
}

/// Formats numbers the way sx prints them: integral values without a
/// fractional part, infinities spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Renders `s` as an sx string literal.
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        let a = Value::list([Value::Number(1.0), Value::String("x".into())]);
        let b = Value::list([Value::Number(1.0), Value::String("x".into())]);
        assert_eq!(a, b);
        assert_ne!(a, Value::list([Value::Number(1.0)]));
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Nil, Value::Bool(false));
    }

    #[test]
    fn canonical_display() {
        let map: OrdMap<MapKey, Value> = [
            (MapKey::Keyword("a".into()), Value::Number(1.0)),
            (MapKey::String("b".into()), Value::Number(0.5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(Value::Map(map).to_string(), "{:a 1 \"b\" 0.5}");
        assert_eq!(Value::String("say \"hi\"".into()).to_string(), r#""say \"hi\"""#);
        assert_eq!(
            Value::error("TypeError", "bad").to_string(),
            r#"(error "TypeError" "bad")"#
        );
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn thrown_display() {
        let thrown = Thrown::error("DivisionError", "cannot divide by zero");
        assert_eq!(thrown.display(true), "! DivisionError: cannot divide by zero");
        assert_eq!(thrown.display(false), "! DivisionError");
        assert_eq!(Thrown(Value::Number(3.0)).display(true), "! 3");
    }

    #[test]
    fn queue_is_shared() {
        let queue = Queue::default();
        let alias = queue.clone();
        alias.push(Value::Nil);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain().len(), 1);
        assert!(alias.is_empty());
    }
}

//! AST module for the sx language
//!
//! This module provides the Abstract Syntax Tree types produced by the parser
//! and consumed by the evaluator. Every node carries the byte span it was
//! parsed from so that syntax and evaluation errors can point into the source.

// ============================================================================
// IMPORTS
// ============================================================================

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A byte range in the source text.
///
/// # Examples
///
/// ```rust
/// use sx_doctest::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

/// Canonical AST node type. Nodes are shared so closures can keep their body
/// alive without copying the tree.
pub type AstNode = Spanned<Arc<Expr>>;

/// The core AST node for sx expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Keyword(String),
    Symbol(String),
    /// `( ... )`: a call or a special form.
    List(Vec<AstNode>),
    /// `[ ... ]`: a list literal whose elements are evaluated.
    Vector(Vec<AstNode>),
    /// `{ k v ... }`: a map literal, stored as alternating keys and values.
    Map(Vec<AstNode>),
    /// `'x`
    Quote(AstNode),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Expr {
    /// Returns a short user-facing name for the kind of expression.
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Nil => "nil",
            Expr::Bool(_) => "bool",
            Expr::Number(_) => "number",
            Expr::String(_) => "string",
            Expr::Keyword(_) => "keyword",
            Expr::Symbol(_) => "symbol",
            Expr::List(_) => "form",
            Expr::Vector(_) => "list literal",
            Expr::Map(_) => "map literal",
            Expr::Quote(_) => "quote",
        }
    }

    /// Returns the symbol name if this is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the head symbol of a `( ... )` form, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sx_doctest::syntax::parser::parse;
    /// let nodes = parse("(define x 1)", "example").unwrap();
    /// assert_eq!(nodes[0].value.head_symbol(), Some("define"));
    /// ```
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Expr::List(items) => items.first().and_then(|head| head.value.as_symbol()),
            _ => None,
        }
    }
}

/// Builds a node from an expression and span.
pub fn node(expr: Expr, span: Span) -> AstNode {
    Spanned {
        value: Arc::new(expr),
        span,
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nil => write!(f, "nil"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Number(n) => write!(f, "{n}"),
            Expr::String(s) => write!(f, "{s:?}"),
            Expr::Keyword(k) => write!(f, ":{k}"),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::List(items) => write_seq(f, "(", items, ")"),
            Expr::Vector(items) => write_seq(f, "[", items, "]"),
            Expr::Map(items) => write_seq(f, "{", items, "}"),
            Expr::Quote(inner) => write!(f, "'{}", inner.value),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[AstNode], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item.value)?;
    }
    write!(f, "{close}")
}

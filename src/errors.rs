//! Error handling for the doctest pipeline.
//!
//! Every failure that escapes the pipeline is a [`DoctestError`]. Errors raised
//! *inside* examples never become a `DoctestError`: the execution engine folds
//! them into test results. What remains here is configuration problems, I/O,
//! syntax errors in the (rewritten) program, and errors thrown by top-level
//! code that is not part of any example.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

/// Unified error type for the doctest pipeline.
#[derive(Debug, Error, Diagnostic)]
pub enum DoctestError {
    #[error("Invalid {option} `{value}'")]
    #[diagnostic(
        code(doctest::config::invalid_option),
        help("run with --help to see the accepted values")
    )]
    InvalidOption { option: &'static str, value: String },

    #[error("Cannot infer type from extension")]
    #[diagnostic(
        code(doctest::config::unknown_dialect),
        help("name the file *.sx or *.sxl, or pass --type explicitly")
    )]
    UnknownDialect { path: PathBuf },

    #[error("Failed to read `{}`", path.display())]
    #[diagnostic(code(doctest::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Syntax error: {message}")]
    #[diagnostic(code(doctest::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Uncaught error outside of any example: {display}")]
    #[diagnostic(
        code(doctest::eval::uncaught),
        help("top-level code raised while the instrumented program was loading")
    )]
    Uncaught { display: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(doctest::internal))]
    Internal { message: String },
}

impl DoctestError {
    /// Builds a syntax error pointing at `span` inside `source`.
    pub fn syntax(message: impl Into<String>, name: &str, source: &str, span: Span) -> Self {
        DoctestError::Syntax {
            message: message.into(),
            src: NamedSource::new(name, source.to_string()),
            span: to_source_span(span),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DoctestError::Internal {
            message: message.into(),
        }
    }

    pub fn invalid_option(option: &'static str, value: impl Into<String>) -> Self {
        DoctestError::InvalidOption {
            option,
            value: value.into(),
        }
    }

    /// Returns true for errors raised before any file is read.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DoctestError::InvalidOption { .. } | DoctestError::UnknownDialect { .. }
        )
    }
}

/// Converts an AST span into a miette span.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start.into(), span.len())
}

//! Configuration of a doctest run.

use serde::Serialize;

use crate::errors::DoctestError;
use crate::literate::{Dialect, ModuleMode};

/// Options for [`crate::engine::doctest`].
///
/// Values given as text are validated when they are set, so a bad value is
/// reported before any file is read.
///
/// ```rust
/// use sx_doctest::options::Options;
/// let options = Options::default().with_module("commonjs").unwrap();
/// assert!(options.module.exports_queue());
/// assert_eq!(
///     Options::default().with_dialect("coffee").unwrap_err().to_string(),
///     "Invalid type `coffee'"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    /// Overrides the dialect inferred from the file extension.
    pub dialect: Option<Dialect>,
    /// Text that must start a comment line (after the comment marker) for the
    /// line to take part in a doctest.
    pub prefix: String,
    pub module: ModuleMode,
    /// Return the rewritten program instead of running it.
    pub print: bool,
    /// Suppress progress and report output.
    pub silent: bool,
}

impl Options {
    pub fn with_module(mut self, value: &str) -> Result<Self, DoctestError> {
        self.module = value.parse()?;
        Ok(self)
    }

    pub fn with_dialect(mut self, value: &str) -> Result<Self, DoctestError> {
        self.dialect = Some(value.parse()?);
        Ok(self)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_print(mut self, print: bool) -> Self {
        self.print = print;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Progress lines are shown only when running visibly.
    pub fn announces_progress(&self) -> bool {
        !(self.silent || self.print)
    }
}

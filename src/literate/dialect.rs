//! Source dialects and the compiler seam between them.

use std::{fmt, path::Path, str::FromStr};

use serde::Serialize;

use crate::errors::DoctestError;
use crate::syntax::parser;

/// The flavours of source file doctests can be extracted from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Plain sx: `;` line comments and `#| |#` block comments. Run directly.
    Sx,
    /// Literate sx: whole-line `#` comments. Compiled to sx before running.
    Sxl,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Sx, Dialect::Sxl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sx => "sx",
            Dialect::Sxl => "sxl",
        }
    }

    /// Infers the dialect from a file extension.
    pub fn infer(path: &Path) -> Result<Self, DoctestError> {
        let extension = path.extension().and_then(|ext| ext.to_str());
        Self::ALL
            .into_iter()
            .find(|dialect| Some(dialect.as_str()) == extension)
            .ok_or_else(|| DoctestError::UnknownDialect {
                path: path.to_path_buf(),
            })
    }

    /// The compiler that turns this dialect's rewritten text into plain sx.
    pub fn compiler(&self) -> Box<dyn Compiler> {
        match self {
            Dialect::Sx => Box::new(Identity),
            Dialect::Sxl => Box::new(SxlCompiler),
        }
    }
}

impl FromStr for Dialect {
    type Err = DoctestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dialect| dialect.as_str() == s)
            .ok_or_else(|| DoctestError::invalid_option("type", s))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// COMPILERS
// ============================================================================

/// Turns program text of one dialect into directly executable sx.
pub trait Compiler {
    fn compile(&self, source: &str, name: &str) -> Result<String, DoctestError>;
}

/// sx is already executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Compiler for Identity {
    fn compile(&self, source: &str, _name: &str) -> Result<String, DoctestError> {
        Ok(source.to_string())
    }
}

/// Rewrites literate `#` comments into `;` comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SxlCompiler;

impl Compiler for SxlCompiler {
    fn compile(&self, source: &str, name: &str) -> Result<String, DoctestError> {
        parser::compile_sxl(source, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_from_extension() {
        assert_eq!(Dialect::infer(Path::new("lib/math.sx")).unwrap(), Dialect::Sx);
        assert_eq!(Dialect::infer(Path::new("notes.sxl")).unwrap(), Dialect::Sxl);
        let err = Dialect::infer(Path::new("README.md")).unwrap_err();
        assert_eq!(err.to_string(), "Cannot infer type from extension");
        assert!(Dialect::infer(Path::new("Makefile")).is_err());
    }

    #[test]
    fn parse_option_value() {
        assert_eq!("sxl".parse::<Dialect>().unwrap(), Dialect::Sxl);
        let err = "coffee".parse::<Dialect>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid type `coffee'");
    }
}

//! Module envelopes for the rewritten program.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::errors::DoctestError;
use crate::literate::harness::QUEUE_BINDING;

/// How the rewritten program is packaged.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleMode {
    /// The program as rewritten.
    #[default]
    None,
    /// Programs written as `(define-module deps factory)`; a shim runs the
    /// factory immediately.
    Amd,
    /// The program is wrapped in its own scope and the queue is exported, so
    /// it can be loaded as a module file.
    CommonJs,
}

impl ModuleMode {
    pub const ALL: [ModuleMode; 3] = [ModuleMode::None, ModuleMode::Amd, ModuleMode::CommonJs];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleMode::None => "none",
            ModuleMode::Amd => "amd",
            ModuleMode::CommonJs => "commonjs",
        }
    }

    /// True when the program must be run by loading it as a module file.
    pub fn exports_queue(&self) -> bool {
        matches!(self, ModuleMode::CommonJs)
    }

    /// Wraps the rewritten program for this mode.
    pub fn wrap(&self, source: &str) -> String {
        match self {
            ModuleMode::None => source.to_string(),
            ModuleMode::Amd => [
                "(define (define-module deps factory)",
                "  (factory))",
                "",
                source,
            ]
            .join("\n"),
            ModuleMode::CommonJs => {
                let body = source.strip_suffix('\n').unwrap_or(source);
                [
                    format!("(define {QUEUE_BINDING} (doctest/queue))"),
                    String::new(),
                    "(let ()".to_string(),
                    format!("{body}\n  nil)"),
                    String::new(),
                    format!("(export! \"{QUEUE_BINDING}\" {QUEUE_BINDING})"),
                    String::new(),
                ]
                .join("\n")
            }
        }
    }
}

impl FromStr for ModuleMode {
    type Err = DoctestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DoctestError::invalid_option("module", s))
    }
}

impl fmt::Display for ModuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        assert_eq!("amd".parse::<ModuleMode>().unwrap(), ModuleMode::Amd);
        assert_eq!("commonjs".parse::<ModuleMode>().unwrap(), ModuleMode::CommonJs);
        assert_eq!(
            "esm".parse::<ModuleMode>().unwrap_err().to_string(),
            "Invalid module `esm'"
        );
    }

    #[test]
    fn none_is_identity() {
        assert_eq!(ModuleMode::None.wrap("(f)\n"), "(f)\n");
    }

    #[test]
    fn commonjs_envelope() {
        let wrapped = ModuleMode::CommonJs.wrap("(define x 1)\n(f x)\n");
        assert_eq!(
            wrapped,
            "(define __doctest (doctest/queue))\n\n(let ()\n(define x 1)\n(f x)\n  nil)\n\n\
             (export! \"__doctest\" __doctest)\n"
        );
    }

    #[test]
    fn amd_shim_comes_first() {
        let wrapped = ModuleMode::Amd.wrap("(define-module [] (fn () 1))");
        assert!(wrapped.starts_with("(define (define-module deps factory)"));
        assert!(wrapped.ends_with("(define-module [] (fn () 1))"));
    }
}

//! Parsing of sx source text (pest grammar in `grammar.pest`).

pub mod parser;

pub use parser::{compile_sxl, parse, scan_comments};

//! # sx-doctest
//!
//! Literate doctests for the sx language. Examples written in comments
//!
//! ```text
//! ; > (+ 2 2)
//! ; 4
//! ```
//!
//! are extracted, spliced back into the source as instrumentation, and run;
//! each example's actual value is compared with its expected one.
//!
//! ## Module Structure
//!
//! - **`literate`**: doctest extraction and source rewriting
//! - **`syntax`**, **`ast`**: the sx parser
//! - **`runtime`**, **`atoms`**: the sx interpreter
//! - **`testing`**: evaluating rewritten programs and judging results
//! - **`engine`**: the end-to-end pipeline
//! - **`cli`**: the command-line interface

pub mod ast;
pub mod atoms;
pub mod cli;
pub mod engine;
pub mod errors;
pub mod literate;
pub mod options;
pub mod prelude;
pub mod runtime;
pub mod syntax;
pub mod testing;

pub use engine::{doctest, Outcome};
pub use errors::DoctestError;
pub use options::Options;

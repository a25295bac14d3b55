//! # Literate doctests
//!
//! Extraction of doctests from comments and rewriting of the source into an
//! instrumented program.
//!
//! ## Module Structure
//!
//! - **`position`**: line/column positions and the exact slicer
//! - **`comments`**: comment tokens, the comment source seam, comment groups
//! - **`grammar`**: the `>` / `.` / output state machine
//! - **`negation`**: the `! Name: message` expected-error shorthand
//! - **`harness`**: instrumentation emitted for each test
//! - **`rewrite`**: the two-pass splicer and the literate rewriter
//! - **`dialect`**: source dialects and their compilers
//! - **`module`**: module envelopes for the final program

pub mod comments;
pub mod dialect;
pub mod grammar;
pub mod harness;
pub mod module;
pub mod negation;
pub mod position;
pub mod rewrite;

pub use comments::{CommentKind, CommentSource, CommentToken, SxComments};
pub use dialect::{Compiler, Dialect};
pub use grammar::{Fragment, Test};
pub use module::ModuleMode;
pub use position::{substring, LineSpan, Position};
pub use rewrite::rewrite;

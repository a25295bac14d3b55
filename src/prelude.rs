//! Common imports for working with the doctest pipeline.

pub use crate::engine::{doctest, DoctestEngine, NullSink, Outcome, OutputSink};
pub use crate::errors::DoctestError;
pub use crate::literate::{Dialect, ModuleMode};
pub use crate::options::Options;
pub use crate::runtime::{Thrown, Value};
pub use crate::testing::{summary, TestResult};

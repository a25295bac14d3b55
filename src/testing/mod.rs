//! Running rewritten programs and judging their doctests.

pub mod discovery;
pub mod evaluator;
pub mod runner;

pub use discovery::SourceDiscoverer;
pub use evaluator::{EnqueuedIo, Evaluator, FunctionEval, IoKind, ModuleEval, Trace};
pub use runner::{run, summary, TestResult};

//! The doctest pipeline: validate options, read the file, rewrite it, then
//! either hand back the rewritten program or run it and judge its doctests.

use std::{fs, path::Path, thread};

use serde::Serialize;
use tracing::{debug, info};

use crate::atoms::AtomRegistry;
use crate::errors::DoctestError;
use crate::literate::{self, Dialect};
use crate::options::Options;
use crate::testing::{run, Evaluator, FunctionEval, ModuleEval, TestResult};

/// Stack for the evaluation thread. Deep enough for `DEFAULT_MAX_DEPTH`
/// nested calls of non-trivial bodies in unoptimized builds.
pub const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

// ============================================================================
// OUTPUT SINK
// ============================================================================

/// Destination of progress messages, so callers can capture or silence them.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Discards everything.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
}

// ============================================================================
// PIPELINE
// ============================================================================

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "output")]
pub enum Outcome {
    /// Print mode: the rewritten, wrapped program without its final newline.
    Source(String),
    /// Execute mode: one result per checked doctest, in source order.
    Results(Vec<TestResult>),
}

impl Outcome {
    pub fn results(&self) -> &[TestResult] {
        match self {
            Outcome::Results(results) => results,
            Outcome::Source(_) => &[],
        }
    }

    pub fn all_passed(&self) -> bool {
        self.results().iter().all(|result| result.pass)
    }
}

/// Runs the pipeline with the standard atoms.
pub fn doctest(path: &Path, options: &Options, sink: &mut dyn OutputSink) -> Result<Outcome, DoctestError> {
    DoctestEngine::new(AtomRegistry::standard()).doctest(path, options, sink)
}

/// Pipeline runner holding the atoms instrumented programs are evaluated with.
#[derive(Debug, Clone, Default)]
pub struct DoctestEngine {
    registry: AtomRegistry,
}

impl DoctestEngine {
    pub fn new(registry: AtomRegistry) -> Self {
        Self { registry }
    }

    pub fn doctest(
        &self,
        path: &Path,
        options: &Options,
        sink: &mut dyn OutputSink,
    ) -> Result<Outcome, DoctestError> {
        let dialect = match options.dialect {
            Some(dialect) => dialect,
            None => Dialect::infer(path)?,
        };

        if options.announces_progress() {
            sink.emit(&format!("retrieving {}...", path.display()));
        }
        let source = fs::read_to_string(path).map_err(|source| DoctestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if options.announces_progress() {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            sink.emit(&format!("running doctests in {name}..."));
        }

        let program = self.instrument(dialect, options, &source, path)?;
        if options.print {
            let program = program.strip_suffix('\n').unwrap_or(&program);
            return Ok(Outcome::Source(program.to_string()));
        }

        let results = self.execute(options, &program, path)?;
        info!(
            path = %path.display(),
            total = results.len(),
            failed = results.iter().filter(|result| !result.pass).count(),
            "doctests finished"
        );
        Ok(Outcome::Results(results))
    }

    /// Evaluates the program and runs its doctests on a thread of its own.
    ///
    /// The stack is sized so the call-depth limit is always reached before
    /// the host stack runs out, whichever thread the caller is on.
    pub fn execute(&self, options: &Options, program: &str, path: &Path) -> Result<Vec<TestResult>, DoctestError> {
        thread::scope(|scope| -> Result<Vec<TestResult>, DoctestError> {
            let evaluation = thread::Builder::new()
                .name("sx-eval".into())
                .stack_size(EVAL_STACK_SIZE)
                .spawn_scoped(scope, || -> Result<Vec<TestResult>, DoctestError> {
                    let mut trace = if options.module.exports_queue() {
                        ModuleEval::new(self.registry.clone()).evaluate(program, path)?
                    } else {
                        FunctionEval::new(self.registry.clone()).evaluate(program, path)?
                    };
                    Ok(run(&mut trace))
                })
                .map_err(|err| DoctestError::internal(format!("cannot start evaluation thread: {err}")))?;
            evaluation
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    }

    /// Rewrites `source` and wraps it in the configured module envelope.
    pub fn instrument(
        &self,
        dialect: Dialect,
        options: &Options,
        source: &str,
        path: &Path,
    ) -> Result<String, DoctestError> {
        let rewritten = literate::rewrite(dialect, &options.prefix, source, &path.display().to_string())?;
        debug!(module = %options.module, bytes = rewritten.len(), "wrapping program");
        Ok(options.module.wrap(&rewritten))
    }
}

//! Running instrumented programs.
//!
//! An [`Evaluator`] runs a rewritten program in a fresh global scope and
//! returns the doctest queue it filled. [`FunctionEval`] evaluates the text
//! in memory with the queue pre-bound; [`ModuleEval`] writes the program next
//! to its source, loads that file as a module and reads the queue from the
//! module's exports. The temporary file is removed however loading ends.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{debug, warn};

use crate::atoms::AtomRegistry;
use crate::errors::DoctestError;
use crate::literate::harness::QUEUE_BINDING;
use crate::runtime::{Env, EvaluationContext, Queue, Thrown, Value};
use crate::syntax::parser;

// ============================================================================
// QUEUE ENTRIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    Input,
    Output,
}

/// One entry of the doctest queue.
#[derive(Debug, Clone)]
pub struct EnqueuedIo {
    pub kind: IoKind,
    /// Zero-argument function producing the input's or output's value.
    pub thunk: Value,
    /// Source line of an output.
    pub line: Option<usize>,
    pub negate: bool,
}

impl EnqueuedIo {
    /// Decodes a queue entry written by the harness.
    pub fn decode(entry: &Value) -> Result<Self, DoctestError> {
        let malformed = |what: &str| DoctestError::internal(format!("malformed doctest entry {entry}: {what}"));

        let kind = match entry.get_keyword("type") {
            Some(Value::Keyword(kind)) if kind == "input" => IoKind::Input,
            Some(Value::Keyword(kind)) if kind == "output" => IoKind::Output,
            _ => return Err(malformed("unknown :type")),
        };
        let thunk = entry
            .get_keyword("thunk")
            .filter(|thunk| thunk.is_callable())
            .cloned()
            .ok_or_else(|| malformed("missing :thunk"))?;
        let line = match entry.get_keyword("line") {
            Some(Value::Number(line)) => Some(*line as usize),
            None => None,
            Some(_) => return Err(malformed(":line is not a number")),
        };
        let negate = matches!(entry.get_keyword("negate"), Some(Value::Bool(true)));

        if kind == IoKind::Output && line.is_none() {
            return Err(malformed("output without :line"));
        }
        Ok(Self {
            kind,
            thunk,
            line,
            negate,
        })
    }
}

/// What evaluating a program leaves behind: the queue, and the context to
/// call its thunks with.
#[derive(Debug)]
pub struct Trace {
    pub context: EvaluationContext,
    pub queue: Vec<EnqueuedIo>,
    scope: Env,
}

impl Drop for Trace {
    fn drop(&mut self) {
        release(&mut self.context, &self.scope);
    }
}

impl Trace {
    /// Looks up a binding of the program's global scope.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.scope.get(name)
    }

    fn collect(mut context: EvaluationContext, scope: Env, queue: &Queue) -> Result<Self, DoctestError> {
        let decoded = queue
            .drain()
            .iter()
            .map(EnqueuedIo::decode)
            .collect::<Result<Vec<_>, _>>();
        match decoded {
            Ok(queue) => Ok(Self {
                context,
                queue,
                scope,
            }),
            Err(err) => {
                release(&mut context, &scope);
                Err(err)
            }
        }
    }
}

// ============================================================================
// EVALUATORS
// ============================================================================

/// Runs an instrumented program in an isolated global scope.
pub trait Evaluator {
    /// `path` is the original source file; it names the program in errors.
    fn evaluate(&self, source: &str, path: &Path) -> Result<Trace, DoctestError>;
}

/// Evaluates the program text directly, with `__doctest` bound beforehand.
#[derive(Debug, Default, Clone)]
pub struct FunctionEval {
    registry: AtomRegistry,
}

impl FunctionEval {
    pub fn new(registry: AtomRegistry) -> Self {
        Self { registry }
    }
}

impl Evaluator for FunctionEval {
    fn evaluate(&self, source: &str, path: &Path) -> Result<Trace, DoctestError> {
        let name = path.display().to_string();
        let nodes = parser::parse(source, &name)?;

        let scope = Env::global(&self.registry);
        let queue = Queue::default();
        scope.define(QUEUE_BINDING, Value::Queue(queue.clone()));

        let mut context = EvaluationContext::new();
        let result = context.eval_program(&nodes, &scope);
        if let Err(thrown) = result {
            release(&mut context, &scope);
            return Err(uncaught(&thrown));
        }
        debug!(entries = queue.len(), "program evaluated");
        Trace::collect(context, scope, &queue)
    }
}

/// Loads the program as a module file and reads the queue from its exports.
#[derive(Debug, Default, Clone)]
pub struct ModuleEval {
    registry: AtomRegistry,
}

impl ModuleEval {
    pub fn new(registry: AtomRegistry) -> Self {
        Self { registry }
    }

    /// Reads, parses and evaluates a module file in a fresh global scope.
    pub fn load_module(&self, path: &Path) -> Result<(EvaluationContext, Env), DoctestError> {
        let source = fs::read_to_string(path).map_err(|source| DoctestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let nodes = parser::parse(&source, &path.display().to_string())?;

        let scope = Env::global(&self.registry);
        let mut context = EvaluationContext::new();
        if let Err(thrown) = context.eval_program(&nodes, &scope) {
            release(&mut context, &scope);
            return Err(uncaught(&thrown));
        }
        Ok((context, scope))
    }
}

impl Evaluator for ModuleEval {
    fn evaluate(&self, source: &str, path: &Path) -> Result<Trace, DoctestError> {
        let module = TempModule::write(path, source)?;
        let (mut context, scope) = self.load_module(module.path())?;

        let queue = match context.exports.get(QUEUE_BINDING) {
            Some(Value::Queue(queue)) => queue.clone(),
            _ => {
                release(&mut context, &scope);
                return Err(DoctestError::internal(format!(
                    "module {} did not export {QUEUE_BINDING}",
                    module.path().display()
                )));
            }
        };
        debug!(entries = queue.len(), module = %module.path().display(), "module loaded");
        Trace::collect(context, scope, &queue)
    }
}

/// Breaks the closure cycles a run leaves in its scopes.
fn release(context: &mut EvaluationContext, scope: &Env) {
    context.release_scopes();
    scope.clear();
}

fn uncaught(thrown: &Thrown) -> DoctestError {
    DoctestError::Uncaught {
        display: thrown.display(true),
    }
}

// ============================================================================
// TEMPORARY MODULE FILE
// ============================================================================

/// A program written next to its source as `<stem>-<millis>.sx`, removed on
/// drop.
#[derive(Debug)]
pub struct TempModule {
    path: PathBuf,
}

impl TempModule {
    pub fn write(source_path: &Path, program: &str) -> Result<Self, DoctestError> {
        let stem = source_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("doctest");
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let dir = source_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let path = dir.join(format!("{stem}-{millis}.sx"));

        fs::write(&path, program).map_err(|source| DoctestError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempModule {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), %err, "could not remove temporary module");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::WeakEnv;

    fn registry() -> AtomRegistry {
        AtomRegistry::standard()
    }

    #[test]
    fn function_eval_collects_queue() {
        let program = "(define x 2)\n(enqueue! __doctest {:type :input :thunk (fn () (+ x 2))})\n\
                       (enqueue! __doctest {:type :output :line 3 :negate false :thunk (fn () 4)})";
        let trace = FunctionEval::new(registry())
            .evaluate(program, Path::new("inline.sx"))
            .unwrap();
        assert_eq!(trace.queue.len(), 2);
        assert_eq!(trace.queue[0].kind, IoKind::Input);
        assert_eq!(trace.queue[1].line, Some(3));
        assert!(!trace.queue[1].negate);
    }

    #[test]
    fn dropping_a_trace_frees_nested_scopes() {
        let program = "(let ()\n  (define (twice n) (* 2 n))\n  \
                       (enqueue! __doctest {:type :input :thunk (fn () (twice 2))}))";
        let trace = FunctionEval::new(registry())
            .evaluate(program, Path::new("inline.sx"))
            .unwrap();
        let scopes = trace.context.captured_scopes().to_vec();
        assert!(!scopes.is_empty());
        assert!(scopes.iter().all(WeakEnv::is_live));

        drop(trace);
        assert!(scopes.iter().all(|scope| !scope.is_live()));
    }

    #[test]
    fn top_level_errors_propagate() {
        let err = FunctionEval::new(registry())
            .evaluate("(raise (error \"Boom\" \"at load\"))", Path::new("inline.sx"))
            .unwrap_err();
        assert!(matches!(err, DoctestError::Uncaught { ref display } if display == "! Boom: at load"));
    }

    #[test]
    fn syntax_errors_propagate() {
        let err = FunctionEval::new(registry())
            .evaluate("(+ 1", Path::new("inline.sx"))
            .unwrap_err();
        assert!(matches!(err, DoctestError::Syntax { .. }));
    }

    #[test]
    fn malformed_entries_are_internal_errors() {
        let entry = Value::Number(1.0);
        assert!(matches!(
            EnqueuedIo::decode(&entry),
            Err(DoctestError::Internal { .. })
        ));
    }

    #[test]
    fn temp_module_is_removed_on_drop() {
        let dir = std::env::temp_dir().join(format!("sx-doctest-temp-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let source_path = dir.join("lib.sx");
        let written = {
            let module = TempModule::write(&source_path, "nil").unwrap();
            let name = module.path().file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("lib-") && name.ends_with(".sx"));
            assert!(module.path().exists());
            module.path().to_path_buf()
        };
        assert!(!written.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}

//! The execution engine: turns a drained doctest queue into results.
//!
//! Inputs are buffered until something needs them. A new input first runs
//! whatever is still buffered (for its side effects only) and then takes the
//! buffer's place; an output runs the buffered input to get the actual value
//! and compares it with its own thunk's value. An input still buffered when
//! the queue ends is never run.

use serde::Serialize;
use tracing::trace;

use crate::runtime::{EvaluationContext, Thrown, Value};
use crate::testing::evaluator::{EnqueuedIo, IoKind, Trace};

/// Outcome of one checked example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub pass: bool,
    pub actual: String,
    pub expected: String,
    pub line: usize,
}

/// Runs every queued thunk of `trace` and judges each output.
pub fn run(trace: &mut Trace) -> Vec<TestResult> {
    let Trace { context, queue, .. } = trace;
    let mut buffer: Vec<Value> = Vec::new();
    let mut results = Vec::new();

    for io in queue.iter() {
        match io.kind {
            IoKind::Input => {
                for thunk in buffer.drain(..) {
                    // Unchecked inputs run for their side effects; their
                    // outcome is not reported.
                    let _ = context.apply(&thunk, &[]);
                }
                buffer.push(io.thunk.clone());
            }
            IoKind::Output => {
                let result = judge(context, &mut buffer, io);
                trace!(line = result.line, pass = result.pass, "judged doctest");
                results.push(result);
            }
        }
    }
    results
}

fn judge(context: &mut EvaluationContext, buffer: &mut Vec<Value>, io: &EnqueuedIo) -> TestResult {
    let mut actual: Result<Value, Thrown> = Ok(Value::Nil);
    for (index, thunk) in buffer.drain(..).enumerate() {
        let outcome = context.apply(&thunk, &[]);
        if index == 0 {
            actual = outcome;
        }
    }
    let expected = context.apply(&io.thunk, &[]);
    let line = io.line.unwrap_or_default();

    let expected = match expected {
        Ok(expected) => expected,
        Err(thrown) => {
            return TestResult {
                pass: false,
                actual: display_actual(&actual, true),
                expected: thrown.display(true),
                line,
            }
        }
    };

    if io.negate {
        let (name, message) = match expected.as_error() {
            Some(spec) => (spec.name.as_str(), spec.message.as_str()),
            None => ("", ""),
        };
        let pass = match &actual {
            Err(thrown) => thrown
                .as_error()
                .is_some_and(|error| error.name == name && (message.is_empty() || error.message == message)),
            Ok(_) => false,
        };
        let with_message = !message.is_empty();
        let expected = if with_message {
            format!("! {name}: {message}")
        } else {
            format!("! {name}")
        };
        TestResult {
            pass,
            actual: display_actual(&actual, with_message),
            expected,
            line,
        }
    } else {
        let pass = matches!(&actual, Ok(value) if *value == expected);
        TestResult {
            pass,
            actual: display_actual(&actual, true),
            expected: expected.to_string(),
            line,
        }
    }
}

fn display_actual(actual: &Result<Value, Thrown>, with_message: bool) -> String {
    match actual {
        Ok(value) => value.to_string(),
        Err(thrown) => thrown.display(with_message),
    }
}

/// The dot string followed by one line per failure.
///
/// ```rust
/// use sx_doctest::testing::runner::{summary, TestResult};
/// let results = vec![
///     TestResult { pass: true, actual: "4".into(), expected: "4".into(), line: 2 },
///     TestResult { pass: false, actual: "4".into(), expected: "5".into(), line: 5 },
/// ];
/// assert_eq!(summary(&results), ".x\nFAIL: expected 5 on line 5 (got 4)");
/// ```
pub fn summary(results: &[TestResult]) -> String {
    let dots: String = results
        .iter()
        .map(|result| if result.pass { '.' } else { 'x' })
        .collect();
    std::iter::once(dots)
        .chain(results.iter().filter(|result| !result.pass).map(failure_line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn failure_line(result: &TestResult) -> String {
    format!(
        "FAIL: expected {} on line {} (got {})",
        result.expected, result.line, result.actual
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::AtomRegistry;
    use crate::testing::evaluator::{Evaluator, FunctionEval};
    use std::path::Path;

    /// Evaluates a hand-written instrumented program and runs its queue.
    fn results(program: &str) -> Vec<TestResult> {
        let mut trace = FunctionEval::new(AtomRegistry::standard())
            .evaluate(program, Path::new("runner.sx"))
            .unwrap();
        run(&mut trace)
    }

    fn input(body: &str) -> String {
        format!("(enqueue! __doctest {{:type :input :thunk (fn () {body})}})\n")
    }

    fn output(body: &str, line: usize, negate: bool) -> String {
        format!("(enqueue! __doctest {{:type :output :line {line} :negate {negate} :thunk (fn () {body})}})\n")
    }

    const DIVIDE: &str = "(define (divide a b)\n  (if (= b 0)\n    (raise (error \"DivisionError\" \"cannot divide by zero\"))\n    (/ a b)))\n";

    #[test]
    fn equal_values_pass() {
        let program = input("(+ 2 2)") + &output("4", 2, false);
        assert_eq!(
            results(&program),
            vec![TestResult {
                pass: true,
                actual: "4".into(),
                expected: "4".into(),
                line: 2,
            }]
        );
    }

    #[test]
    fn unequal_values_fail_with_displays() {
        let program = input("(+ 2 2)") + &output("5", 2, false);
        let result = &results(&program)[0];
        assert!(!result.pass);
        assert_eq!((result.actual.as_str(), result.expected.as_str()), ("4", "5"));
    }

    #[test]
    fn comparison_is_structural() {
        let program = input("(list 1 {:a [2]})") + &output("[1 {:a [2]}]", 2, false);
        assert!(results(&program)[0].pass);
    }

    #[test]
    fn expected_error_by_name_ignores_message() {
        let program = DIVIDE.to_string()
            + &input("(divide 1 0)")
            + &output("(error \"DivisionError\")", 6, true);
        let result = &results(&program)[0];
        assert!(result.pass);
        assert_eq!(result.actual, "! DivisionError");
        assert_eq!(result.expected, "! DivisionError");
    }

    #[test]
    fn expected_error_message_must_match() {
        let program = DIVIDE.to_string()
            + &input("(divide 1 0)")
            + &output("(error \"DivisionError\" \"other message\")", 6, true);
        let result = &results(&program)[0];
        assert!(!result.pass);
        assert_eq!(result.actual, "! DivisionError: cannot divide by zero");
        assert_eq!(result.expected, "! DivisionError: other message");
    }

    #[test]
    fn error_and_value_never_match() {
        let thrown_but_value_expected =
            DIVIDE.to_string() + &input("(divide 1 0)") + &output("nil", 6, false);
        let result = &results(&thrown_but_value_expected)[0];
        assert!(!result.pass);
        assert_eq!(result.actual, "! DivisionError: cannot divide by zero");

        let value_but_error_expected = input("1") + &output("(error \"DivisionError\")", 2, true);
        assert!(!results(&value_but_error_expected)[0].pass);
    }

    #[test]
    fn unchecked_inputs_run_before_the_next_input() {
        let program = "(define x 0)\n".to_string()
            + &input("(set! x 1)")
            + &input("(set! x (+ x 1))")
            + &output("2", 3, false);
        assert!(results(&program)[0].pass);
    }

    #[test]
    fn trailing_input_is_never_run() {
        let program = "(define x 0)\n".to_string() + &input("(set! x 1)");
        let mut trace = FunctionEval::new(AtomRegistry::standard())
            .evaluate(&program, Path::new("runner.sx"))
            .unwrap();
        assert!(run(&mut trace).is_empty());
        assert_eq!(trace.global("x"), Some(Value::Number(0.0)));
    }

    #[test]
    fn throwing_expected_thunk_fails() {
        let program = input("1") + &output("(undefined-name)", 2, false);
        let result = &results(&program)[0];
        assert!(!result.pass);
        assert_eq!(result.expected, "! ReferenceError: undefined-name is not defined");
    }

    #[test]
    fn summary_lists_failures() {
        let program = input("1") + &output("1", 2, false) + &input("2") + &output("3", 4, false);
        assert_eq!(
            summary(&results(&program)),
            ".x\nFAIL: expected 3 on line 4 (got 2)"
        );
    }
}

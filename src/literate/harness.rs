//! Generates the instrumentation that replaces a doctest comment.
//!
//! Each test becomes one or two `enqueue!` calls on the `__doctest` queue. The
//! thunks are `fn` forms, so they see every binding of the surrounding program
//! when the runner calls them after the program has finished loading.
//!
//! Example text is emitted as written: only its first line is indented, so
//! string literals spanning several lines keep their contents.

use crate::literate::grammar::{Fragment, Test};
use crate::syntax::parser;

/// Name of the queue binding the instrumented program writes to.
pub const QUEUE_BINDING: &str = "__doctest";

/// Returns the sx code that replaces `test`.
///
/// A declaration input (`(define ...)`) is returned unchanged so its binding
/// lands in the program's own scope; nothing is enqueued for it.
pub fn wrap(test: &Test) -> String {
    wrap_at(0, test)
}

/// Like [`wrap`], with every generated line indented by `width` spaces.
pub fn wrap_at(width: usize, test: &Test) -> String {
    let pad = " ".repeat(width);
    if is_declaration(&test.input.value) {
        return format!("{pad}{}", test.input.value);
    }

    let mut statements = vec![input_statement(&pad, &test.input)];
    if let Some(output) = &test.output {
        statements.push(output_statement(&pad, output, test.negate));
    }
    statements.join("\n")
}

/// True when the first form of `source` is a `(define ...)`.
///
/// Text that does not parse is not a declaration; it is wrapped like any
/// other input and the syntax error surfaces when the program is evaluated.
pub fn is_declaration(source: &str) -> bool {
    parser::parse(source, "<doctest input>")
        .ok()
        .and_then(|nodes| nodes.into_iter().next())
        .is_some_and(|first| first.value.head_symbol() == Some("define"))
}

fn input_statement(pad: &str, input: &Fragment) -> String {
    [
        format!("{pad}(enqueue! {QUEUE_BINDING} {{"),
        format!("{pad}  :type :input"),
        format!("{pad}  :thunk (fn ()"),
        format!("{pad}    {}", input.value),
        format!("{pad}  )}})"),
    ]
    .join("\n")
}

fn output_statement(pad: &str, output: &Fragment, negate: bool) -> String {
    [
        format!("{pad}(enqueue! {QUEUE_BINDING} {{"),
        format!("{pad}  :type :output"),
        format!("{pad}  :line {}", output.span.start.line),
        format!("{pad}  :negate {negate}"),
        format!("{pad}  :thunk (fn ()"),
        format!("{pad}    {}", output.value),
        format!("{pad}  )}})"),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literate::position::LineSpan;

    fn test(input: &str, output: Option<(&str, usize)>, negate: bool) -> Test {
        Test {
            comment_index: 0,
            negate,
            input: Fragment {
                value: input.into(),
                span: LineSpan::line(1),
            },
            output: output.map(|(value, line)| Fragment {
                value: value.into(),
                span: LineSpan::line(line),
            }),
        }
    }

    #[test]
    fn input_and_output_statements() {
        let code = wrap(&test("(+ 2 2)", Some(("4", 7)), false));
        assert_eq!(
            code,
            "(enqueue! __doctest {\n  :type :input\n  :thunk (fn ()\n    (+ 2 2)\n  )})\n\
             (enqueue! __doctest {\n  :type :output\n  :line 7\n  :negate false\n  :thunk (fn ()\n    4\n  )})"
        );
    }

    #[test]
    fn unchecked_input_has_no_output_statement() {
        let code = wrap(&test("(launch)", None, false));
        assert_eq!(code.matches("enqueue!").count(), 1);
        assert!(!code.contains(":output"));
    }

    #[test]
    fn declarations_are_spliced_verbatim() {
        let source = "(define (square x)\n  (* x x))";
        assert_eq!(wrap(&test(source, Some(("nil", 3)), false)), source);
    }

    #[test]
    fn multi_line_strings_are_emitted_as_written() {
        let code = wrap_at(2, &test("(len \"ab\ncd\")", Some(("\"x\ny\"", 4)), false));
        assert!(code.contains("      (len \"ab\ncd\")\n"));
        assert!(code.contains("      \"x\ny\"\n"));
        assert!(code.starts_with("  (enqueue! __doctest {\n    :type :input"));
    }

    #[test]
    fn declaration_detection() {
        assert!(is_declaration("(define x 1)"));
        assert!(is_declaration("(define x 1) (f x)"));
        assert!(!is_declaration("(set! x 1)"));
        assert!(!is_declaration("(f (define x 1))"));
        assert!(!is_declaration("(define"));
    }
}

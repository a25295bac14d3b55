//! The doctest comment grammar.
//!
//! Lines are classified after markup and the configured prefix are removed:
//!
//! - `> expr` opens a new test (state `Input`);
//! - `. expr` continues the active input or output;
//! - any other non-empty line while in `Input` is the expected output;
//! - anything else closes the current test block.
//!
//! Lines that do not start with the prefix are not part of any doctest.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::literate::comments::{CommentGroup, CommentLine};
use crate::literate::negation;
use crate::literate::position::LineSpan;

// ============================================================================
// TYPES
// ============================================================================

/// An input or output expression and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub value: String,
    pub span: LineSpan,
}

/// One doctest: an input expression and an optional expected output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Test {
    pub comment_index: usize,
    /// The output is an expected-error spec rather than a value.
    pub negate: bool,
    pub input: Fragment,
    pub output: Option<Fragment>,
}

/// Which field a continuation line extends.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Default,
    Input,
    Output,
}

/// Classification of a single prefixed comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker<'a> {
    Input(&'a str),
    Continuation(&'a str),
    Plain(&'a str),
}

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(>|\.*)[ ]?(.*)$").unwrap());

// ============================================================================
// PUBLIC API
// ============================================================================

/// Extracts the tests of every group, in order, normalized for negation.
pub fn extract(prefix: &str, groups: &[CommentGroup]) -> Vec<Test> {
    groups
        .iter()
        .flat_map(|group| extract_group(prefix, group))
        .collect()
}

/// Runs the grammar over one group. State starts at `Default` for every group.
pub fn extract_group(prefix: &str, group: &CommentGroup) -> Vec<Test> {
    let (_, tests) = group
        .lines
        .iter()
        .fold((State::Default, Vec::new()), |(state, tests), line| {
            step(prefix, state, tests, line)
        });
    tests.into_iter().map(negation::normalize).collect()
}

// ============================================================================
// STATE MACHINE
// ============================================================================

fn step(prefix: &str, state: State, mut tests: Vec<Test>, line: &CommentLine) -> (State, Vec<Test>) {
    let Some(marker) = classify(prefix, &line.text) else {
        return (state, tests);
    };

    match marker {
        Marker::Input(body) => {
            tests.push(Test {
                comment_index: line.comment_index,
                negate: false,
                input: Fragment {
                    value: body.to_string(),
                    span: line.span,
                },
                output: None,
            });
            (State::Input, tests)
        }

        Marker::Continuation(body) => {
            let Some(test) = tests.last_mut() else {
                return (state, tests);
            };
            let fragment = match state {
                State::Input => Some(&mut test.input),
                State::Output => test.output.as_mut(),
                State::Default => None,
            };
            if let Some(fragment) = fragment {
                fragment.value.push('\n');
                fragment.value.push_str(body);
                fragment.span.end = line.span.end;
                test.comment_index = line.comment_index;
            }
            (state, tests)
        }

        Marker::Plain(body) if state == State::Input && !body.is_empty() => {
            if let Some(test) = tests.last_mut() {
                test.comment_index = line.comment_index;
                test.output = Some(Fragment {
                    value: body.to_string(),
                    span: line.span,
                });
            }
            (State::Output, tests)
        }

        Marker::Plain(_) => (State::Default, tests),
    }
}

fn classify<'a>(prefix: &str, text: &'a str) -> Option<Marker<'a>> {
    let rest = text.strip_prefix(prefix)?;
    let caps = MARKER.captures(rest)?;
    let marker = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());
    Some(match marker {
        ">" => Marker::Input(body),
        "" => Marker::Plain(body),
        _ => Marker::Continuation(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literate::position::Position;

    fn group(lines: &[&str]) -> CommentGroup {
        CommentGroup {
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, text)| CommentLine {
                    comment_index: i,
                    text: text.to_string(),
                    span: LineSpan::new(Position::new(i + 1, 0), Position::new(i + 1, text.len() + 2)),
                })
                .collect(),
        }
    }

    fn pairs(tests: &[Test]) -> Vec<(String, Option<String>)> {
        tests
            .iter()
            .map(|t| (t.input.value.clone(), t.output.as_ref().map(|o| o.value.clone())))
            .collect()
    }

    #[test]
    fn input_then_output() {
        let tests = extract_group("", &group(&["> (* 6 7)", "42"]));
        assert_eq!(pairs(&tests), [("(* 6 7)".into(), Some("42".into()))]);
        assert_eq!(tests[0].input.span.start, Position::new(1, 0));
        assert_eq!(tests[0].output.as_ref().unwrap().span.start.line, 2);
        assert_eq!(tests[0].comment_index, 1);
        assert!(!tests[0].negate);
    }

    #[test]
    fn consecutive_inputs_are_independent_tests() {
        let tests = extract_group("", &group(&["> (set! x 1)", "> (set! x (+ x 1))", "2"]));
        assert_eq!(
            pairs(&tests),
            [
                ("(set! x 1)".into(), None),
                ("(set! x (+ x 1))".into(), Some("2".into())),
            ]
        );
    }

    #[test]
    fn continuation_extends_input_and_output() {
        let tests = extract_group("", &group(&[">", ". (+ 1", ".    2)", "[1", ". 2]"]));
        assert_eq!(tests[0].input.value, "\n(+ 1\n   2)");
        assert_eq!(tests[0].input.span.end, Position::new(3, 9));
        assert_eq!(tests[0].output.as_ref().unwrap().value, "[1\n2]");
        assert_eq!(tests[0].output.as_ref().unwrap().span.end.line, 5);
    }

    #[test]
    fn continuation_before_any_input_is_ignored() {
        let tests = extract_group("", &group(&[". nothing", "> 1", "1"]));
        assert_eq!(pairs(&tests), [("1".into(), Some("1".into()))]);
    }

    #[test]
    fn prose_resets_state() {
        let tests = extract_group("", &group(&["> 1", "1", "Some prose.", "more prose", "> 2"]));
        assert_eq!(
            pairs(&tests),
            [("1".into(), Some("1".into())), ("2".into(), None)]
        );
    }

    #[test]
    fn blank_line_after_input_leaves_it_unchecked() {
        let tests = extract_group("", &group(&["> (f)", "", "not an output"]));
        assert_eq!(pairs(&tests), [("(f)".into(), None)]);
    }

    #[test]
    fn prefix_filters_lines() {
        let tests = extract_group("doc:", &group(&["> 1", "doc:> 2", "doc: 2", "3"]));
        assert_eq!(pairs(&tests), [("2".into(), Some("2".into()))]);
    }

    #[test]
    fn error_shorthand_is_normalized() {
        let tests = extract_group("", &group(&["> (divide 1 0)", "! DivisionError"]));
        assert!(tests[0].negate);
        assert_eq!(tests[0].output.as_ref().unwrap().value, "(error \"DivisionError\")");
    }
}

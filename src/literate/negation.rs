//! Expected-error shorthand.
//!
//! An output of the form `! Name` or `! Name: message` says the input should
//! raise an error. It is rewritten into an `(error ...)` expression that builds
//! the error value the runner compares against; an absent message becomes an
//! empty one, which matches any message.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::literate::grammar::Test;
use crate::runtime::value::quote;

static ERROR_SPEC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^![ ]?([^:]*)(?::[ ]?(.*))?$").unwrap());

/// Sets `negate` and rewrites the output of an expected-error test.
pub fn normalize(mut test: Test) -> Test {
    let Some(output) = test.output.as_mut() else {
        test.negate = false;
        return test;
    };

    match error_spec_expression(&output.value) {
        Some(expression) => {
            output.value = expression;
            test.negate = true;
        }
        None => test.negate = false,
    }
    test
}

/// Returns the `(error ...)` expression for an error spec, if `value` is one.
///
/// ```rust
/// use sx_doctest::literate::negation::error_spec_expression;
/// assert_eq!(
///     error_spec_expression("! TypeError: expected a number").as_deref(),
///     Some(r#"(error "TypeError" "expected a number")"#)
/// );
/// assert_eq!(error_spec_expression("42"), None);
/// ```
pub fn error_spec_expression(value: &str) -> Option<String> {
    let caps = ERROR_SPEC.captures(value)?;
    let name = caps.get(1).map_or("", |m| m.as_str()).trim();
    Some(match caps.get(2) {
        Some(message) => format!("(error {} {})", quote(name), quote(message.as_str())),
        None => format!("(error {})", quote(name)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literate::grammar::Fragment;
    use crate::literate::position::LineSpan;

    fn test_with_output(output: Option<&str>) -> Test {
        Test {
            comment_index: 0,
            negate: false,
            input: Fragment {
                value: "(f)".into(),
                span: LineSpan::line(1),
            },
            output: output.map(|value| Fragment {
                value: value.into(),
                span: LineSpan::line(2),
            }),
        }
    }

    #[test]
    fn name_only() {
        let test = normalize(test_with_output(Some("!DivisionError")));
        assert!(test.negate);
        assert_eq!(test.output.unwrap().value, r#"(error "DivisionError")"#);
    }

    #[test]
    fn name_and_message_with_quotes() {
        let test = normalize(test_with_output(Some(r#"! Error: say "hi""#)));
        assert!(test.negate);
        assert_eq!(test.output.unwrap().value, r#"(error "Error" "say \"hi\"")"#);
    }

    #[test]
    fn empty_message_after_colon() {
        assert_eq!(
            error_spec_expression("! RangeError:").as_deref(),
            Some(r#"(error "RangeError" "")"#)
        );
    }

    #[test]
    fn ordinary_outputs_are_untouched() {
        let test = normalize(test_with_output(Some("(not true)")));
        assert!(!test.negate);
        assert_eq!(test.output.unwrap().value, "(not true)");

        let unchecked = normalize(test_with_output(None));
        assert!(!unchecked.negate);
        assert!(unchecked.output.is_none());
    }
}

//! Splices doctest instrumentation into source text.
//!
//! sx sources go through two passes. Pass 1 replaces line-comment tests using
//! their original positions. Injected code shifts everything after it, so
//! pass 2 scans the pass-1 text for block comments again and splices their
//! tests at the fresh positions. Tests are matched to the re-scanned comments
//! by index; the block comments themselves are untouched by pass 1.
//!
//! Literate sources are rewritten line by line and then compiled.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::errors::DoctestError;
use crate::literate::comments::{
    block_groups, line_groups, partition, CommentGroup, CommentLine, CommentSource, SxComments,
};
use crate::literate::dialect::Dialect;
use crate::literate::grammar::{self, Test};
use crate::literate::harness::{wrap, wrap_at};
use crate::literate::position::{substring, Position};

static LINE_ENDINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());
static SHEBANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#!.*").unwrap());
static HASH_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*#").unwrap());

// ============================================================================
// PUBLIC API
// ============================================================================

/// Rewrites `source` of the given dialect into an instrumented sx program.
pub fn rewrite(dialect: Dialect, prefix: &str, source: &str, name: &str) -> Result<String, DoctestError> {
    let source = normalize(source);
    debug!(%dialect, name, "rewriting source");
    match dialect {
        Dialect::Sx => Rewriter::new(SxComments, prefix).rewrite(&source, name),
        Dialect::Sxl => {
            let rewritten = rewrite_literate(prefix, &source);
            dialect.compiler().compile(&rewritten, name)
        }
    }
}

/// Unifies line endings and blanks a leading `#!` line (keeping its newline).
pub fn normalize(source: &str) -> String {
    let unified = LINE_ENDINGS.replace_all(source, "\n");
    SHEBANG.replace(&unified, "").into_owned()
}

// ============================================================================
// TWO-PASS REWRITER
// ============================================================================

/// Two-pass rewriter over any comment source.
pub struct Rewriter<'p, C> {
    comments: C,
    prefix: &'p str,
}

impl<'p, C: CommentSource> Rewriter<'p, C> {
    pub fn new(comments: C, prefix: &'p str) -> Self {
        Self { comments, prefix }
    }

    pub fn rewrite(&self, source: &str, name: &str) -> Result<String, DoctestError> {
        let (blocks, lines) = partition(self.comments.comments(source, name)?);
        let line_tests = grammar::extract(self.prefix, &line_groups(&lines));
        let block_tests = grammar::extract(self.prefix, &block_groups(&blocks));
        debug!(
            line_tests = line_tests.len(),
            block_tests = block_tests.len(),
            "extracted doctests"
        );

        let pass_one = splice_line_tests(source, &line_tests);
        if block_tests.is_empty() {
            return Ok(pass_one);
        }

        let (fresh_blocks, _) = partition(self.comments.comments(&pass_one, name)?);
        if fresh_blocks.len() != blocks.len() {
            return Err(DoctestError::internal(format!(
                "found {} block comments after splicing line tests, expected {}",
                fresh_blocks.len(),
                blocks.len()
            )));
        }

        let mut rewritten = String::with_capacity(pass_one.len());
        let mut cursor = Position::START;
        for (index, block) in fresh_blocks.iter().enumerate() {
            let code: Vec<String> = block_tests
                .iter()
                .filter(|test| test.comment_index == index)
                .map(wrap)
                .collect();
            if code.is_empty() {
                continue;
            }
            trace!(index, start = %block.span.start, tests = code.len(), "splicing block comment");
            rewritten.push_str(substring(&pass_one, cursor, block.span.start));
            rewritten.push_str(&code.join("\n"));
            cursor = block.span.end;
        }
        rewritten.push_str(substring(&pass_one, cursor, Position::END));
        Ok(rewritten)
    }
}

/// Pass 1: replaces each line-comment test, from the start of its input to
/// the end of its output, with its instrumentation.
pub fn splice_line_tests(source: &str, tests: &[Test]) -> String {
    let mut rewritten = String::with_capacity(source.len());
    let mut cursor = Position::START;
    for test in tests {
        trace!(start = %test.input.span.start, "splicing line test");
        rewritten.push_str(substring(source, cursor, test.input.span.start));
        rewritten.push_str(&wrap(test));
        cursor = test
            .output
            .as_ref()
            .map_or(test.input.span.end, |output| output.span.end);
    }
    rewritten.push_str(substring(source, cursor, Position::END));
    rewritten
}

// ============================================================================
// LITERATE REWRITER
// ============================================================================

enum Chunk<'s> {
    Code(Vec<&'s str>),
    Comment { first_line: usize, lines: Vec<&'s str> },
}

/// Rewrites a literate source. Runs of whole-line `#` comments that contain
/// tests are replaced by the tests' instrumentation, indented like the `>`
/// line that opened each test; other lines are kept as they are.
pub fn rewrite_literate(prefix: &str, source: &str) -> String {
    let trailing_newline = source.ends_with('\n');
    let body = source.strip_suffix('\n').unwrap_or(source);
    let lines: Vec<&str> = body.split('\n').collect();

    let rendered: Vec<String> = chunk_lines(&lines)
        .into_iter()
        .map(|chunk| match chunk {
            Chunk::Code(code) => code.join("\n"),
            Chunk::Comment { first_line, lines: comment } => {
                render_comment_chunk(prefix, first_line, &comment, &lines)
            }
        })
        .collect();

    let mut rewritten = rendered.join("\n");
    if trailing_newline {
        rewritten.push('\n');
    }
    rewritten
}

fn chunk_lines<'s>(lines: &[&'s str]) -> Vec<Chunk<'s>> {
    let mut chunks: Vec<Chunk<'s>> = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let is_comment = HASH_COMMENT.is_match(line);
        match (chunks.last_mut(), is_comment) {
            (Some(Chunk::Comment { lines, .. }), true) => lines.push(line),
            (Some(Chunk::Code(lines)), false) => lines.push(line),
            (_, true) => chunks.push(Chunk::Comment {
                first_line: index + 1,
                lines: vec![line],
            }),
            (_, false) => chunks.push(Chunk::Code(vec![line])),
        }
    }
    chunks
}

fn render_comment_chunk(prefix: &str, first_line: usize, comment: &[&str], all_lines: &[&str]) -> String {
    let group = CommentGroup {
        lines: comment
            .iter()
            .enumerate()
            .filter_map(|(offset, raw)| CommentLine::from_hash_line(offset, first_line + offset, raw))
            .collect(),
    };
    let tests = grammar::extract_group(prefix, &group);
    if tests.is_empty() {
        return comment.join("\n");
    }

    tests
        .iter()
        .map(|test| {
            let opener = all_lines
                .get(test.input.span.start.line - 1)
                .copied()
                .unwrap_or("");
            let width = opener.len() - opener.trim_start_matches([' ', '\t']).len();
            wrap_at(width, test)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_line_endings_and_shebang() {
        assert_eq!(normalize("#!/usr/bin/env sx\r\n(f)\r(g)"), "\n(f)\n(g)");
        assert_eq!(normalize("(f) #!x"), "(f) #!x");
    }

    #[test]
    fn source_without_doctests_is_unchanged() {
        let source = "; A module.\n#| Block prose.\n | more |#\n(define x 1) ; trailing\n";
        assert_eq!(rewrite(Dialect::Sx, "", source, "plain.sx").unwrap(), source);
    }

    #[test]
    fn line_test_is_replaced_in_place() {
        let source = "(define x 1)\n; > (+ x 1)\n; 2\n(g)\n";
        let rewritten = rewrite(Dialect::Sx, "", source, "t.sx").unwrap();
        assert!(rewritten.starts_with("(define x 1)\n(enqueue! __doctest {"));
        assert!(rewritten.contains("    (+ x 1)\n"));
        assert!(rewritten.contains(":line 3"));
        assert!(rewritten.ends_with("  )})\n(g)\n"));
        assert!(!rewritten.contains("; >"));
    }

    #[test]
    fn block_tests_are_spliced_after_line_tests() {
        let source = "; > 1\n; 1\n#|\n | > 2\n | 2\n |#\n(h)\n";
        let rewritten = rewrite(Dialect::Sx, "", source, "t.sx").unwrap();
        assert!(!rewritten.contains("#|"));
        assert!(rewritten.contains(":line 2"));
        assert!(rewritten.contains(":line 5"));
        let first = rewritten.find("    1\n").unwrap();
        let second = rewritten.find("    2\n").unwrap();
        assert!(first < second);
        assert!(rewritten.ends_with("  )})\n(h)\n"));
    }

    #[test]
    fn block_comments_without_tests_stay_in_place() {
        let source = "#| prose |#\n#| > 1\n 1 |#\n";
        let rewritten = rewrite(Dialect::Sx, "", source, "t.sx").unwrap();
        assert!(rewritten.starts_with("#| prose |#\n(enqueue!"));
    }

    #[test]
    fn literate_chunks_keep_indentation() {
        let source = "(define (f)\n  # > (g)\n  # 1\n  nil)\n# just prose\n";
        let rewritten = rewrite_literate("", source);
        assert!(rewritten.starts_with("(define (f)\n  (enqueue! __doctest {\n    :type :input"));
        assert!(rewritten.contains("    :line 3\n"));
        assert!(rewritten.ends_with("  nil)\n# just prose\n"));
    }

    #[test]
    fn literate_continuation_inside_a_string_is_kept_exact() {
        let source = "  # > (len \"ab\n  # . cd\")\n  # 5\n";
        let rewritten = rewrite_literate("", source);
        assert!(rewritten.contains("      (len \"ab\ncd\")\n"));
    }

    #[test]
    fn literate_sources_are_compiled_to_sx() {
        let source = "# > 1\n# 1\n(f) # note\n";
        let compiled = rewrite(Dialect::Sxl, "", source, "t.sxl").unwrap();
        assert!(compiled.ends_with("(f) ; note\n"));
        assert!(!compiled.contains('#'));
    }
}

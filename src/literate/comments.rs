//! Comment tokens and comment groups.
//!
//! A [`CommentSource`] turns source text into comment tokens. The grammar
//! machine never sees tokens directly: it reads [`CommentGroup`]s, the logical
//! lines of one block comment or of a run of line comments on consecutive
//! lines, each line already stripped of comment markup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::DoctestError;
use crate::literate::position::{LineSpan, Position};
use crate::syntax::parser;

// ============================================================================
// TOKENS
// ============================================================================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum CommentKind {
    Block,
    Line,
}

/// One comment as reported by a [`CommentSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentToken {
    pub kind: CommentKind,
    /// Comment body without its delimiters.
    pub text: String,
    pub span: LineSpan,
}

/// Supplies the comments of a source text, in source order.
pub trait CommentSource {
    fn comments(&self, source: &str, name: &str) -> Result<Vec<CommentToken>, DoctestError>;
}

/// Comment source backed by the sx parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SxComments;

impl CommentSource for SxComments {
    fn comments(&self, source: &str, name: &str) -> Result<Vec<CommentToken>, DoctestError> {
        parser::scan_comments(source, name)
    }
}

/// Splits tokens into `(block, line)` lists, each keeping source order.
pub fn partition(tokens: Vec<CommentToken>) -> (Vec<CommentToken>, Vec<CommentToken>) {
    tokens
        .into_iter()
        .partition(|token| token.kind == CommentKind::Block)
}

// ============================================================================
// GROUPS
// ============================================================================

/// One logical comment line fed to the grammar machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// Index of the originating token within its kind-homogeneous list.
    pub comment_index: usize,
    /// Line text with comment markup removed.
    pub text: String,
    pub span: LineSpan,
}

/// Lines that share grammar state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentGroup {
    pub lines: Vec<CommentLine>,
}

static BLOCK_GUTTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[|*]?\s*").unwrap());
static LINE_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*;*\s*").unwrap());

/// Each block comment is its own group. Lines get synthetic positions: only
/// their line number is meaningful.
pub fn block_groups(blocks: &[CommentToken]) -> Vec<CommentGroup> {
    blocks
        .iter()
        .enumerate()
        .map(|(comment_index, token)| CommentGroup {
            lines: token
                .text
                .split('\n')
                .enumerate()
                .map(|(offset, line)| CommentLine {
                    comment_index,
                    text: BLOCK_GUTTER.replace(line, "").into_owned(),
                    span: LineSpan::line(token.span.start.line + offset),
                })
                .collect(),
        })
        .collect()
}

/// Line comments on consecutive source lines form one group; each line keeps
/// the real span of its comment.
pub fn line_groups(lines: &[CommentToken]) -> Vec<CommentGroup> {
    let mut groups: Vec<CommentGroup> = Vec::new();
    let mut previous_line: Option<usize> = None;

    for (comment_index, token) in lines.iter().enumerate() {
        let line = CommentLine {
            comment_index,
            text: LINE_MARKUP.replace(&token.text, "").into_owned(),
            span: token.span,
        };
        let adjacent = previous_line.is_some_and(|prev| prev + 1 == token.span.start.line);
        match groups.last_mut() {
            Some(group) if adjacent => group.lines.push(line),
            _ => groups.push(CommentGroup { lines: vec![line] }),
        }
        previous_line = Some(token.span.start.line);
    }

    groups
}

/// Strips the indentation and `#` marker of a whole-line literate comment.
pub fn strip_hash_comment(line: &str) -> Option<(&str, &str)> {
    static HASH_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([ \t]*)#[ \t]*(.*)$").unwrap());
    HASH_LINE.captures(line).map(|caps| {
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str());
        (indent, body)
    })
}

impl CommentLine {
    /// Builds a line from a literate `#` comment at `line` (1-indexed).
    pub fn from_hash_line(comment_index: usize, line: usize, raw: &str) -> Option<Self> {
        let (_, body) = strip_hash_comment(raw)?;
        let length = raw.chars().count();
        Some(Self {
            comment_index,
            text: body.to_string(),
            span: LineSpan::new(Position::new(line, 0), Position::new(line, length)),
        })
    }
}

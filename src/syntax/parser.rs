//! sx Parser
//!
//! Converts sx source text into AST nodes with byte spans, and exposes the
//! comment tokens of the same parse (with line/column positions) for the
//! doctest extractor. This parser is purely syntactic.

use pest::{error::InputLocation, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::ast::{node, AstNode, Expr, Span};
use crate::errors::DoctestError;
use crate::literate::{CommentKind, CommentToken, LineSpan, Position};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SxParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse sx source code into AST nodes.
pub fn parse(source: &str, name: &str) -> Result<Vec<AstNode>, DoctestError> {
    let program = parse_program(source, name)?;
    program
        .into_inner()
        .filter(|p| !is_trivia(p))
        .map(|p| build_ast_node(p, source, name))
        .collect()
}

/// Returns every comment in `source`, in source order.
///
/// Line comment text excludes the leading `;`; block comment text excludes the
/// `#|` and `|#` delimiters. Columns are 0-indexed character offsets.
pub fn scan_comments(source: &str, name: &str) -> Result<Vec<CommentToken>, DoctestError> {
    let mut pairs = SxParser::parse(Rule::sx_comments, source)
        .map_err(|e| convert_parse_error(e, source, name))?;
    let Some(root) = pairs.next() else {
        return Ok(Vec::new());
    };
    Ok(root
        .into_inner()
        .filter_map(|pair| comment_token(&pair))
        .collect())
}

/// Compiles literate sx (`#` line comments) into plain sx (`;` comments).
///
/// Everything except comment markers is copied through unchanged, so line and
/// column positions are identical in the output.
pub fn compile_sxl(source: &str, name: &str) -> Result<String, DoctestError> {
    let mut pairs = SxParser::parse(Rule::sxl_source, source)
        .map_err(|e| convert_parse_error(e, source, name))?;
    let Some(root) = pairs.next() else {
        return Ok(String::new());
    };

    let mut compiled = String::with_capacity(source.len());
    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::sxl_comment => {
                compiled.push(';');
                compiled.push_str(&pair.as_str()[1..]);
            }
            Rule::EOI => {}
            _ => compiled.push_str(pair.as_str()),
        }
    }
    Ok(compiled)
}

// ============================================================================
// AST BUILDERS
// ============================================================================

fn parse_program<'i>(source: &'i str, name: &str) -> Result<Pair<'i, Rule>, DoctestError> {
    let mut pairs =
        SxParser::parse(Rule::program, source).map_err(|e| convert_parse_error(e, source, name))?;
    pairs
        .next()
        .ok_or_else(|| DoctestError::internal("parser produced no program"))
}

fn build_ast_node(pair: Pair<Rule>, source: &str, name: &str) -> Result<AstNode, DoctestError> {
    let span = get_span(&pair);

    match pair.as_rule() {
        Rule::number => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|_| {
                DoctestError::syntax(format!("invalid number `{text}`"), name, source, span)
            })?;
            Ok(node(Expr::Number(value), span))
        }

        Rule::boolean => Ok(node(Expr::Bool(pair.as_str() == "true"), span)),

        Rule::nil => Ok(node(Expr::Nil, span)),

        Rule::string => {
            let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(node(Expr::String(unescape_string(inner)), span))
        }

        Rule::keyword => Ok(node(Expr::Keyword(pair.as_str()[1..].to_string()), span)),

        Rule::symbol => Ok(node(Expr::Symbol(pair.as_str().to_string()), span)),

        Rule::list => Ok(node(Expr::List(build_children(pair, source, name)?), span)),

        Rule::vector => Ok(node(Expr::Vector(build_children(pair, source, name)?), span)),

        Rule::map => {
            let items = build_children(pair, source, name)?;
            if items.len() % 2 != 0 {
                return Err(DoctestError::syntax(
                    "map literal needs an even number of forms",
                    name,
                    source,
                    span,
                ));
            }
            Ok(node(Expr::Map(items), span))
        }

        Rule::quote => {
            let inner = build_children(pair, source, name)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    DoctestError::syntax("expected expression after quote", name, source, span)
                })?;
            Ok(node(Expr::Quote(inner), span))
        }

        rule => Err(DoctestError::internal(format!(
            "unsupported rule in AST builder: {rule:?}"
        ))),
    }
}

fn build_children(pair: Pair<Rule>, source: &str, name: &str) -> Result<Vec<AstNode>, DoctestError> {
    pair.into_inner()
        .filter(|p| !is_trivia(p))
        .map(|p| build_ast_node(p, source, name))
        .collect()
}

// ============================================================================
// COMMENT TOKENS
// ============================================================================

fn comment_token(pair: &Pair<Rule>) -> Option<CommentToken> {
    let raw = pair.as_str();
    let (kind, text) = match pair.as_rule() {
        Rule::line_comment => (CommentKind::Line, &raw[1..]),
        Rule::block_comment => (CommentKind::Block, &raw[2..raw.len() - 2]),
        _ => return None,
    };

    let span = pair.as_span();
    Some(CommentToken {
        kind,
        text: text.to_string(),
        span: LineSpan {
            start: to_position(span.start_pos().line_col()),
            end: to_position(span.end_pos().line_col()),
        },
    })
}

/// pest reports 1-based columns; doctest positions use 0-based columns.
fn to_position((line, col): (usize, usize)) -> Position {
    Position::new(line, col.saturating_sub(1))
}

// ============================================================================
// HELPERS
// ============================================================================

fn is_trivia(pair: &Pair<Rule>) -> bool {
    matches!(
        pair.as_rule(),
        Rule::line_comment | Rule::block_comment | Rule::EOI
    )
}

fn get_span(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span {
        start: span.start(),
        end: span.end(),
    }
}

fn convert_parse_error(error: pest::error::Error<Rule>, source: &str, name: &str) -> DoctestError {
    let span = match error.location {
        InputLocation::Pos(pos) => Span {
            start: pos,
            end: pos,
        },
        InputLocation::Span((start, end)) => Span { start, end },
    };
    DoctestError::syntax(error.variant.message().to_string(), name, source, span)
}

fn unescape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

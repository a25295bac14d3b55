//! Line/column positions and the position-indexed slicer.
//!
//! Splicing only works if every byte the rewriter does not replace is copied
//! through exactly, so [`substring`] is the one primitive that touches the
//! original text.

use std::fmt;

use serde::Serialize;

/// A location in source text: 1-indexed line, 0-indexed column (in chars).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The first character of the text.
    pub const START: Position = Position { line: 1, column: 0 };

    /// Sentinel that sorts after every real position and means "end of text".
    pub const END: Position = Position {
        line: usize::MAX,
        column: usize::MAX,
    };

    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// A position with only a meaningful line, as used for lines inside block
    /// comments.
    pub const fn line(line: usize) -> Self {
        Self { line, column: 0 }
    }

    pub fn is_end(&self) -> bool {
        *self == Self::END
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            write!(f, "<end>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// A `start..end` range of positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LineSpan {
    pub start: Position,
    pub end: Position,
}

impl LineSpan {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A span covering the whole of one line.
    pub const fn line(line: usize) -> Self {
        Self {
            start: Position::line(line),
            end: Position::line(line),
        }
    }
}

/// Returns the text between `start` (inclusive) and `end` (exclusive).
///
/// Equal positions always give an empty string; [`Position::END`] as `end`
/// means "everything remaining". Columns beyond a line's length clamp to the
/// end of that line (its newline included), lines beyond the text clamp to
/// the end of the text.
///
/// ```rust
/// use sx_doctest::literate::{substring, Position};
/// let text = "hello\nworld";
/// assert_eq!(substring(text, Position::new(1, 3), Position::new(2, 2)), "lo\nwo");
/// assert_eq!(substring(text, Position::new(1, 0), Position::new(1, 0)), "");
/// ```
pub fn substring(text: &str, start: Position, end: Position) -> &str {
    if start == end {
        return "";
    }
    let from = byte_offset(text, start);
    let to = byte_offset(text, end);
    if to <= from {
        return "";
    }
    &text[from..to]
}

/// Converts a position into a byte offset into `text`.
pub fn byte_offset(text: &str, position: Position) -> usize {
    if position.is_end() || position.line == 0 {
        return if position.line == 0 { 0 } else { text.len() };
    }

    let mut line_start = 0;
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if index + 1 == position.line {
            let within = line
                .char_indices()
                .nth(position.column)
                .map(|(offset, _)| offset)
                .unwrap_or(line.len());
            return line_start + within;
        }
        line_start += line.len();
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "(define x 1)\n; > x\n; 1\n(f \"é\" x)\n";

    #[test]
    fn equal_positions_are_empty() {
        for line in 0..7 {
            for column in 0..15 {
                let p = Position::new(line, column);
                assert_eq!(substring(TEXT, p, p), "");
            }
        }
        assert_eq!(substring(TEXT, Position::END, Position::END), "");
    }

    #[test]
    fn end_sentinel_takes_the_tail() {
        assert_eq!(substring(TEXT, Position::START, Position::END), TEXT);
        assert_eq!(substring(TEXT, Position::new(4, 3), Position::END), "\"é\" x)\n");
    }

    #[test]
    fn spans_multiple_lines() {
        assert_eq!(
            substring(TEXT, Position::new(1, 8), Position::new(2, 3)),
            "x 1)\n; >"
        );
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        assert_eq!(substring(TEXT, Position::new(4, 3), Position::new(4, 6)), "\"é\"");
    }

    #[test]
    fn columns_past_the_line_clamp_to_its_end() {
        assert_eq!(substring(TEXT, Position::new(2, 0), Position::new(2, 99)), "; > x\n");
    }

    #[test]
    fn slices_over_increasing_boundaries_reconstruct_the_text() {
        let boundaries = [
            Position::START,
            Position::new(1, 4),
            Position::new(2, 0),
            Position::new(2, 5),
            Position::new(3, 1),
            Position::new(4, 4),
            Position::new(5, 0),
            Position::END,
        ];
        let rebuilt: String = boundaries
            .windows(2)
            .map(|pair| substring(TEXT, pair[0], pair[1]))
            .collect();
        assert_eq!(rebuilt, TEXT);
    }

    #[test]
    fn text_without_trailing_newline() {
        let text = "abc";
        assert_eq!(substring(text, Position::new(1, 1), Position::END), "bc");
        assert_eq!(substring(text, Position::new(1, 1), Position::new(2, 0)), "bc");
    }
}

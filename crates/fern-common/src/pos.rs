//! Source positions.
//!
//! Fern is layout-sensitive, so every token and AST node carries a
//! 1-based line/column pair directly. Byte offsets are recomputed from
//! the source only when a diagnostic renderer needs them.

use serde::Serialize;
use std::fmt;

/// A 1-based (line, column) position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        debug_assert!(line >= 1 && column >= 1, "positions are 1-based");
        Pos { line, column }
    }

    /// Convert to a byte offset into `source`. Columns are counted in
    /// characters, clamped to the end of the line.
    pub fn byte_offset(self, source: &str) -> usize {
        let mut offset = 0usize;
        for (idx, line) in source.split('\n').enumerate() {
            if idx as u32 + 1 == self.line {
                let col = (self.column as usize).saturating_sub(1);
                let within: usize = line
                    .char_indices()
                    .nth(col)
                    .map(|(i, _)| i)
                    .unwrap_or(line.len());
                return offset + within;
            }
            offset += line.len() + 1;
        }
        source.len()
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(Pos::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn byte_offset_first_line() {
        let src = "hello\nworld";
        assert_eq!(Pos::new(1, 1).byte_offset(src), 0);
        assert_eq!(Pos::new(1, 5).byte_offset(src), 4);
    }

    #[test]
    fn byte_offset_later_line() {
        let src = "hello\nworld";
        assert_eq!(Pos::new(2, 1).byte_offset(src), 6);
        assert_eq!(Pos::new(2, 3).byte_offset(src), 8);
    }

    #[test]
    fn byte_offset_clamps_past_line_end() {
        let src = "ab\ncd";
        assert_eq!(Pos::new(1, 99).byte_offset(src), 2);
        assert_eq!(Pos::new(9, 1).byte_offset(src), src.len());
    }
}

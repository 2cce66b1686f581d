//! Position-tracking source cursor.
//!
//! Fern is layout-sensitive, so the cursor tracks more than a byte
//! offset: it carries the current 1-based line and the byte offset of
//! that line's first character, and tokens read their line/column pairs
//! straight off it. A [`CursorState`] snapshot captures the full
//! position; the lexer's token-level save/restore rewinds through it.

/// Character iterator over the source with line/column bookkeeping.
pub struct Cursor<'src> {
    source: &'src str,
    chars: std::str::Chars<'src>,
    /// Byte offset of the next unconsumed character.
    pos: u32,
    /// Current 1-based line number.
    line: u32,
    /// Byte offset of the start of the current line.
    line_start: u32,
}

/// A saved cursor position, restored with [`Cursor::rewind`].
#[derive(Debug, Clone, Copy)]
pub struct CursorState {
    pos: u32,
    line: u32,
    line_start: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Cursor {
            source,
            chars: source.chars(),
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// The current character, unconsumed.
    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// One character of extra lookahead -- enough to tell `1.5` from
    /// `1 .` and `"""`-style runs apart.
    pub fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    /// Consume one character. Line bookkeeping happens here: `\n`, or a
    /// lone `\r`, starts the next line (`\r\n` counts once, on the `\n`).
    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        if c == '\n' || (c == '\r' && self.peek() != Some('\n')) {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    /// Consume characters while the predicate holds.
    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Byte offset of the next unconsumed character.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Current 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the current position.
    pub fn col(&self) -> u32 {
        self.pos - self.line_start + 1
    }

    /// 1-based column of a byte offset on the current line.
    pub fn col_of(&self, byte: u32) -> u32 {
        debug_assert!(byte >= self.line_start, "offset is on an earlier line");
        byte - self.line_start + 1
    }

    /// Slice the source by byte offsets.
    ///
    /// # Panics
    ///
    /// Panics if the offsets are out of bounds or split a UTF-8
    /// character.
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }

    /// Capture the full position for a later [`rewind`](Self::rewind).
    pub fn snapshot(&self) -> CursorState {
        CursorState {
            pos: self.pos,
            line: self.line,
            line_start: self.line_start,
        }
    }

    /// Return to a previously captured position.
    pub fn rewind(&mut self, state: CursorState) {
        self.pos = state.pos;
        self.line = state.line;
        self.line_start = state.line_start;
        self.chars = self.source[state.pos as usize..].chars();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_line_one_column_one() {
        let cursor = Cursor::new("hello");
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.line(), 1);
        assert_eq!(cursor.col(), 1);
    }

    #[test]
    fn peek_does_not_move() {
        let cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek_next(), Some('b'));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance(); // a
        cursor.advance(); // b
        assert_eq!((cursor.line(), cursor.col()), (1, 3));
        cursor.advance(); // \n
        assert_eq!((cursor.line(), cursor.col()), (2, 1));
        cursor.advance(); // c
        assert_eq!((cursor.line(), cursor.col()), (2, 2));
    }

    #[test]
    fn crlf_counts_as_one_line_break() {
        let mut cursor = Cursor::new("a\r\nb");
        cursor.advance(); // a
        cursor.advance(); // \r -- line unchanged, \n follows
        assert_eq!(cursor.line(), 1);
        cursor.advance(); // \n
        assert_eq!((cursor.line(), cursor.col()), (2, 1));
    }

    #[test]
    fn lone_carriage_return_breaks_the_line() {
        let mut cursor = Cursor::new("a\rb");
        cursor.advance(); // a
        cursor.advance(); // \r
        assert_eq!((cursor.line(), cursor.col()), (2, 1));
    }

    #[test]
    fn col_of_is_relative_to_the_current_line() {
        let mut cursor = Cursor::new("xy\nabc");
        for _ in 0..4 {
            cursor.advance(); // x y \n a
        }
        // 'a' starts at byte 3, column 1 of line 2.
        assert_eq!(cursor.col_of(3), 1);
        assert_eq!(cursor.col_of(4), 2);
    }

    #[test]
    fn multibyte_advances_by_utf8_width() {
        // U+00E9 is 2 bytes in UTF-8.
        let mut cursor = Cursor::new("\u{00E9}a");
        cursor.advance();
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.peek(), Some('a'));
    }

    #[test]
    fn eat_while_stops_at_first_mismatch() {
        let mut cursor = Cursor::new("aaab");
        cursor.eat_while(|c| c == 'a');
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.peek(), Some('b'));
    }

    #[test]
    fn slice_by_offsets() {
        let cursor = Cursor::new("hello world");
        assert_eq!(cursor.slice(0, 5), "hello");
        assert_eq!(cursor.slice(6, 11), "world");
    }

    #[test]
    fn snapshot_and_rewind_restore_everything() {
        let mut cursor = Cursor::new("a\nbc");
        cursor.advance(); // a
        let saved = cursor.snapshot();
        cursor.advance(); // \n
        cursor.advance(); // b
        assert_eq!((cursor.line(), cursor.col()), (2, 2));

        cursor.rewind(saved);
        assert_eq!(cursor.pos(), 1);
        assert_eq!((cursor.line(), cursor.col()), (1, 2));
        assert_eq!(cursor.peek(), Some('\n'));
    }
}

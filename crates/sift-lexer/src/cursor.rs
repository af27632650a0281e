/// Position in the query text, one character at a time.
///
/// Offsets are bytes into the UTF-8 source, which is what every [`Span`]
/// in the pipeline counts in.
///
/// [`Span`]: sift_common::span::Span
pub(crate) struct Cursor<'src> {
    source: &'src str,
    pos: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            chars: source.chars(),
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    pub(crate) fn pos(&self) -> u32 {
        self.pos
    }

    /// Consume the current character if it is `expected`.
    pub(crate) fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// A `.` followed by a digit. A bare trailing dot is member access, not
    /// a fraction.
    pub(crate) fn at_fraction(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next() == Some('.') && ahead.next().is_some_and(|c| c.is_ascii_digit())
    }

    /// The text consumed since `start`.
    pub(crate) fn since(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.pos as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eat_only_matching_characters() {
        let mut cursor = Cursor::new("=>");
        assert!(!cursor.eat('>'));
        assert!(cursor.eat('='));
        assert!(cursor.eat('>'));
        assert_eq!(cursor.pos(), 2);
        assert!(!cursor.eat('>'));
    }

    #[test]
    fn positions_count_utf8_bytes() {
        let mut cursor = Cursor::new("\u{00E9}a");
        assert_eq!(cursor.advance(), Some('\u{00E9}'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!(cursor.since(0), "\u{00E9}a");
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn fraction_needs_a_digit_after_the_dot() {
        let mut cursor = Cursor::new("12.5");
        cursor.eat_while(|c| c.is_ascii_digit());
        assert_eq!(cursor.since(0), "12");
        assert!(cursor.at_fraction());
        assert!(!Cursor::new("1.x").at_fraction());
        assert!(!Cursor::new(".").at_fraction());
    }
}

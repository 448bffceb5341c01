/// Parser error
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ParserError {
    pub line   : usize,
    pub column : usize,
    pub msg    : &'static str,
}

/// Parser that can parse a `&str`, keeping track of the current line and column
pub struct StrParser<'a> {
    pub line   : usize,
    pub column : usize,
    pub string : &'a str
}

impl<'a> StrParser<'a> {
    /// Create a new parser
    pub fn new(string: &'a str) -> Self {
        Self { line: 1, column: 1, string }
    }

    /// Peek at the next character
    pub fn peek(&self) -> Option<char> {
        self.string.chars().next()
    }

    /// Try to consume a given character
    pub fn consume_char(&mut self, ch: char) -> bool {
        if self.string.starts_with(ch) {
            self.consume_count(ch.len_utf8());
            true
        } else {
            false
        }
    }

    /// Consume `count` bytes
    pub fn consume_count(&mut self, count: usize) {
        let (consumed, rest) = self.string.split_at(count);
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.string = rest;
    }

    /// Skip to the next end-of-line, without consuming the end-of-line itself
    pub fn consume_to_eol(&mut self) {
        let idx = self.string.find('\n').unwrap_or(self.string.len());
        self.consume_count(idx);
    }

    /// Consume all whitespace, optionally stopping at a newline
    pub fn consume_whitespace(&mut self, include_newline: bool) {
        let idx = self.string
            .find(|ch: char| !ch.is_whitespace() || (!include_newline && ch == '\n'))
            .unwrap_or(self.string.len());
        self.consume_count(idx);
    }

    /// Check if there is still data to parse
    pub fn can_parse(&self) -> bool {
        !self.string.is_empty()
    }

    /// Create an error at the current line and column
    pub fn error(&self, msg: &'static str) -> ParserError {
        ParserError { line: self.line, column: self.column, msg }
    }

    /// Extract everything up until the first character matching `pred`, or the end of the input
    pub fn extract_until<P: Fn(char) -> bool>(&mut self, pred: P) -> &'a str {
        let string = self.string;
        let idx = string.find(pred).unwrap_or(string.len());
        let res = &string[..idx];
        self.consume_count(idx);
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut parser = StrParser::new("ab\ncd");
        assert!(parser.consume_char('a'));
        assert_eq!((parser.line, parser.column), (1, 2));
        parser.consume_to_eol();
        assert!(parser.consume_char('\n'));
        assert_eq!((parser.line, parser.column), (2, 1));
        assert_eq!(parser.extract_until(|ch| ch == 'd'), "c");
        assert_eq!(parser.peek(), Some('d'));
        parser.consume_to_eol();
        assert!(!parser.can_parse());
    }
}

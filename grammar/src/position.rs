/// Keep track of a position within a str, along with the line it falls on.
#[derive(Debug, Clone)]
pub struct Position<'a> {
    input: &'a str,
    idx: usize,
    line: usize,
}

impl<'a> Position<'a> {
    pub fn new(input: &'a str) -> Self {
        Position {
            input,
            idx: 0,
            line: 1,
        }
    }

    /// The 1-based line the position is on.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_empty(&self) -> bool {
        self.idx >= self.input.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.idx..]
    }

    /// Remainder of the current line, without the line terminator.
    pub fn current_line(&self) -> &'a str {
        let rest = self.rest();
        let end = rest.find('\n').unwrap_or_else(|| rest.len());
        rest[..end].strip_suffix('\r').unwrap_or(&rest[..end])
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Check if a string matches the current input starting at the current
    /// index. The index will be updated on match.
    pub fn match_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.advance(s.len());
            true
        } else {
            false
        }
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.advance(c.len_utf8());
        Some(c)
    }

    /// Return the remainder of the current line and move to the start of the
    /// next one.
    pub fn take_line(&mut self) -> &'a str {
        let line = self.current_line();
        let rest = self.rest();
        let len = rest.find('\n').map_or(rest.len(), |idx| idx + 1);
        self.advance(len);
        line
    }

    /// Move forward `n` bytes, clamped to the end of input.
    pub fn skip(&mut self, n: usize) {
        self.advance(n.min(self.input.len() - self.idx));
    }

    fn advance(&mut self, n: usize) {
        let end = self.idx + n;
        self.line += self.input[self.idx..end].matches('\n').count();
        self.idx = end;
    }
}

use expressions_core::Position;

/// A cursor over a text buffer with push-back and line/column tracking.
///
/// Line and column of every character are computed once when the buffer is
/// loaded, so [`unread`](Self::unread) restores the exact previous position
/// even when stepping back across a line break.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// The buffered characters.
    chars: Vec<char>,
    /// Line/column of each character once it has been read.
    coordinates: Vec<(u32, u32)>,
    /// Number of characters read so far.
    offset: usize,
}

impl Scanner {
    /// Create a new scanner at the start of the text.
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut coordinates = Vec::with_capacity(chars.len());
        let (mut line, mut column) = (1u32, 0u32);
        for (i, &ch) in chars.iter().enumerate() {
            let before = i.checked_sub(1).map(|j| chars[j]);
            let after = chars.get(i + 1).copied();
            if is_line_break(before, ch, after) {
                line += 1;
                column = 0;
            } else if !is_line_char(ch) {
                column += 1;
            }
            coordinates.push((line, column));
        }
        Self {
            chars,
            coordinates,
            offset: 0,
        }
    }

    /// Consume the next character, or `None` at the end of the buffer.
    ///
    /// Reading at the end does not advance, so `None` is returned repeatedly.
    #[inline]
    pub fn read(&mut self) -> Option<char> {
        let ch = self.chars.get(self.offset).copied()?;
        self.offset += 1;
        Some(ch)
    }

    /// Push back the last character read. A no-op at the start of the buffer.
    #[inline]
    pub fn unread(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    /// Push back up to `count` characters.
    #[inline]
    pub fn unread_many(&mut self, count: usize) {
        self.offset = self.offset.saturating_sub(count);
    }

    /// Peek at the next character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    /// Peek at the nth character ahead (0 = next).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.offset + n).copied()
    }

    /// Check if the next character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Consume characters while the predicate matches and return them.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> String {
        let start = self.offset;
        while self.check(&f) {
            self.offset += 1;
        }
        self.slice_from(start)
    }

    /// The text between a previous offset and the current one.
    pub fn slice_from(&self, start: usize) -> String {
        self.chars[start.min(self.offset)..self.offset].iter().collect()
    }

    /// Number of characters consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Check if every character has been consumed.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.chars.len()
    }

    /// Line of the last character read (1 before any read).
    pub fn line(&self) -> u32 {
        self.current().0
    }

    /// Column of the last character read (0 before any read).
    pub fn column(&self) -> u32 {
        self.current().1
    }

    /// Line the next character will have once read.
    pub fn peek_line(&self) -> u32 {
        self.upcoming().0
    }

    /// Column the next character will have once read.
    pub fn peek_column(&self) -> u32 {
        self.upcoming().1
    }

    /// Position of the next character; tokens are stamped with this.
    pub fn peek_position(&self) -> Position {
        let (line, column) = self.upcoming();
        Position::new(line, column)
    }

    /// Rewind to the start of the buffer.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    fn current(&self) -> (u32, u32) {
        match self.offset {
            0 => (1, 0),
            n => self.coordinates[n - 1],
        }
    }

    fn upcoming(&self) -> (u32, u32) {
        match self.coordinates.get(self.offset) {
            Some(&coordinate) => coordinate,
            None => {
                let (line, column) = self.current();
                (line, column + 1)
            }
        }
    }
}

/// `\n`, or a `\r` that is not part of a `\r\n`/`\n\r` pair.
fn is_line_break(before: Option<char>, ch: char, after: Option<char>) -> bool {
    ch == '\n' || (ch == '\r' && before != Some('\n') && after != Some('\n'))
}

#[inline]
fn is_line_char(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

//! Multiline edit buffer behind the entry form.

use unicode_width::UnicodeWidthStr;

/// Text plus a cursor counted in characters, not bytes.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    pub fn newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    /// (line, column) of the cursor, both in characters.
    fn line_col(&self) -> (usize, usize) {
        let before: String = self.content.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count())
            .unwrap_or(0);
        (line, col)
    }

    fn line_lengths(&self) -> Vec<usize> {
        self.content.split('\n').map(|l| l.chars().count()).collect()
    }

    fn move_to(&mut self, line: usize, col: usize) {
        let lengths = self.line_lengths();
        let start: usize = lengths[..line].iter().map(|len| len + 1).sum();
        self.cursor = start + col.min(lengths[line]);
    }

    pub fn up(&mut self) {
        let (line, col) = self.line_col();
        if line > 0 {
            self.move_to(line - 1, col);
        }
    }

    pub fn down(&mut self) {
        let (line, col) = self.line_col();
        if line + 1 < self.line_lengths().len() {
            self.move_to(line + 1, col);
        }
    }

    pub fn home(&mut self) {
        let (line, _) = self.line_col();
        self.move_to(line, 0);
    }

    pub fn end(&mut self) {
        let (line, _) = self.line_col();
        self.move_to(line, usize::MAX);
    }

    /// Cursor position on screen: (display column, row).
    pub fn screen_cursor(&self) -> (u16, u16) {
        let before: String = self.content.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let current_line = before.rsplit('\n').next().unwrap_or("");
        (
            u16::try_from(current_line.width()).unwrap_or(u16::MAX),
            u16::try_from(row).unwrap_or(u16::MAX),
        )
    }
}

//! The message input field: text, cursor and enablement.

pub const CHAT_PLACEHOLDER: &str = "Напишіть повідомлення...";
pub const SIGNED_OUT_PLACEHOLDER: &str = "Увійдіть, щоб почати спілкування";

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug)]
pub struct Composer {
    text: String,
    cursor: usize, // in chars, not bytes
    enabled: bool,
    send_enabled: bool,
    placeholder: &'static str,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            enabled: true,
            send_enabled: false,
            placeholder: CHAT_PLACEHOLDER,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn can_send(&self) -> bool {
        self.send_enabled
    }

    pub fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn set_enabled(&mut self, enabled: bool, placeholder: &'static str) {
        self.enabled = enabled;
        self.placeholder = placeholder;
        self.refresh_send();
    }

    /// Send is available whenever there is something besides whitespace to send.
    pub fn refresh_send(&mut self) {
        self.send_enabled = self.enabled && !self.text.trim().is_empty();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    /// Empties the field and shrinks it back to a single row.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.refresh_send();
    }

    // Editing

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.text.chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    // Layout

    /// The text broken into rows of at most `width` chars. Explicit newlines
    /// start a new row; a row filled exactly to `width` is followed by an empty
    /// one so the cursor has somewhere to sit.
    pub fn visual_lines(&self, width: usize) -> Vec<String> {
        let width = width.max(1);
        let mut rows = Vec::new();

        for line in self.text.split('\n') {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                rows.push(String::new());
                continue;
            }
            for chunk in chars.chunks(width) {
                rows.push(chunk.iter().collect());
            }
            if chars.len() % width == 0 {
                rows.push(String::new());
            }
        }

        rows
    }

    /// Row and column of the cursor within `visual_lines(width)`.
    pub fn cursor_position(&self, width: usize) -> (usize, usize) {
        let width = width.max(1);
        let (mut row, mut col) = (0, 0);

        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
                continue;
            }
            col += 1;
            if col == width {
                row += 1;
                col = 0;
            }
        }

        (row, col)
    }
}

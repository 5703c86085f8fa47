use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text field with a cursor counted in characters.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Apply an editing key. Returns false for keys the field doesn't use.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }

        match key.code {
            KeyCode::Char(c) => {
                let byte_pos = char_to_byte_index(&self.value, self.cursor);
                self.value.insert(byte_pos, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte_pos = char_to_byte_index(&self.value, self.cursor);
                    self.value.remove(byte_pos);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.value.chars().count() {
                    let byte_pos = char_to_byte_index(&self.value, self.cursor);
                    self.value.remove(byte_pos);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.value.chars().count());
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.value.chars().count();
            }
            _ => return false,
        }
        true
    }

    /// The part of the value that fits in `width` columns, scrolled so the
    /// cursor stays visible, and the cursor column within it.
    pub fn visible(&self, width: usize) -> (String, usize) {
        let offset = if width == 0 {
            0
        } else if self.cursor >= width {
            self.cursor - width + 1
        } else {
            0
        };

        let text = self.value.chars().skip(offset).take(width).collect();
        (text, self.cursor - offset)
    }

    /// Same as [`visible`](Self::visible) with every character masked.
    pub fn masked(&self, width: usize) -> (String, usize) {
        let (text, cursor) = self.visible(width);
        ("*".repeat(text.chars().count()), cursor)
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Exit,
    None,
}

/// State for the single-line text field
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters, not bytes
    pub cursor_position: usize,
}

/// Input field below the transcript
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
        }
    }

    /// Handle key input. Enter hands the buffer to the caller without clearing
    /// it; the caller decides whether the text was accepted.
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => return ComposerResult::Submitted(self.state.content.clone()),
            KeyCode::Esc => return ComposerResult::Exit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ComposerResult::Exit;
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.state.cursor_position = self.state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor_position < self.char_count() {
                    self.state.cursor_position += 1;
                }
            }
            KeyCode::Home => self.state.cursor_position = 0,
            KeyCode::End => self.state.cursor_position = self.char_count(),
            _ => {}
        }

        ComposerResult::None
    }

    fn char_count(&self) -> usize {
        self.state.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.state
            .content
            .char_indices()
            .nth(char_index)
            .map_or(self.state.content.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) {
        let index = self.byte_index(self.state.cursor_position);
        self.state.content.insert(index, c);
        self.state.cursor_position += 1;
    }

    fn backspace(&mut self) {
        if self.state.cursor_position > 0 {
            self.state.cursor_position -= 1;
            let index = self.byte_index(self.state.cursor_position);
            self.state.content.remove(index);
        }
    }

    fn delete(&mut self) {
        if self.state.cursor_position < self.char_count() {
            let index = self.byte_index(self.state.cursor_position);
            self.state.content.remove(index);
        }
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn clear(&mut self) {
        self.state.content.clear();
        self.state.cursor_position = 0;
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message (Enter to send, Esc to quit)")
            .style(Style::default().fg(Color::Green));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.height == 0 {
            return;
        }

        let line = if self.state.content.is_empty() {
            Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )])
        } else {
            let mut content = self.state.content.clone();
            content.insert(self.byte_index(self.state.cursor_position), '▌');
            Line::from(vec![Span::raw(content)])
        };

        buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
    }
}

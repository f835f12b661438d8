use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crate::ui::conversation::history::wrap_preformatted;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

const MAX_VISIBLE_LINES: u16 = 6;
const CURSOR: char = '▌';

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerAction {
    /// Enter pressed on ordinary text; the buffer is left for the controller
    Submit,
    /// Enter pressed on a slash command; the buffer has been cleared
    Command(ParsedCommand),
    None,
}

/// Multi-line input buffer with a byte-offset cursor kept on char boundaries
#[derive(Debug, Clone)]
pub struct Composer {
    content: String,
    cursor: usize,
    placeholder: String,
    has_focus: bool,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            has_focus: true,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerAction {
        if key.kind != KeyEventKind::Press {
            return ComposerAction::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.insert_char('\n');
                } else if let Some(command) = parse_slash_command(&self.content) {
                    self.clear();
                    return ComposerAction::Command(command);
                } else {
                    return ComposerAction::Submit;
                }
            }
            KeyCode::Char(c) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.insert_char(c);
                }
            }
            KeyCode::Tab => self.insert_str("    "),
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if let Some(next) = self.next_boundary() {
                    self.content.replace_range(self.cursor..next, "");
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor = next;
                }
            }
            KeyCode::Home => {
                self.cursor = self.content[..self.cursor]
                    .rfind('\n')
                    .map_or(0, |pos| pos + 1);
            }
            KeyCode::End => {
                self.cursor = self.content[self.cursor..]
                    .find('\n')
                    .map_or(self.content.len(), |pos| self.cursor + pos);
            }
            _ => {}
        }

        ComposerAction::None
    }

    /// Insert pasted text at the cursor
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.content.insert_str(self.cursor, &text);
        self.cursor += text.len();
    }

    fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.content[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    /// Replace the whole buffer, cursor at the end
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.len();
    }

    /// Get current content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Rows needed to show the buffer at `width` columns, borders included
    pub fn desired_height(&self, width: u16) -> u16 {
        let inner_width = width.saturating_sub(2) as usize;
        let rows = wrap_preformatted(&self.display_text(), inner_width).len();
        (rows.min(MAX_VISIBLE_LINES as usize) as u16).max(1) + 2
    }

    /// Buffer text with the cursor glyph spliced in when focused
    fn display_text(&self) -> String {
        let mut text = self.content.clone();
        if self.has_focus {
            text.insert(self.cursor, CURSOR);
        }
        text
    }

    /// Wrapped row the cursor sits on
    fn cursor_row(&self, width: usize) -> usize {
        let mut before = self.content[..self.cursor].to_string();
        if self.has_focus {
            before.push(CURSOR);
        }
        wrap_preformatted(&before, width).len().saturating_sub(1)
    }
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Ask Nivesh ")
            .style(if self.has_focus {
                Style::default().fg(Color::Blue)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let mut spans = Vec::new();
            if self.has_focus {
                spans.push(Span::styled("▌", Style::default().fg(Color::White)));
            }
            spans.push(Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &Line::from(spans), inner_area.width);
            return;
        }

        let width = inner_area.width as usize;
        let rows = wrap_preformatted(&self.display_text(), width);

        // Keep the cursor row in view
        let height = inner_area.height as usize;
        let skip = (self.cursor_row(width) + 1).saturating_sub(height);

        for (i, row) in rows.into_iter().skip(skip).take(height).enumerate() {
            let line = Line::from(Span::styled(row, Style::default().fg(Color::White)));
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}

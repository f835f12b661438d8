//! Conversation history display component

use crate::markdown::render_markdown;
use crate::ui::conversation::thread::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Scroll position of the history, counted in lines up from the newest one
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryScroll {
    offset: usize,
}

impl HistoryScroll {
    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = 0;
    }

    /// Pull the offset back to the oldest line that can reach the top
    pub fn clamp(&mut self, max_offset: usize) {
        self.offset = self.offset.min(max_offset);
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Borrowed view of the thread, rendered once per frame
pub struct HistoryWidget<'a> {
    pub messages: &'a [Message],
    pub copied: Option<usize>,
    pub scroll: HistoryScroll,
    pub show_timestamps: bool,
    /// Animation frame for the loading dots
    pub frame: u64,
}

impl Widget for HistoryWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Self::block();
        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.build_lines(inner_area.width);

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = self.scroll.offset.min(max_offset);
        let start = total.saturating_sub(height + offset);
        let visible = all_lines.iter().skip(start).take(height);

        for (i, line) in visible.enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if offset > 0 && inner_area.height > 0 {
            let hint = Line::from(Span::styled(
                format!(" ↓ {offset} more "),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ));
            let width = hint.width() as u16;
            let x = inner_area.x + inner_area.width.saturating_sub(width);
            buf.set_line(x, inner_area.y + inner_area.height - 1, &hint, width);
        }
    }
}

impl HistoryWidget<'_> {
    fn block() -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Conversation ")
    }

    /// Largest scroll offset that still fills `area` with history
    pub fn max_offset(&self, area: Rect) -> usize {
        let inner_area = Self::block().inner(area);
        self.build_lines(inner_area.width)
            .len()
            .saturating_sub(inner_area.height as usize)
    }

    /// Lay out every message into display lines for the given width
    pub fn build_lines(&self, width: u16) -> Vec<Line<'static>> {
        let content_width = width.saturating_sub(2);
        let mut lines = Vec::new();

        for (index, message) in self.messages.iter().enumerate() {
            lines.push(self.header(index, message));

            let body = if message.is_placeholder() {
                vec![loading_dots(self.frame)]
            } else {
                match message.role {
                    Role::Agent => render_markdown(&message.content, content_width),
                    Role::User => wrap_preformatted(&message.content, content_width as usize)
                        .into_iter()
                        .map(|text| Line::from(Span::styled(text, Style::default().fg(Color::LightBlue))))
                        .collect(),
                }
            };

            for line in body {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans);
                lines.push(Line::from(spans));
            }
            lines.push(Line::default());
        }

        lines
    }

    fn header(&self, index: usize, message: &Message) -> Line<'static> {
        let role_style = match message.role {
            Role::Agent => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            Role::User => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
        };

        let mut spans = vec![
            Span::styled(format!("#{} ", index + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(message.role.display_name(), role_style),
        ];
        if self.show_timestamps {
            spans.push(Span::styled(
                format!("  {}", message.timestamp),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if self.copied == Some(index) {
            spans.push(Span::styled("  Copied!", Style::default().fg(Color::Blue)));
        }
        Line::from(spans)
    }
}

fn loading_dots(frame: u64) -> Line<'static> {
    let dots = match frame % 4 {
        0 => ".  ",
        1 => ".. ",
        2 => "...",
        _ => "   ",
    };
    Line::from(Span::styled(dots, Style::default().fg(Color::Yellow)))
}

/// Hard-wrap literal text: newlines and runs of spaces are preserved
pub fn wrap_preformatted(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut current = String::new();
        let mut col = 0;
        for c in raw.chars() {
            let w = c.width().unwrap_or(0);
            if col + w > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                col = 0;
            }
            current.push(c);
            col += w;
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::conversation::thread::LOADING_SENTINEL;

    fn message(role: Role, content: &str) -> Message {
        Message {
            role,
            content: content.to_string(),
            timestamp: "3:07:42 PM".to_string(),
        }
    }

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn widget(messages: &[Message]) -> HistoryWidget<'_> {
        HistoryWidget {
            messages,
            copied: None,
            scroll: HistoryScroll::default(),
            show_timestamps: true,
            frame: 2,
        }
    }

    #[test]
    fn preformatted_wrap_keeps_spacing_and_newlines() {
        assert_eq!(wrap_preformatted("a  b\n\nc", 10), vec!["a  b", "", "c"]);
        assert_eq!(wrap_preformatted("abcdef", 4), vec!["abcd", "ef"]);
    }

    #[test]
    fn user_content_is_not_markdown() {
        let messages = [message(Role::User, "**not bold**")];
        let lines = widget(&messages).build_lines(40);
        assert_eq!(text_of(&lines[1]), "  **not bold**");
    }

    #[test]
    fn agent_content_is_markdown() {
        let messages = [message(Role::Agent, "**bold**")];
        let lines = widget(&messages).build_lines(40);
        assert_eq!(text_of(&lines[1]), "  bold");
    }

    #[test]
    fn placeholder_renders_as_dots() {
        let messages = [message(Role::Agent, LOADING_SENTINEL)];
        let lines = widget(&messages).build_lines(40);
        assert_eq!(text_of(&lines[1]), "  ...");
    }

    #[test]
    fn header_shows_number_timestamp_and_copied_badge() {
        let messages = [message(Role::User, "hi"), message(Role::Agent, "hello")];
        let mut w = widget(&messages);
        w.copied = Some(1);
        let lines = w.build_lines(60);
        assert_eq!(text_of(&lines[0]), "#1 You  3:07:42 PM");
        assert_eq!(text_of(&lines[3]), "#2 Nivesh  3:07:42 PM  Copied!");
    }

    #[test]
    fn renders_newest_lines_at_bottom() {
        let messages: Vec<Message> = (0..10)
            .map(|i| message(Role::User, &format!("line {i}")))
            .collect();
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        widget(&messages).render(area, &mut buf);

        let rows: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol().to_string()).collect())
            .collect();
        assert!(rows.iter().any(|row| row.contains("line 9")));
        assert!(!rows.iter().any(|row| row.contains("line 0")));
    }

    #[test]
    fn scrolling_up_reveals_older_lines_and_is_clamped() {
        let messages: Vec<Message> = (0..10)
            .map(|i| message(Role::User, &format!("line {i}")))
            .collect();
        let area = Rect::new(0, 0, 30, 6);
        let mut w = widget(&messages);
        w.scroll.scroll_up(1000);
        let mut buf = Buffer::empty(area);
        w.render(area, &mut buf);

        let rows: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol().to_string()).collect())
            .collect();
        assert!(rows.iter().any(|row| row.contains("#1 You")));
        assert!(rows.iter().any(|row| row.contains("more")));

        let mut scroll = HistoryScroll::default();
        scroll.scroll_up(3);
        scroll.scroll_down(10);
        assert_eq!(scroll.offset, 0);
    }

    #[test]
    fn offset_is_clamped_to_the_scrollable_range() {
        let messages: Vec<Message> = (0..10)
            .map(|i| message(Role::User, &format!("line {i}")))
            .collect();
        // 30 lines of history in 4 inner rows
        let max = widget(&messages).max_offset(Rect::new(0, 0, 30, 6));
        assert_eq!(max, 26);

        let mut scroll = HistoryScroll::default();
        for _ in 0..20 {
            scroll.scroll_up(5);
            scroll.clamp(max);
        }
        assert_eq!(scroll.offset(), 26);
        scroll.scroll_down(1);
        assert_eq!(scroll.offset(), 25);
    }
}

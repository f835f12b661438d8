use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// A styled line ready for Ratatui rendering.
pub type StyledLines = Vec<Line<'static>>;

/// Convert GitHub-flavoured markdown into styled [`Line`]s, word-wrapped to
/// `wrap_width` columns. Tables, strikethrough and task lists are enabled.
pub fn render_markdown(md: &str, wrap_width: u16) -> StyledLines {
    let width = if wrap_width == 0 { 80 } else { wrap_width as usize };
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(width);
    for event in Parser::new_ext(md, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct Renderer {
    width: usize,
    lines: StyledLines,
    spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    /// `Some(n)` for ordered lists (next number), `None` for bullets
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    quote_depth: usize,
    link_target: Option<String>,
    table_row: Option<Vec<String>>,
    table_cell: String,
    in_table_cell: bool,
}

impl Renderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![Style::default()],
            lists: Vec::new(),
            in_code_block: false,
            quote_depth: 0,
            link_target: None,
            table_row: None,
            table_cell: String::new(),
            in_table_cell: false,
        }
    }

    fn style(&self) -> Style {
        *self.style_stack.last().unwrap_or(&Style::default())
    }

    fn push_style(&mut self, f: impl FnOnce(Style) -> Style) {
        let next = f(self.style());
        self.style_stack.push(next);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn flush_line(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank_line(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn column(&self) -> usize {
        self.spans.iter().map(|s| s.content.width()).sum()
    }

    fn indent(&self) -> String {
        "  ".repeat(self.lists.len())
    }

    /// Open a fresh line with one quote bar per enclosing block quote
    fn start_line(&mut self) {
        if self.spans.is_empty() {
            for _ in 0..self.quote_depth {
                self.spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
            }
        }
    }

    /// Column where wrapped continuation text begins
    fn continuation_column(&self) -> usize {
        self.quote_depth * 2 + self.indent().width()
    }

    /// Flush `pending` and the current line, then open a continuation line
    fn wrap(&mut self, pending: &mut String, style: Style) -> usize {
        if !pending.is_empty() {
            self.spans.push(Span::styled(std::mem::take(pending), style));
        }
        self.flush_line();
        self.start_line();
        let indent = self.indent();
        if !indent.is_empty() {
            self.spans.push(Span::raw(indent));
        }
        self.column()
    }

    fn push_text(&mut self, text: &str) {
        if self.in_table_cell {
            self.table_cell.push_str(text);
            return;
        }
        if self.in_code_block {
            let style = self.style();
            for (i, segment) in text.split('\n').enumerate() {
                if i > 0 {
                    self.flush_line();
                }
                if !segment.is_empty() {
                    self.start_line();
                    self.spans.push(Span::styled(format!("  {segment}"), style));
                }
            }
            return;
        }

        self.start_line();
        let style = self.style();
        let mut col = self.column();
        let mut buf = String::new();
        for word in text.split_inclusive(' ') {
            let word_width = word.width();
            if col + word_width > self.width && col > self.continuation_column() {
                col = self.wrap(&mut buf, style);
            }
            if col + word_width <= self.width {
                buf.push_str(word);
                col += word_width;
                continue;
            }
            // Wider than a whole line: break it at the width
            for c in word.chars() {
                let char_width = c.width().unwrap_or(0);
                if col + char_width > self.width && col > self.continuation_column() {
                    col = self.wrap(&mut buf, style);
                }
                buf.push(c);
                col += char_width;
            }
        }
        if !buf.is_empty() {
            self.spans.push(Span::styled(buf, style));
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.blank_line();
                self.style_stack.push(heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                self.pop_style();
                self.blank_line();
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.flush_line();
                }
            }
            Event::Start(Tag::Strong) => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Event::Start(Tag::Emphasis) => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Event::Start(Tag::Strikethrough) => {
                self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT))
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough) => {
                self.pop_style()
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.blank_line();
                self.in_code_block = true;
                self.style_stack.push(Style::default().fg(Color::Cyan));
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush_line();
                self.in_code_block = false;
                self.pop_style();
                self.blank_line();
            }
            Event::Start(Tag::List(start)) => {
                self.flush_line();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_line();
                self.start_line();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.spans.push(Span::raw(format!("{}{}", "  ".repeat(depth), marker)));
            }
            Event::End(TagEnd::Item) => self.flush_line(),
            Event::TaskListMarker(done) => {
                let mark = if done { "[x] " } else { "[ ] " };
                self.spans.push(Span::styled(mark, Style::default().fg(Color::Green)));
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.flush_line();
                self.quote_depth += 1;
                self.push_style(|s| s.fg(Color::DarkGray));
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                self.blank_line();
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.link_target = Some(dest_url.to_string());
                self.push_style(|s| s.fg(Color::Blue).add_modifier(Modifier::UNDERLINED));
            }
            Event::End(TagEnd::Link) => {
                self.pop_style();
                if let Some(url) = self.link_target.take() {
                    self.push_text(&format!(" <{url}>"));
                }
            }
            Event::Start(Tag::Table(_)) => self.blank_line(),
            Event::End(TagEnd::Table) => self.blank_line(),
            Event::Start(Tag::TableHead | Tag::TableRow) => self.table_row = Some(Vec::new()),
            Event::End(TagEnd::TableHead) => {
                let width = self.emit_table_row(Modifier::BOLD);
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(width.min(self.width)),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            Event::End(TagEnd::TableRow) => {
                self.emit_table_row(Modifier::empty());
            }
            Event::Start(Tag::TableCell) => {
                self.in_table_cell = true;
                self.table_cell.clear();
            }
            Event::End(TagEnd::TableCell) => {
                self.in_table_cell = false;
                let cell = std::mem::take(&mut self.table_cell);
                if let Some(row) = self.table_row.as_mut() {
                    row.push(cell.trim().to_string());
                }
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                if self.in_table_cell {
                    self.table_cell.push_str(&code);
                } else {
                    self.start_line();
                    let style = Style::default().fg(Color::Yellow).bg(Color::DarkGray);
                    self.spans.push(Span::styled(format!("`{code}`"), style));
                }
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width),
                    Style::default().fg(Color::DarkGray),
                )));
                self.lines.push(Line::default());
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            _ => {}
        }
    }

    /// Emit the buffered table row as one line; returns its display width
    fn emit_table_row(&mut self, modifier: Modifier) -> usize {
        let Some(cells) = self.table_row.take() else {
            return 0;
        };
        let text = cells.join(" │ ");
        let width = text.width();
        self.lines.push(Line::from(Span::styled(
            text,
            Style::default().add_modifier(modifier),
        )));
        width
    }

    fn finish(mut self) -> StyledLines {
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
        HeadingLevel::H2 => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        HeadingLevel::H3 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}

use crate::backend::ChatBackend;
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::events::{AppEvent, TuiEvent};
use crate::ui::conversation::{
    dispatch, get_help_text, ComposerAction, ConversationController, HistoryScroll,
    HistoryWidget, ParsedCommand, SlashCommand,
};
use anyhow::{Context, Result};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

const TITLE: &str = "Where shall we invest today?";
const SUBTITLE: &str = "Get a list of new stocks everyday at your finger tips.";
const DISCLAIMER: &str = "AI can make mistakes. Consider checking important information";
const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Put the terminal into raw, alternate-screen mode
pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        hook(info);
    }));

    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

pub fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    Ok(())
}

/// Interactive chat screen
pub struct App {
    config: Config,
    controller: ConversationController,
    backend: Arc<dyn ChatBackend>,
    clipboard: Box<dyn Clipboard>,
    scroll: HistoryScroll,
    history_height: u16,
    history_max_offset: usize,
    show_help: bool,
    notice: Option<(String, Instant)>,
    frame: u64,
    should_quit: bool,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(config: Config, backend: Arc<dyn ChatBackend>, clipboard: Box<dyn Clipboard>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = ConversationController::from_config(&config);

        Self {
            config,
            controller,
            backend,
            clipboard,
            scroll: HistoryScroll::default(),
            history_height: 10,
            history_max_offset: 0,
            show_help: false,
            notice: None,
            frame: 0,
            should_quit: false,
            events_tx,
            events_rx,
        }
    }

    /// Run the event loop until the user quits
    pub async fn run(mut self, terminal: &mut Tui) -> Result<()> {
        let mut term_events = EventStream::new();
        let mut ticker = tokio::time::interval(self.config.tick());

        loop {
            terminal
                .draw(|frame| self.draw(frame))
                .context("Failed to draw frame")?;

            if self.should_quit {
                break;
            }

            let event = tokio::select! {
                Some(raw) = term_events.next() => {
                    let raw = raw.context("Failed to read terminal event")?;
                    TuiEvent::from_crossterm(raw).map(AppEvent::Tui)
                }
                Some(event) = self.events_rx.recv() => Some(event),
                _ = ticker.tick() => Some(AppEvent::Tick),
            };

            if let Some(event) = event {
                self.handle_event(event);
            }
        }

        tracing::info!("chat closed");
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) {
        let now = Instant::now();
        match event {
            AppEvent::Tick => {
                self.frame = self.frame.wrapping_add(1);
                self.controller.tick(now);
                if self.notice.as_ref().is_some_and(|(_, at)| now.duration_since(*at) >= NOTICE_TTL) {
                    self.notice = None;
                }
            }
            AppEvent::Settled { request_id, result } => {
                if self.controller.settle(request_id, result) {
                    self.scroll.scroll_to_bottom();
                }
            }
            AppEvent::Tui(TuiEvent::Key(key)) => self.handle_key(key, now),
            AppEvent::Tui(TuiEvent::Paste(text)) => self.controller.composer_mut().insert_str(&text),
            AppEvent::Tui(TuiEvent::Resize(..)) => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.show_help {
            self.show_help = false;
            self.controller.composer_mut().set_focus(true);
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = (self.history_height / 2).max(1) as usize;

        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('y') if ctrl => {
                if !self.controller.copy_latest_reply(self.clipboard.as_mut(), now) {
                    self.set_notice("Nothing copied", now);
                }
            }
            KeyCode::PageUp => {
                self.scroll.scroll_up(page);
                self.scroll.clamp(self.history_max_offset);
            }
            KeyCode::PageDown => self.scroll.scroll_down(page),
            KeyCode::End if ctrl => self.scroll.scroll_to_bottom(),
            KeyCode::F(n) => {
                if !self.controller.select_suggestion_at(usize::from(n).saturating_sub(1)) {
                    self.set_notice(format!("No suggestion on F{n}"), now);
                }
            }
            _ => match self.controller.composer_mut().handle_key(key) {
                ComposerAction::Submit => self.submit(now),
                ComposerAction::Command(command) => self.run_command(command, now),
                ComposerAction::None => {}
            },
        }
    }

    fn submit(&mut self, now: Instant) {
        let Some(request) = self.controller.submit() else {
            if self.controller.is_in_flight() {
                self.set_notice("Still waiting for the previous reply", now);
            }
            return;
        };

        self.scroll.scroll_to_bottom();
        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let (request_id, result) = dispatch(backend.as_ref(), request).await;
            let _ = tx.send(AppEvent::Settled { request_id, result });
        });
    }

    fn run_command(&mut self, command: ParsedCommand, now: Instant) {
        match command.command {
            SlashCommand::Copy => {
                let copied = match command.index_argument() {
                    Some(index) => self.controller.copy_message(index, self.clipboard.as_mut(), now),
                    None => self.controller.copy_latest_reply(self.clipboard.as_mut(), now),
                };
                if !copied {
                    self.set_notice("Nothing copied", now);
                }
            }
            SlashCommand::Suggest => {
                let selected = command
                    .index_argument()
                    .is_some_and(|index| self.controller.select_suggestion_at(index));
                if !selected {
                    self.set_notice(
                        format!("Pick a suggestion from 1 to {}", self.controller.suggestions().len()),
                        now,
                    );
                }
            }
            SlashCommand::Help => {
                self.show_help = true;
                self.controller.composer_mut().set_focus(false);
            }
            SlashCommand::Quit => self.should_quit = true,
        }
    }

    fn set_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some((text.into(), now));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let composer_height = self.controller.composer().desired_height(area.width);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),               // Title
                Constraint::Min(5),                  // History
                Constraint::Length(composer_height), // Composer
                Constraint::Length(2),               // Suggestions
                Constraint::Length(1),               // Footer
            ])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray))),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        self.history_height = chunks[1].height.saturating_sub(2);
        let now = Instant::now();
        let mut history = HistoryWidget {
            messages: self.controller.messages(),
            copied: self.controller.copied_index(now),
            scroll: self.scroll,
            show_timestamps: self.config.ui.show_timestamps,
            frame: self.frame,
        };
        self.history_max_offset = history.max_offset(chunks[1]);
        self.scroll.clamp(self.history_max_offset);
        history.scroll = self.scroll;
        frame.render_widget(history, chunks[1]);

        frame.render_widget(self.controller.composer(), chunks[2]);

        frame.render_widget(self.suggestion_bar(), chunks[3]);

        let footer = match (&self.notice, self.controller.is_in_flight()) {
            (Some((text, _)), _) => Span::styled(text.clone(), Style::default().fg(Color::Yellow)),
            (None, true) => Span::styled("Waiting for Nivesh...", Style::default().fg(Color::Yellow)),
            (None, false) => Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(Paragraph::new(Line::from(footer)).alignment(Alignment::Center), chunks[4]);

        if self.show_help {
            let popup = centered_rect(60, 70, area);
            frame.render_widget(Clear, popup);
            frame.render_widget(
                Paragraph::new(get_help_text())
                    .block(Block::default().borders(Borders::ALL).title(" Help (any key to close) "))
                    .wrap(Wrap { trim: false }),
                popup,
            );
        }
    }

    fn suggestion_bar(&self) -> Paragraph<'static> {
        let mut spans = Vec::new();
        for (i, label) in self.controller.suggestions().iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("F{}", i + 1),
                Style::default().fg(Color::Black).bg(Color::Blue),
            ));
            spans.push(Span::styled(format!(" {label}"), Style::default().fg(Color::Blue)));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use crate::backend::ChatReply;
    use crate::clipboard::testing::MemoryClipboard;
    use ratatui::backend::TestBackend;

    fn app(backend: ScriptedBackend) -> App {
        App::new(Config::default(), Arc::new(backend), Box::new(MemoryClipboard::default()))
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Tui(TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    #[tokio::test]
    async fn enter_sends_and_settle_event_lands_reply() {
        let backend = ScriptedBackend::replying(vec![Ok(ChatReply::text("Buy XYZ"))]);
        let mut app = app(backend.clone());

        type_text(&mut app, "Top picks?");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.controller.is_in_flight());
        assert_eq!(app.controller.messages().len(), 3);

        let settled = app.events_rx.recv().await.unwrap();
        app.handle_event(settled);

        assert!(!app.controller.is_in_flight());
        assert_eq!(app.controller.messages().last().unwrap().content, "Buy XYZ");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn function_key_fills_suggestion() {
        let mut app = app(ScriptedBackend::default());
        app.handle_event(key(KeyCode::F(3)));
        assert_eq!(
            app.controller.composer().content(),
            "Give me stocks for that satisfy the SMA Strategy."
        );

        app.handle_event(key(KeyCode::F(12)));
        assert!(app.notice.is_some());
    }

    #[tokio::test]
    async fn slash_commands_reach_the_controller() {
        let mut app = app(ScriptedBackend::default());

        type_text(&mut app, "/copy 1");
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.controller.copied_index(Instant::now()), Some(0));

        type_text(&mut app, "/help");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.show_help);
        app.handle_event(key(KeyCode::Char('x')));
        assert!(!app.show_help);

        type_text(&mut app, "/quit");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.should_quit);
        assert_eq!(app.controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn draw_shows_greeting_and_disclaimer() {
        let mut app = app(ScriptedBackend::default());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer.get(x, y).symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");

        assert!(screen.contains(TITLE));
        assert!(screen.contains("Nivesh, a financial AI agent"));
        assert!(screen.contains(DISCLAIMER));
        assert!(screen.contains("Enter a prompt..."));
    }

    #[tokio::test]
    async fn page_up_stops_at_the_oldest_line() {
        let mut app = app(ScriptedBackend::default());
        // Narrow enough that the greeting wraps past the history box
        let mut terminal = Terminal::new(TestBackend::new(20, 14)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let max = app.history_max_offset;
        assert!(max > 0);

        for _ in 0..20 {
            app.handle_event(key(KeyCode::PageUp));
        }
        assert_eq!(app.scroll.offset(), max);

        app.handle_event(key(KeyCode::PageDown));
        assert!(app.scroll.offset() < max);
    }
}

use uuid::Uuid;

use crate::backend::{ChatReply, RequestFailure};

/// Internal application events for coordinating between components
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input
    Tui(TuiEvent),

    /// The chat backend answered (or failed) the request with this id
    Settled {
        request_id: Uuid,
        result: Result<ChatReply, RequestFailure>,
    },

    /// Redraw tick (animations and marker expiry)
    Tick,
}

/// TUI-specific events (keyboard, paste, resize)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}

impl TuiEvent {
    /// Map a raw crossterm event; mouse and focus events are dropped
    pub fn from_crossterm(event: crossterm::event::Event) -> Option<Self> {
        use crossterm::event::Event;

        match event {
            Event::Key(key) => Some(TuiEvent::Key(key)),
            Event::Paste(text) => Some(TuiEvent::Paste(text)),
            Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
            _ => None,
        }
    }
}

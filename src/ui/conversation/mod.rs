//! Conversation UI components for the chat screen

pub mod commands;
pub mod composer;
pub mod controller;
pub mod copied;
pub mod history;
pub mod suggestions;
pub mod thread;

pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::ComposerAction;
pub use controller::{dispatch, ConversationController};
pub use history::{HistoryScroll, HistoryWidget};

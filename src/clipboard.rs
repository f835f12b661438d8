//! Write-only clipboard access.
//!
//! The terminal client has no windowing system handle, so text is placed on
//! the system clipboard with the OSC 52 escape sequence, which most modern
//! terminals (and tmux with `set-clipboard on`) forward to the host.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to write clipboard escape: {0}")]
    Io(#[from] io::Error),
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// `ESC ] 52 ; c ; <base64> BEL`
struct SetClipboard(String);

impl crossterm::Command for SetClipboard {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b]52;c;{}\x07", self.0)
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "OSC 52 needs a terminal with ANSI support",
        ))
    }
}

/// Clipboard backed by the controlling terminal
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let payload = STANDARD.encode(text.as_bytes());
        crossterm::execute!(self.out, SetClipboard(payload))?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_base64_osc52_sequence() {
        let mut clipboard = Osc52Clipboard::new(Vec::new());
        clipboard.write_text("Buy XYZ").unwrap();

        let written = String::from_utf8(clipboard.out).unwrap();
        assert_eq!(written, "\x1b]52;c;QnV5IFhZWg==\x07");
    }

    #[test]
    fn encodes_multibyte_text() {
        let mut clipboard = Osc52Clipboard::new(Vec::new());
        clipboard.write_text("₹500").unwrap();

        let written = String::from_utf8(clipboard.out).unwrap();
        let payload = written
            .trim_start_matches("\x1b]52;c;")
            .trim_end_matches('\x07');
        assert_eq!(STANDARD.decode(payload).unwrap(), "₹500".as_bytes());
    }
}

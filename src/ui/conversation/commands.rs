use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Copy a message to the clipboard
    Copy,
    /// Put a suggested prompt into the composer
    Suggest,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 1-based number argument converted to a 0-based index
    pub fn index_argument(&self) -> Option<usize> {
        self.argument()?
            .trim()
            .trim_start_matches('#')
            .parse::<usize>()
            .ok()?
            .checked_sub(1)
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Copy => "copy message <n> (default: latest reply) to the clipboard",
            SlashCommand::Suggest => "put suggestion <n> into the prompt",
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let tail: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head).ok().or_else(|| match head.as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "c" | "cp" => Some(SlashCommand::Copy),
        "s" => Some(SlashCommand::Suggest),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if tail.is_empty() {
        None
    } else {
        Some(tail.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Commands:\n\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("  /{:<8} {}\n", command.command(), command.description()));
    }

    help.push_str("\nKeys:\n\n");
    help.push_str("  Enter          send the prompt\n");
    help.push_str("  Shift+Enter    new line (Alt+Enter also works)\n");
    help.push_str("  F1..F12        use a suggestion\n");
    help.push_str("  Ctrl+Y         copy the latest reply\n");
    help.push_str("  PgUp/PgDn      scroll the conversation\n");
    help.push_str("  Ctrl+End       jump to the newest message\n");
    help.push_str("  Esc, Ctrl+C    quit\n");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_argument() {
        let parsed = parse_slash_command("/copy 3").unwrap();
        assert_eq!(parsed.command, SlashCommand::Copy);
        assert_eq!(parsed.index_argument(), Some(2));
    }

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!(parse_slash_command("/Q").unwrap().command, SlashCommand::Quit);
        assert_eq!(parse_slash_command("/s 2").unwrap().command, SlashCommand::Suggest);
        assert_eq!(parse_slash_command("  /help  ").unwrap().argument, None);
    }

    #[test]
    fn unknown_or_plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("/etf returns"), None);
        assert_eq!(parse_slash_command("what is /copy"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn zero_or_garbage_index_is_rejected() {
        assert_eq!(parse_slash_command("/copy 0").unwrap().index_argument(), None);
        assert_eq!(parse_slash_command("/copy x").unwrap().index_argument(), None);
        assert_eq!(parse_slash_command("/copy #2").unwrap().index_argument(), Some(1));
        assert_eq!(parse_slash_command("/copy").unwrap().index_argument(), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for command in SlashCommand::iter() {
            assert!(help.contains(&format!("/{}", command.command())));
        }
    }
}

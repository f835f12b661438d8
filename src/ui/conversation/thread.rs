//! Conversation thread model and its transition function.
//!
//! The thread is an append-only list of immutable [`Message`]s. The only
//! element ever removed is the loading placeholder, and only by replacing it
//! with the settled agent reply. Every change goes through [`reduce`].

use chrono::{DateTime, Local};
use thiserror::Error;

/// Content of the synthetic agent message shown while a reply is pending
pub const LOADING_SENTINEL: &str = "...";
/// Agent content when the backend answered without a usable `output`
pub const NO_RESPONSE: &str = "No response.";
/// Agent content when the request failed
pub const REQUEST_FAILED: &str = "Sorry, something went wrong.";

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Agent,
    User,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Agent => "Nivesh",
            Role::User => "You",
        }
    }
}

/// A single message in the conversation thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl Message {
    pub fn user(content: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: format_timestamp(at),
        }
    }

    pub fn agent(content: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
            timestamp: format_timestamp(at),
        }
    }

    pub fn loading(at: DateTime<Local>) -> Self {
        Self::agent(LOADING_SENTINEL, at)
    }

    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Agent && self.content == LOADING_SENTINEL
    }
}

/// 12-hour wall clock with seconds, e.g. `3:07:42 PM`
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%-I:%M:%S %p").to_string()
}

/// Turn the backend's `output` into display content. Missing, empty and
/// sentinel-valued outputs all fall back to [`NO_RESPONSE`] so a reply can
/// never masquerade as the placeholder.
pub fn resolve_output(output: Option<String>) -> String {
    match output {
        Some(text) if !text.is_empty() && text != LOADING_SENTINEL => text,
        _ => NO_RESPONSE.to_string(),
    }
}

/// Inputs to the thread transition function
#[derive(Debug, Clone)]
pub enum ThreadEvent {
    /// User text accepted: append it, then the placeholder
    SubmitStart { text: String, at: DateTime<Local> },
    /// Backend answered; `output` is the raw field, if any
    ResponseSuccess {
        output: Option<String>,
        at: DateTime<Local>,
    },
    /// Request failed for any reason
    ResponseFailure { at: DateTime<Local> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("a reply is already pending")]
    AlreadyAwaiting,
    #[error("no reply is pending")]
    NotAwaiting,
}

/// Compute the next thread from the current one and an event.
///
/// Given a thread satisfying [`placeholder_invariant_holds`], every `Ok`
/// result satisfies it too.
pub fn reduce(messages: &[Message], event: ThreadEvent) -> Result<Vec<Message>, ThreadError> {
    let awaiting = messages.last().is_some_and(Message::is_placeholder);

    match event {
        ThreadEvent::SubmitStart { text, at } => {
            if awaiting {
                return Err(ThreadError::AlreadyAwaiting);
            }
            let mut next = Vec::with_capacity(messages.len() + 2);
            next.extend_from_slice(messages);
            next.push(Message::user(text, at));
            next.push(Message::loading(at));
            Ok(next)
        }
        ThreadEvent::ResponseSuccess { output, at } => {
            replace_placeholder(messages, awaiting, Message::agent(resolve_output(output), at))
        }
        ThreadEvent::ResponseFailure { at } => {
            replace_placeholder(messages, awaiting, Message::agent(REQUEST_FAILED, at))
        }
    }
}

fn replace_placeholder(
    messages: &[Message],
    awaiting: bool,
    reply: Message,
) -> Result<Vec<Message>, ThreadError> {
    if !awaiting {
        return Err(ThreadError::NotAwaiting);
    }
    let mut next = messages[..messages.len() - 1].to_vec();
    next.push(reply);
    Ok(next)
}

/// At most one placeholder, and if present it is the last message
pub fn placeholder_invariant_holds(messages: &[Message]) -> bool {
    match messages.iter().position(Message::is_placeholder) {
        None => true,
        Some(index) => index + 1 == messages.len(),
    }
}

/// Owned thread applying events through [`reduce`]
#[derive(Debug, Clone)]
pub struct Thread {
    messages: Vec<Message>,
}

impl Thread {
    pub fn with_greeting(greeting: &str, at: DateTime<Local>) -> Self {
        Self {
            messages: vec![Message::agent(greeting, at)],
        }
    }

    pub fn apply(&mut self, event: ThreadEvent) -> Result<(), ThreadError> {
        self.messages = reduce(&self.messages, event)?;
        debug_assert!(placeholder_invariant_holds(&self.messages));
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_awaiting(&self) -> bool {
        self.messages.last().is_some_and(Message::is_placeholder)
    }

    /// Index of the newest settled agent message
    pub fn last_agent_index(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.role == Role::Agent && !m.is_placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 15, 7, 42).unwrap()
    }

    fn greeting() -> Vec<Message> {
        vec![Message::agent("Hello", at())]
    }

    fn submit(text: &str) -> ThreadEvent {
        ThreadEvent::SubmitStart {
            text: text.to_string(),
            at: at(),
        }
    }

    #[test]
    fn timestamp_is_twelve_hour_with_seconds() {
        assert_eq!(format_timestamp(at()), "3:07:42 PM");
        let morning = Local.with_ymd_and_hms(2024, 3, 5, 0, 5, 9).unwrap();
        assert_eq!(format_timestamp(morning), "12:05:09 AM");
    }

    #[test]
    fn submit_appends_user_then_placeholder() {
        let next = reduce(&greeting(), submit("Top picks?")).unwrap();
        assert_eq!(next.len(), 3);
        assert_eq!(next[1].role, Role::User);
        assert_eq!(next[1].content, "Top picks?");
        assert!(next[2].is_placeholder());
        assert!(placeholder_invariant_holds(&next));
    }

    #[test]
    fn submit_while_awaiting_is_rejected() {
        let pending = reduce(&greeting(), submit("one")).unwrap();
        assert_eq!(reduce(&pending, submit("two")), Err(ThreadError::AlreadyAwaiting));
    }

    #[test]
    fn success_replaces_placeholder_with_output() {
        let pending = reduce(&greeting(), submit("Top picks?")).unwrap();
        let done = reduce(
            &pending,
            ThreadEvent::ResponseSuccess {
                output: Some("Buy XYZ".to_string()),
                at: at(),
            },
        )
        .unwrap();

        assert_eq!(done.len(), greeting().len() + 2);
        assert_eq!(done.last().unwrap(), &Message::agent("Buy XYZ", at()));
        assert!(!done.iter().any(Message::is_placeholder));
    }

    #[test]
    fn missing_or_empty_output_falls_back() {
        assert_eq!(resolve_output(None), NO_RESPONSE);
        assert_eq!(resolve_output(Some(String::new())), NO_RESPONSE);
        assert_eq!(resolve_output(Some(LOADING_SENTINEL.to_string())), NO_RESPONSE);
        assert_eq!(resolve_output(Some("  ".to_string())), "  ");
    }

    #[test]
    fn failure_replaces_placeholder_with_error_text() {
        let pending = reduce(&greeting(), submit("Top picks?")).unwrap();
        let done = reduce(&pending, ThreadEvent::ResponseFailure { at: at() }).unwrap();
        assert_eq!(done.len(), 3);
        assert_eq!(done[2].content, REQUEST_FAILED);
        assert_eq!(done[1].content, "Top picks?");
    }

    #[test]
    fn settle_without_pending_reply_is_rejected() {
        assert_eq!(
            reduce(&greeting(), ThreadEvent::ResponseFailure { at: at() }),
            Err(ThreadError::NotAwaiting)
        );
        assert_eq!(
            reduce(&[], ThreadEvent::ResponseSuccess { output: None, at: at() }),
            Err(ThreadError::NotAwaiting)
        );
    }

    #[test]
    fn user_text_equal_to_sentinel_is_not_a_placeholder() {
        let next = reduce(&greeting(), submit(LOADING_SENTINEL)).unwrap();
        assert!(!next[1].is_placeholder());
        assert!(placeholder_invariant_holds(&next));
    }

    #[test]
    fn invariant_detects_misplaced_placeholder() {
        let mut messages = greeting();
        messages.insert(0, Message::loading(at()));
        assert!(!placeholder_invariant_holds(&messages));
        assert!(placeholder_invariant_holds(&[]));
    }

    #[test]
    fn invariant_holds_across_a_long_session() {
        let mut thread = Thread::with_greeting("Hello", at());
        for round in 0..20 {
            thread.apply(submit(&format!("question {round}"))).unwrap();
            assert!(thread.is_awaiting());
            let event = if round % 3 == 0 {
                ThreadEvent::ResponseFailure { at: at() }
            } else {
                ThreadEvent::ResponseSuccess {
                    output: Some(format!("answer {round}")),
                    at: at(),
                }
            };
            thread.apply(event).unwrap();
            assert!(placeholder_invariant_holds(thread.messages()));
        }
        assert_eq!(thread.len(), 41);
        assert_eq!(thread.last_agent_index(), Some(40));
    }
}

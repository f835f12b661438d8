use chrono::Local;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::backend::{ChatBackend, ChatReply, RequestFailure};
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::ui::conversation::composer::Composer;
use crate::ui::conversation::copied::CopiedMarker;
use crate::ui::conversation::suggestions;
use crate::ui::conversation::thread::{Message, Thread, ThreadEvent};

const INPUT_PLACEHOLDER: &str = "Enter a prompt...";

/// A request the caller must send to the backend exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub id: Uuid,
    pub input: String,
}

/// Owns the thread, the input buffer, the in-flight gate and the copied
/// badge. All mutation happens here, on the UI loop.
pub struct ConversationController {
    thread: Thread,
    composer: Composer,
    in_flight: Option<Uuid>,
    copied: CopiedMarker,
    suggestions: Vec<String>,
}

impl ConversationController {
    pub fn new(greeting: &str, suggestions: Vec<String>, copy_feedback: Duration) -> Self {
        Self {
            thread: Thread::with_greeting(greeting, Local::now()),
            composer: Composer::new(INPUT_PLACEHOLDER),
            in_flight: None,
            copied: CopiedMarker::new(copy_feedback),
            suggestions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.greeting,
            config.suggestions.clone(),
            config.copy_feedback(),
        )
    }

    /// Submit whatever is in the input buffer
    pub fn submit(&mut self) -> Option<OutboundRequest> {
        let text = self.composer.content().to_string();
        self.submit_text(text)
    }

    /// Accept `text` unless it is blank or a reply is still pending.
    ///
    /// On acceptance the user message and the loading placeholder are in the
    /// thread before this returns, the input buffer is cleared and the gate
    /// is closed until [`settle`](Self::settle) sees the returned id.
    pub fn submit_text(&mut self, text: String) -> Option<OutboundRequest> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring blank submit");
            return None;
        }
        if let Some(pending) = self.in_flight {
            tracing::debug!(%pending, "ignoring submit while a reply is pending");
            return None;
        }

        let event = ThreadEvent::SubmitStart {
            text: text.clone(),
            at: Local::now(),
        };
        if let Err(err) = self.thread.apply(event) {
            tracing::warn!(%err, "thread refused submit");
            return None;
        }

        let id = Uuid::new_v4();
        self.composer.clear();
        self.in_flight = Some(id);
        tracing::info!(request_id = %id, chars = text.chars().count(), "submit accepted");

        Some(OutboundRequest { id, input: text })
    }

    /// Fold the backend outcome for `request_id` into the thread and reopen
    /// the gate. Outcomes for any other id are ignored.
    pub fn settle(&mut self, request_id: Uuid, result: Result<ChatReply, RequestFailure>) -> bool {
        if self.in_flight != Some(request_id) {
            tracing::warn!(%request_id, "dropping reply for a request that is not in flight");
            return false;
        }

        let at = Local::now();
        let event = match result {
            Ok(reply) => {
                tracing::info!(%request_id, has_output = reply.output.is_some(), "reply received");
                ThreadEvent::ResponseSuccess {
                    output: reply.output,
                    at,
                }
            }
            Err(err) => {
                tracing::warn!(%request_id, error = %err, "request failed");
                ThreadEvent::ResponseFailure { at }
            }
        };

        if let Err(err) = self.thread.apply(event) {
            tracing::warn!(%request_id, %err, "thread refused reply");
        }
        self.in_flight = None;
        true
    }

    /// Copy message `index` to the clipboard and badge it for a moment
    pub fn copy_message(&mut self, index: usize, clipboard: &mut dyn Clipboard, now: Instant) -> bool {
        let Some(message) = self.thread.get(index) else {
            tracing::debug!(index, "copy of a message that does not exist");
            return false;
        };

        match clipboard.write_text(&message.content) {
            Ok(()) => {
                self.copied.mark(index, now);
                true
            }
            Err(err) => {
                tracing::warn!(index, %err, "clipboard write failed");
                false
            }
        }
    }

    /// Copy the newest settled agent reply
    pub fn copy_latest_reply(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> bool {
        match self.thread.last_agent_index() {
            Some(index) => self.copy_message(index, clipboard, now),
            None => false,
        }
    }

    /// Replace the input buffer with the prompt for `label`
    pub fn select_suggestion(&mut self, label: &str) {
        self.composer.set_content(suggestions::prompt_for(label));
    }

    /// Select the suggestion at `index` of the configured list
    pub fn select_suggestion_at(&mut self, index: usize) -> bool {
        match self.suggestions.get(index).cloned() {
            Some(label) => {
                self.select_suggestion(&label);
                true
            }
            None => false,
        }
    }

    /// Expire the copied badge. Returns true when the view changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.copied.sweep(now)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn messages(&self) -> &[Message] {
        self.thread.messages()
    }

    pub fn copied_index(&self, now: Instant) -> Option<usize> {
        self.copied.index(now)
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }
}

/// Perform the network half of a submit
pub async fn dispatch(
    backend: &dyn ChatBackend,
    request: OutboundRequest,
) -> (Uuid, Result<ChatReply, RequestFailure>) {
    let result = backend.send(&request.input).await;
    (request.id, result)
}

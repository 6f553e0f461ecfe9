use crate::llm::{Message, Role};
use serde::{Deserialize, Serialize};

/// Ordered, append-only sequence of turns for one workflow invocation.
/// Turns can be appended but never removed or reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a conversation from a copy of the caller's messages.
    pub fn from_messages(messages: &[Message]) -> Self {
        Self {
            messages: messages.to_vec(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages as a model sees them: the system prompt first, then every turn.
    pub fn with_system_prompt(&self, prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system(prompt));
        messages.extend(self.messages.iter().cloned());
        messages
    }

    /// True when every turn that requests tools is followed immediately by one
    /// result per requested call, in request order.
    pub fn tool_calls_paired(&self) -> bool {
        tool_calls_paired(&self.messages)
    }
}

pub(crate) fn tool_calls_paired(messages: &[Message]) -> bool {
    let mut i = 0;
    while i < messages.len() {
        let calls = messages[i].tool_calls();
        if calls.is_empty() {
            if messages[i].role == Role::Tool {
                // a result with no request in front of it
                return false;
            }
            i += 1;
            continue;
        }
        for (offset, call) in calls.iter().enumerate() {
            match messages.get(i + 1 + offset) {
                Some(result)
                    if result.role == Role::Tool
                        && result.tool_call_id.as_deref() == Some(call.id.as_str()) => {}
                _ => return false,
            }
        }
        i += 1 + calls.len();
    }
    true
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

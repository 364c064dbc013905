//! Conversation transcript for one agent run.
//!
//! The transcript is what gets resent to the model on every call, so its
//! shape must stay valid for tool-calling APIs: turns alternate starting with
//! `user`, and an assistant turn with tool calls is answered by a user turn
//! carrying exactly one result per call id, in call order.

use thiserror::Error;

use crate::llm::{ContentBlock, Message, Role};

/// Violations of the transcript shape.
#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    #[error("Expected a {expected} turn, got {actual}")]
    OutOfOrder {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Tool results {actual:?} do not answer tool calls {expected:?}")]
    UnmatchedToolResults {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Ordered, alternating conversation turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Starts a transcript with the initial user turn.
    pub fn new(first_user_turn: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(first_user_turn)],
        }
    }

    /// Appends a turn after checking alternation and tool-result correlation.
    pub fn push(&mut self, message: Message) -> Result<(), TranscriptError> {
        let expected = match self.messages.last() {
            None | Some(Message {
                role: Role::Assistant,
                ..
            }) => Role::User,
            Some(_) => Role::Assistant,
        };
        if message.role != expected {
            return Err(TranscriptError::OutOfOrder {
                expected: expected.as_str(),
                actual: message.role.as_str(),
            });
        }

        if message.role == Role::User {
            let calls: Vec<String> = self
                .messages
                .last()
                .map(|m| m.tool_use_ids().into_iter().map(String::from).collect())
                .unwrap_or_default();
            let results: Vec<String> = message
                .tool_result_ids()
                .into_iter()
                .map(String::from)
                .collect();
            if calls != results {
                return Err(TranscriptError::UnmatchedToolResults {
                    expected: calls,
                    actual: results,
                });
            }
        }

        self.messages.push(message);
        Ok(())
    }

    /// Appends the model's content blocks unchanged as an assistant turn.
    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) -> Result<(), TranscriptError> {
        self.push(Message::assistant_blocks(blocks))
    }

    /// Appends a user turn of tool results.
    pub fn push_tool_results(&mut self, results: Vec<ContentBlock>) -> Result<(), TranscriptError> {
        self.push(Message::user_blocks(results))
    }

    /// Appends a plain-text user turn.
    pub fn push_user_text(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        self.push(Message::user(text))
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
}

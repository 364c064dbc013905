//! Conversation content model shared by the gateway and the agent loop.
//!
//! Providers disagree on how tool calls are shaped on the wire: Anthropic
//! returns `tool_use` blocks with a structured `input`, OpenAI-compatible
//! APIs return `function` entries whose `arguments` is a JSON string, and
//! ad-hoc transports hand over plain mappings. Everything is normalized into
//! [`ContentBlock`] at the gateway boundary so the loop never branches on
//! representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LlmError;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One unit of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Free text.
    Text { text: String },
    /// A tool invocation requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// The answer to a tool invocation, correlated by `tool_use_id`.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool-use block.
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a successful tool-result block.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create a tool-result block flagged as an error.
    pub fn tool_error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: true,
        }
    }

    /// Returns `(id, name, input)` if this block is a tool call.
    pub fn as_tool_use(&self) -> Option<(&str, &str, &Value)> {
        match self {
            Self::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }

    /// Normalize a raw provider block into a [`ContentBlock`].
    ///
    /// Accepted shapes:
    /// - `{"type": "text", "text": ...}` or any mapping with a `text` string
    /// - `{"type": "tool_use" | "tool_call", "id", "name", "input" | "arguments"}`
    /// - `{"type": "function", "id", "function": {"name", "arguments"}}`
    /// - `{"type": "tool_result", "tool_use_id", "content", "is_error"?}`
    ///
    /// `arguments` may be a JSON object or a string holding JSON.
    pub fn normalize(raw: &Value) -> Result<Self, LlmError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| LlmError::UnsupportedBlock(format!("expected an object, got {}", raw)))?;

        let block_type = obj.get("type").and_then(Value::as_str);

        match block_type {
            Some("text") => Ok(Self::Text {
                text: required_str(obj, "text")?,
            }),
            None if obj.get("text").is_some_and(Value::is_string) => Ok(Self::Text {
                text: required_str(obj, "text")?,
            }),
            Some("tool_use") | Some("tool_call") => {
                let id = required_str(obj, "id")?;
                let name = required_str(obj, "name")?;
                let input = match obj.get("input").or_else(|| obj.get("arguments")) {
                    Some(args) => parse_arguments(args)?,
                    None => Value::Object(serde_json::Map::new()),
                };
                Ok(Self::ToolUse { id, name, input })
            }
            Some("function") => {
                let id = required_str(obj, "id")?;
                let function = obj
                    .get("function")
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        LlmError::UnsupportedBlock("function call without 'function' body".into())
                    })?;
                let name = required_str(function, "name")?;
                let input = match function.get("arguments") {
                    Some(args) => parse_arguments(args)?,
                    None => Value::Object(serde_json::Map::new()),
                };
                Ok(Self::ToolUse { id, name, input })
            }
            Some("tool_result") => {
                let tool_use_id = required_str(obj, "tool_use_id")?;
                let content = match obj.get("content") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Array(parts)) => parts
                        .iter()
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("\n"),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                let is_error = obj
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok(Self::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                })
            }
            other => Err(LlmError::UnsupportedBlock(format!(
                "unknown block type {:?}",
                other
            ))),
        }
    }
}

fn required_str(obj: &serde_json::Map<String, Value>, key: &str) -> Result<String, LlmError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::UnsupportedBlock(format!("missing string field '{}'", key)))
}

fn parse_arguments(args: &Value) -> Result<Value, LlmError> {
    match args {
        Value::String(s) if s.trim().is_empty() => Ok(Value::Object(serde_json::Map::new())),
        Value::String(s) => serde_json::from_str(s)
            .map_err(|e| LlmError::ParseError(format!("tool arguments are not valid JSON: {}", e))),
        other => Ok(other.clone()),
    }
}

/// Turn content: either plain text or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the turn.
    pub role: Role,
    /// Text or structured content.
    pub content: MessageContent,
}

impl Message {
    /// Create a plain-text user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a plain-text assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user turn made of blocks (typically tool results).
    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Create an assistant turn made of blocks.
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Blocks of this turn; plain text is exposed as a single text block.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match &self.content {
            MessageContent::Text(text) => vec![ContentBlock::text(text.clone())],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }

    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Ids of the tool calls in this turn, in order.
    pub fn tool_use_ids(&self) -> Vec<&str> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| b.as_tool_use().map(|(id, _, _)| id))
                .collect(),
        }
    }

    /// Correlation ids of the tool results in this turn, in order.
    pub fn tool_result_ids(&self) -> Vec<&str> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Token usage for one or more model calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Add another usage record to this running total.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A tool the model may call, as declared in the agent's tool schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the tool input.
    #[serde(alias = "parameters")]
    pub input_schema: Value,
}

/// How the model is allowed to respond with respect to tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides between text and tools.
    Auto,
    /// Model must call some tool.
    Any,
    /// Model must call exactly this tool.
    Tool { name: String },
}

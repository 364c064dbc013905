//! LiteLLM-compatible gateway client with native tool calling.
//!
//! Requests are sent to an OpenAI-compatible `/chat/completions` endpoint
//! (LiteLLM proxy, OpenRouter, ...). Transcript turns made of
//! [`ContentBlock`]s are translated into the chat format on the way out
//! (assistant `tool_calls`, `tool` role results) and responses are
//! normalized back into blocks on the way in.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

use super::content::{ContentBlock, Message, MessageContent, Role, TokenUsage, ToolChoice, ToolDefinition};
use crate::error::LlmError;

/// Default model used when neither the request nor the environment names one.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4.5";

/// Request for one model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier; empty means the client's default model.
    pub model: String,
    /// System prompt, sent ahead of the transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation transcript.
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Tools the model may call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    /// Tool-choice directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Opaque identifier forwarded to the provider for routing and attribution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_id: Option<String>,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
            tools: Vec::new(),
            tool_choice: None,
            routing_id: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn with_routing_id(mut self, routing_id: impl Into<String>) -> Self {
        self.routing_id = Some(routing_id.into());
        self
    }
}

/// Response from one model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Provider-assigned response id.
    pub id: String,
    /// Model that produced the response.
    pub model: String,
    /// Assistant content in provider order.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped (e.g. "stop", "tool_calls", "length").
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Token usage for this call.
    pub usage: TokenUsage,
}

impl GenerationResponse {
    /// Concatenated text content, if any.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Number of tool calls in the response.
    pub fn tool_call_count(&self) -> usize {
        self.content.iter().filter(|b| b.as_tool_use().is_some()).count()
    }
}

/// Trait for LLM providers that can answer a transcript.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for LiteLLM-compatible APIs.
pub struct LiteLlmClient {
    /// Base URL for the API.
    api_base: String,
    /// Optional API key for authentication.
    api_key: Option<String>,
    /// Default model to use for requests.
    default_model: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl LiteLlmClient {
    /// Create a new LiteLLM client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL for the LiteLLM API (e.g., "http://localhost:4000")
    /// * `api_key` - Optional API key for authentication
    /// * `default_model` - Default model to use when none is specified
    pub fn new(api_base: String, api_key: Option<String>, default_model: String) -> Self {
        Self {
            api_base,
            api_key,
            default_model,
            http_client: build_http_client(),
        }
    }

    /// Create a new client pre-configured for OpenRouter.
    pub fn new_with_defaults(api_key: String) -> Self {
        Self::new(
            "https://openrouter.ai/api/v1".to_string(),
            Some(api_key),
            DEFAULT_MODEL.to_string(),
        )
    }

    /// Create a new LiteLLM client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `LITELLM_API_BASE`: Base URL for the API (required)
    /// - `LITELLM_API_KEY`: API key for authentication (optional)
    /// - `LITELLM_DEFAULT_MODEL`: Default model
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiBase` if `LITELLM_API_BASE` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("LITELLM_API_BASE").map_err(|_| LlmError::MissingApiBase)?;
        let api_key = env::var("LITELLM_API_KEY").ok();
        let default_model =
            env::var("LITELLM_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_base, api_key, default_model))
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Check if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn build_http_client() -> Client {
    // Builder only fails on TLS backend initialization; fall back to defaults then.
    Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

/// Chat-format message.
#[derive(Debug, Serialize, PartialEq)]
struct ApiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn plain(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Translate the system prompt and transcript into chat-format messages.
fn to_api_messages(system: Option<&str>, messages: &[Message]) -> Vec<ApiMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);

    if let Some(system) = system {
        out.push(ApiMessage::plain("system", system.to_string()));
    }

    for message in messages {
        match (&message.role, &message.content) {
            (Role::User, MessageContent::Text(text)) => {
                out.push(ApiMessage::plain("user", text.clone()));
            }
            (Role::Assistant, MessageContent::Text(text)) => {
                out.push(ApiMessage::plain("assistant", text.clone()));
            }
            (Role::Assistant, MessageContent::Blocks(blocks)) => {
                let text = message.text();
                let tool_calls: Vec<Value> = blocks
                    .iter()
                    .filter_map(ContentBlock::as_tool_use)
                    .map(|(id, name, input)| {
                        json!({
                            "id": id,
                            "type": "function",
                            "function": {"name": name, "arguments": input.to_string()}
                        })
                    })
                    .collect();
                // An assistant message needs content or tool calls; an empty
                // reply goes out as empty text.
                let (content, tool_calls) = match (text.is_empty(), tool_calls.is_empty()) {
                    (_, true) => (Some(text), None),
                    (true, false) => (None, Some(tool_calls)),
                    (false, false) => (Some(text), Some(tool_calls)),
                };
                out.push(ApiMessage {
                    role: "assistant",
                    content,
                    tool_calls,
                    tool_call_id: None,
                });
            }
            (Role::User, MessageContent::Blocks(blocks)) => {
                // Tool results must directly follow the assistant turn that
                // requested them, so they go out before any user text.
                let mut texts = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => out.push(ApiMessage {
                            role: "tool",
                            content: Some(content.clone()),
                            tool_calls: None,
                            tool_call_id: Some(tool_use_id.clone()),
                        }),
                        ContentBlock::Text { text } => texts.push(text.as_str()),
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
                if !texts.is_empty() {
                    out.push(ApiMessage::plain("user", texts.join("\n")));
                }
            }
        }
    }

    out
}

fn to_api_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

fn to_api_tool_choice(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::Any => json!("required"),
        ToolChoice::Tool { name } => json!({"type": "function", "function": {"name": name}}),
    }
}

fn from_api_response(api_response: ApiResponse) -> Result<GenerationResponse, LlmError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ParseError("response contained no choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content.push(ContentBlock::text(text));
    }
    for raw in choice.message.tool_calls.unwrap_or_default() {
        content.push(ContentBlock::normalize(&raw)?);
    }

    let usage = api_response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(GenerationResponse {
        id: api_response.id,
        model: api_response.model,
        content,
        stop_reason: choice.finish_reason,
        usage,
    })
}

#[async_trait]
impl LlmProvider for LiteLlmClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let api_request = ApiRequest {
            model,
            messages: to_api_messages(request.system.as_deref(), &request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            tools: to_api_tools(&request.tools),
            tool_choice: request.tool_choice.as_ref().map(to_api_tool_choice),
            user: request.routing_id.clone(),
        };

        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://studio-forge.local")
            .header("X-Title", "studio-forge");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                if status_code == 429 {
                    return Err(LlmError::RateLimited(error_response.error.message));
                }

                return Err(LlmError::ApiError {
                    code: status_code,
                    message: error_response.error.message,
                });
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let response = from_api_response(api_response)?;

        tracing::debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            tool_calls = response.tool_call_count(),
            "LLM call completed"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new("gpt-4", vec![Message::user("test")])
            .with_system("sys")
            .with_temperature(0.7)
            .with_max_tokens(1000)
            .with_tool_choice(ToolChoice::Any)
            .with_routing_id("project-1");

        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.system.as_deref(), Some("sys"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.tool_choice, Some(ToolChoice::Any));
        assert_eq!(request.routing_id.as_deref(), Some("project-1"));
        assert!(request.tools.is_empty());
    }

    #[test]
    fn test_to_api_messages_tool_round() {
        let messages = vec![
            Message::user("write it"),
            Message::assistant_blocks(vec![
                ContentBlock::text("Planning first."),
                ContentBlock::tool_use("call_1", "plan", json!({"sections": 2})),
            ]),
            Message::user_blocks(vec![ContentBlock::tool_result("call_1", "Plan saved")]),
        ];

        let api = to_api_messages(Some("system prompt"), &messages);
        assert_eq!(api.len(), 4);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "user");
        assert_eq!(api[2].role, "assistant");
        assert_eq!(api[2].content.as_deref(), Some("Planning first."));

        let calls = api[2].tool_calls.as_ref().expect("assistant tool calls");
        assert_eq!(calls[0]["id"], "call_1");
        assert_eq!(calls[0]["function"]["name"], "plan");
        assert_eq!(calls[0]["function"]["arguments"], "{\"sections\":2}");

        assert_eq!(api[3].role, "tool");
        assert_eq!(api[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(api[3].content.as_deref(), Some("Plan saved"));
    }

    #[test]
    fn test_to_api_messages_tool_only_assistant_has_no_content() {
        let messages = vec![Message::assistant_blocks(vec![ContentBlock::tool_use(
            "c",
            "t",
            json!({}),
        )])];
        let api = to_api_messages(None, &messages);
        assert_eq!(api.len(), 1);
        assert!(api[0].content.is_none());
    }

    #[test]
    fn test_empty_assistant_reply_is_sent_as_empty_text() {
        let raw: ApiResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null}, "finish_reason": "length"}]
        }))
        .unwrap();
        let response = from_api_response(raw).unwrap();
        assert!(response.content.is_empty());

        let messages = vec![
            Message::user("Write the plan"),
            Message::assistant_blocks(response.content),
            Message::user("Please call a tool"),
        ];
        let api = to_api_messages(None, &messages);
        assert_eq!(api.len(), 3);

        let wire = serde_json::to_value(&api[1]).unwrap();
        assert_eq!(wire, json!({"role": "assistant", "content": ""}));
    }

    #[test]
    fn test_tool_choice_mapping() {
        assert_eq!(to_api_tool_choice(&ToolChoice::Auto), json!("auto"));
        assert_eq!(to_api_tool_choice(&ToolChoice::Any), json!("required"));
        assert_eq!(
            to_api_tool_choice(&ToolChoice::Tool {
                name: "layout".into()
            }),
            json!({"type": "function", "function": {"name": "layout"}})
        );
    }

    #[test]
    fn test_to_api_tools() {
        let tools = vec![ToolDefinition {
            name: "plan".into(),
            description: "Plan the document".into(),
            input_schema: json!({"type": "object"}),
        }];
        let api = to_api_tools(&tools);
        assert_eq!(api[0]["type"], "function");
        assert_eq!(api[0]["function"]["name"], "plan");
        assert_eq!(api[0]["function"]["parameters"], json!({"type": "object"}));
    }

    #[test]
    fn test_from_api_response_normalizes_tool_calls() {
        let raw: ApiResponse = serde_json::from_value(json!({
            "id": "resp-1",
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "write_marketing_section", "arguments": "{\"is_last_section\": true}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
        }))
        .unwrap();

        let response = from_api_response(raw).unwrap();
        assert_eq!(response.content.len(), 1);
        assert_eq!(response.tool_call_count(), 1);
        assert!(response.text().is_none());
        assert_eq!(response.usage, TokenUsage::new(120, 40));
        assert_eq!(response.stop_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn test_from_api_response_without_choices_fails() {
        let raw: ApiResponse =
            serde_json::from_value(json!({"id": "x", "model": "m", "choices": []})).unwrap();
        assert!(matches!(from_api_response(raw), Err(LlmError::ParseError(_))));
    }

    #[test]
    fn test_litellm_client_new() {
        let client = LiteLlmClient::new(
            "http://localhost:4000".to_string(),
            Some("test-key".to_string()),
            "gpt-4".to_string(),
        );

        assert_eq!(client.api_base(), "http://localhost:4000");
        assert_eq!(client.default_model(), "gpt-4");
        assert!(client.has_api_key());
    }

    #[test]
    fn test_litellm_client_new_with_defaults() {
        let client = LiteLlmClient::new_with_defaults("test-api-key".to_string());

        assert_eq!(client.api_base(), "https://openrouter.ai/api/v1");
        assert_eq!(client.default_model(), DEFAULT_MODEL);
        assert!(client.has_api_key());
    }

    #[tokio::test]
    async fn test_litellm_client_generate_connection_error() {
        let client = LiteLlmClient::new(
            "http://localhost:65535".to_string(),
            None,
            "gpt-4".to_string(),
        );

        let request = GenerationRequest::new("gpt-4", vec![Message::user("test")]);
        let result = client.generate(request).await;

        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }
}

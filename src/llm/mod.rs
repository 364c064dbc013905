//! Model call gateway for studio-forge.
//!
//! The agent loop only depends on the [`LlmProvider`] trait: send a
//! transcript, a system prompt, model parameters and a tool schema, get back
//! content blocks and token usage. [`LiteLlmClient`] is the bundled
//! implementation for OpenAI-compatible endpoints.
//!
//! ```ignore
//! use studio_forge::llm::{GenerationRequest, LiteLlmClient, LlmProvider, Message, ToolChoice};
//!
//! let client = LiteLlmClient::from_env()?;
//! let request = GenerationRequest::new("", vec![Message::user("Plan the document")])
//!     .with_tools(tools)
//!     .with_tool_choice(ToolChoice::Any);
//! let response = client.generate(request).await?;
//! for block in &response.content {
//!     if let Some((id, name, input)) = block.as_tool_use() {
//!         println!("{id}: {name}({input})");
//!     }
//! }
//! ```

pub mod content;
pub mod litellm;

pub use content::{
    ContentBlock, Message, MessageContent, Role, TokenUsage, ToolChoice, ToolDefinition,
};
pub use litellm::{
    GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, DEFAULT_MODEL,
};

//! Tool definitions and registry for the scaffold system.
//!
//! This module defines the `Tool` trait and the registry that dispatches the
//! model's tool calls by name. A handler either lets the loop continue with a
//! [`ToolResult`] fed back to the model, or finishes the run with a
//! [`RunResult`].

pub mod component;
pub mod document;

pub use component::{PlanComponentsTool, WriteComponentCodeTool};
pub use document::{DocumentProfile, PlanDocumentTool, WriteSectionTool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::result::RunResult;
use crate::error::{ArtifactError, StoreError};
use crate::llm::{ContentBlock, TokenUsage};

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model sent input that does not match the tool schema.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Job record read or write failed.
    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    /// Artifact file operation failed.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Handler output could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The job record a handler needs is missing.
    #[error("Job '{0}' not found")]
    JobMissing(String),
}

impl ToolError {
    /// Wraps a serde error from parsing tool input.
    pub fn invalid(err: serde_json::Error) -> Self {
        ToolError::InvalidParameters(err.to_string())
    }
}

/// Result of a non-terminal tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the handler accepted the call.
    pub success: bool,
    /// Message for the model on success.
    pub output: String,
    /// Message for the model on failure.
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed tool result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text the model sees in the correlated tool result.
    pub fn message(&self) -> &str {
        match (&self.error, self.success) {
            (Some(error), false) => error,
            _ => &self.output,
        }
    }

    /// Converts this result into a `tool_result` block answering `tool_use_id`.
    pub fn to_block(&self, tool_use_id: &str) -> ContentBlock {
        if self.success {
            ContentBlock::tool_result(tool_use_id, self.message())
        } else {
            ContentBlock::tool_error(tool_use_id, self.message())
        }
    }
}

/// What the loop does after a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Feed the result back to the model and keep going.
    Continue(ToolResult),
    /// Stop the run with this result.
    Finish(RunResult),
}

impl ToolOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolOutcome::Finish(_))
    }
}

/// Snapshot handed to a tool handler, built from the loop's own counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    pub project_id: String,
    pub job_id: String,
    pub source_id: String,
    /// Units the loop has counted so far in this run.
    pub units_completed: u32,
    /// Current iteration, 1-based.
    pub iteration: u32,
    /// Token totals up to and including the current model call.
    pub usage: TokenUsage,
}

impl ExecutionContext {
    /// Create a context at the start of a run.
    pub fn new(
        project_id: impl Into<String>,
        job_id: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            job_id: job_id.into(),
            source_id: source_id.into(),
            units_completed: 0,
            iteration: 0,
            usage: TokenUsage::default(),
        }
    }

    /// Set the loop counters.
    pub fn with_progress(mut self, units_completed: u32, iteration: u32, usage: TokenUsage) -> Self {
        self.units_completed = units_completed;
        self.iteration = iteration;
        self.usage = usage;
        self
    }

    /// Number the next unit gets. Model-claimed numbers are never used.
    pub fn next_unit(&self) -> u32 {
        self.units_completed + 1
    }
}

/// Trait for tools that can be executed by the agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of the tool, as declared in the tool schema.
    fn name(&self) -> &str;

    /// Whether an accepted call to this tool completes one unit of work.
    fn produces_unit(&self) -> bool {
        false
    }

    /// Execute the tool with the given input and context.
    ///
    /// `Err` is reserved for recoverable problems (bad input, a failed plan
    /// write) and is fed back to the model; handlers that must end the run
    /// on failure return [`ToolOutcome::Finish`] themselves.
    async fn execute(&self, input: Value, ctx: &ExecutionContext)
        -> Result<ToolOutcome, ToolError>;
}

/// Registry for managing available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool in the registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names, sorted.
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Whether `name` is registered and produces units.
    pub fn is_unit_tool(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|t| t.produces_unit())
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a tool call.
    ///
    /// Never fails: unknown tools and handler errors become non-terminal
    /// failures naming the tool, so the model can correct itself.
    pub async fn execute(&self, name: &str, input: Value, ctx: &ExecutionContext) -> ToolOutcome {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, job_id = %ctx.job_id, "Unknown tool requested");
            return ToolOutcome::Continue(ToolResult::failure(format!("Unknown tool: {}", name)));
        };

        match tool.execute(input, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(tool = name, job_id = %ctx.job_id, error = %e, "Tool call failed");
                ToolOutcome::Continue(ToolResult::failure(format!(
                    "Error executing {}: {}",
                    name, e
                )))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn produces_unit(&self) -> bool {
            true
        }

        async fn execute(
            &self,
            input: Value,
            _ctx: &ExecutionContext,
        ) -> Result<ToolOutcome, ToolError> {
            match input.get("text").and_then(Value::as_str) {
                Some(text) => Ok(ToolOutcome::Continue(ToolResult::success(text))),
                None => Err(ToolError::InvalidParameters("missing text".into())),
            }
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("proj", "job", "src")
    }

    #[test]
    fn test_tool_result_message() {
        assert_eq!(ToolResult::success("done").message(), "done");
        assert_eq!(ToolResult::failure("bad").message(), "bad");

        let block = ToolResult::failure("bad").to_block("call_1");
        assert_eq!(block, ContentBlock::tool_error("call_1", "bad"));
    }

    #[test]
    fn test_execution_context_next_unit() {
        let ctx = ctx().with_progress(2, 5, TokenUsage::new(10, 20));
        assert_eq!(ctx.next_unit(), 3);
        assert_eq!(ctx.iteration, 5);
        assert_eq!(ctx.usage.total(), 30);
    }

    #[tokio::test]
    async fn test_unknown_tool_continues() {
        let registry = ToolRegistry::new();
        let outcome = registry.execute("frobnicate", json!({}), &ctx()).await;
        assert_eq!(
            outcome,
            ToolOutcome::Continue(ToolResult::failure("Unknown tool: frobnicate"))
        );
        assert!(!outcome.is_terminal());
    }

    #[tokio::test]
    async fn test_handler_error_is_fed_back() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let outcome = registry.execute("echo", json!({}), &ctx()).await;
        match outcome {
            ToolOutcome::Continue(result) => {
                assert!(!result.success);
                assert!(result.message().contains("echo"));
                assert!(result.message().contains("missing text"));
            }
            other => panic!("expected Continue, got {:?}", other),
        }

        let outcome = registry.execute("echo", json!({"text": "hi"}), &ctx()).await;
        assert_eq!(outcome, ToolOutcome::Continue(ToolResult::success("hi")));
    }

    #[test]
    fn test_registry_listing() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list_tools(), vec!["echo"]);
        assert!(registry.is_unit_tool("echo"));
        assert!(!registry.is_unit_tool("missing"));
    }
}

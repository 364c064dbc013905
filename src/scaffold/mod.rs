//! Scaffold system for agent execution.
//!
//! The scaffold provides tools to the LLM and manages the agent loop:
//! 1. Send the transcript and tool schema to the model
//! 2. Append the assistant turn unchanged
//! 3. Dispatch each tool call through the [`ToolRegistry`]
//! 4. Feed results back as the next user turn
//! 5. Stop on a terminal tool outcome or when the budget runs out
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use studio_forge::scaffold::{AgentKind, AgentLoop, AgentServices};
//!
//! let agent = AgentLoop::new(AgentKind::MarketingStrategy, services);
//! let result = agent.run("project-1", "job-1", "source-1", "").await?;
//! ```

pub mod agent_loop;
pub mod profile;
pub mod result;
pub mod tools;
pub mod transcript;

pub use agent_loop::{AgentError, AgentLoop, AgentServices, MAX_ITERATIONS, SOURCE_CHAR_BUDGET};
pub use profile::AgentKind;
pub use result::{ComponentArtifact, RunOutput, RunResult};
pub use tools::{
    DocumentProfile, ExecutionContext, Tool, ToolError, ToolOutcome, ToolRegistry, ToolResult,
};
pub use transcript::{Transcript, TranscriptError};

//! Execution trace types.
//!
//! An execution trace archives one agent run for offline inspection: the
//! full transcript exactly as sent to the model, the final result, and
//! enough metadata to find the job it belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{Message, TokenUsage};
use crate::scaffold::RunResult;

/// Identifiers and counters recorded alongside a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    pub project_id: String,
    pub job_id: String,
    pub source_id: String,
    /// Model calls made.
    pub iterations: u32,
    /// Units counted by the loop.
    pub units_completed: u32,
    pub usage: TokenUsage,
}

/// A complete archived agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Unique identifier for this execution.
    pub execution_id: Uuid,

    /// Agent that ran (e.g. "marketing_strategy_agent").
    pub agent_name: String,

    /// Short human-readable label of the task.
    pub task: String,

    /// Model the run was configured with.
    pub model: String,

    /// Transcript in turn order.
    pub messages: Vec<Message>,

    pub result: RunResult,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    pub metadata: TraceMetadata,
}

impl ExecutionTrace {
    /// Wall-clock duration of the run in seconds.
    pub fn duration_seconds(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds()
    }

    /// Number of model turns in the transcript.
    pub fn assistant_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == crate::llm::Role::Assistant)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_duration_and_turns() {
        let started_at = Utc::now();
        let trace = ExecutionTrace {
            execution_id: Uuid::new_v4(),
            agent_name: "component_agent".into(),
            task: "Components for source abc".into(),
            model: "test-model".into(),
            messages: vec![Message::user("go"), Message::assistant("ok")],
            result: RunResult::failure("job", "stopped", 1, 0, TokenUsage::default()),
            started_at,
            completed_at: started_at + Duration::seconds(42),
            metadata: TraceMetadata {
                project_id: "p".into(),
                job_id: "job".into(),
                source_id: "s".into(),
                iterations: 1,
                units_completed: 0,
                usage: TokenUsage::default(),
            },
        };
        assert_eq!(trace.duration_seconds(), 42);
        assert_eq!(trace.assistant_turns(), 1);
    }
}

//! Agent execution loop for the scaffold system.
//!
//! One run drives one job through a bounded multi-turn conversation:
//! 1. Mark the job `processing`
//! 2. Fetch the source and render the first user turn
//! 3. Call the model with the full transcript and the tool schema
//! 4. Dispatch every tool call through the registry
//! 5. Feed results back, or stop on a terminal outcome
//! 6. Fail the job once the iteration budget is spent
//!
//! Unit numbering is owned by the loop. Handlers receive the count of units
//! accepted so far in their [`ExecutionContext`] and never trust indices
//! claimed by the model.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::profile::AgentKind;
use super::result::RunResult;
use super::tools::{ExecutionContext, ToolOutcome, ToolRegistry};
use super::transcript::{Transcript, TranscriptError};
use crate::config::{AgentConfig, PromptLoader};
use crate::error::{ConfigError, LlmError, SourceError, StoreError};
use crate::jobs::{JobStatus, JobStore, JobUpdate};
use crate::llm::{GenerationRequest, LlmProvider, TokenUsage, ToolChoice, ToolDefinition};
use crate::metrics::MetricsCollector;
use crate::source::SourceFetcher;
use crate::storage::ArtifactStore;
use crate::trajectory::{ExecutionTrace, TraceMetadata, TraceStorage};
use crate::utils::short_id;

/// Model calls allowed per run.
pub const MAX_ITERATIONS: u32 = 10;

/// Characters of source content placed in the first user turn.
pub const SOURCE_CHAR_BUDGET: usize = 15_000;

/// User turn sent when the model answers without calling a tool.
const TOOL_NUDGE: &str =
    "Please continue by calling one of the available tools. Do not reply with plain text.";

/// Errors that abort a run without a result.
///
/// The job record is left as it was (normally `processing`) and no trace is
/// written; callers decide how to surface the failure.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),
}

/// Collaborators shared by every run.
#[derive(Clone)]
pub struct AgentServices {
    pub llm: Arc<dyn LlmProvider>,
    pub jobs: Arc<dyn JobStore>,
    pub sources: Arc<dyn SourceFetcher>,
    pub artifacts: Arc<ArtifactStore>,
    pub traces: Arc<TraceStorage>,
    pub prompts: PromptLoader,
}

/// Prompt configuration and tool schema, loaded once per loop.
#[derive(Debug, Clone)]
struct AgentSettings {
    config: AgentConfig,
    tools: Vec<ToolDefinition>,
}

/// Transcript and start time of one run, archived in its trace.
struct RunState {
    started_at: DateTime<Utc>,
    transcript: Transcript,
}

/// Main agent execution loop.
pub struct AgentLoop {
    kind: AgentKind,
    services: AgentServices,
    registry: ToolRegistry,
    settings: OnceCell<AgentSettings>,
    max_iterations: u32,
    metrics: MetricsCollector,
}

impl AgentLoop {
    /// Create a loop for `kind` with its standard tool handlers.
    pub fn new(kind: AgentKind, services: AgentServices) -> Self {
        let registry =
            kind.build_registry(Arc::clone(&services.jobs), Arc::clone(&services.artifacts));
        Self {
            kind,
            services,
            registry,
            settings: OnceCell::new(),
            max_iterations: MAX_ITERATIONS,
            metrics: MetricsCollector::new(),
        }
    }

    /// Replace the tool dispatch table.
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the model-call budget.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn settings(&self) -> Result<&AgentSettings, ConfigError> {
        self.settings
            .get_or_try_init(|| async {
                let agent = self.kind.agent_name();
                let config = self.services.prompts.load_agent_config(agent)?;
                let tools = self.services.prompts.load_tools(agent)?;
                for tool in &tools {
                    if self.registry.get(&tool.name).is_none() {
                        warn!(agent, tool = %tool.name, "Configured tool has no handler");
                    }
                }
                debug!(agent, tools = tools.len(), "Loaded agent settings");
                Ok::<_, ConfigError>(AgentSettings { config, tools })
            })
            .await
    }

    /// Move the job to `processing` before any model call.
    ///
    /// Returns the start timestamp recorded on the job; the execution trace
    /// reuses it.
    async fn mark_processing(
        &self,
        project_id: &str,
        job_id: &str,
    ) -> Result<DateTime<Utc>, AgentError> {
        let started_at = Utc::now();
        self.services
            .jobs
            .update(
                project_id,
                job_id,
                JobUpdate::new()
                    .status(JobStatus::Processing)
                    .status_message(format!(
                        "Starting {} generation...",
                        self.kind.task_label()
                    ))
                    .started_at(started_at),
            )
            .await?;
        Ok(started_at)
    }

    /// Run the agent to completion for one job.
    ///
    /// Returns `Ok` for every handled exit (terminal tool outcome or
    /// exhausted budget), with the job record already moved to `ready` or
    /// `error`.
    pub async fn run(
        &self,
        project_id: &str,
        job_id: &str,
        source_id: &str,
        direction: &str,
    ) -> Result<RunResult, AgentError> {
        let started_at = self.mark_processing(project_id, job_id).await?;
        self.execute(project_id, job_id, source_id, direction, started_at)
            .await
    }

    /// Mark the job `processing`, then run the loop on a background task.
    ///
    /// A status poll made after this returns observes `processing`.
    pub async fn start(
        self: Arc<Self>,
        project_id: impl Into<String>,
        job_id: impl Into<String>,
        source_id: impl Into<String>,
        direction: impl Into<String>,
    ) -> Result<JoinHandle<Result<RunResult, AgentError>>, AgentError> {
        let project_id = project_id.into();
        let job_id = job_id.into();
        let source_id = source_id.into();
        let direction = direction.into();

        let started_at = self.mark_processing(&project_id, &job_id).await?;
        info!(agent = %self.kind, job_id = %job_id, "Agent run started in background");

        Ok(tokio::spawn(async move {
            self.execute(&project_id, &job_id, &source_id, &direction, started_at)
                .await
        }))
    }

    async fn execute(
        &self,
        project_id: &str,
        job_id: &str,
        source_id: &str,
        direction: &str,
        started_at: DateTime<Utc>,
    ) -> Result<RunResult, AgentError> {
        let agent = self.kind.agent_name();
        self.metrics.run_started();

        let outcome = self
            .run_loop(project_id, job_id, source_id, direction, started_at)
            .await;
        match &outcome {
            Ok(result) => {
                let label = if result.success { "success" } else { "failure" };
                self.metrics.record_run(agent, label, result.iterations);
            }
            Err(e) => {
                warn!(agent, job_id, error = %e, "Agent run aborted");
                self.metrics.record_run(agent, "error", 0);
            }
        }
        outcome
    }

    async fn run_loop(
        &self,
        project_id: &str,
        job_id: &str,
        source_id: &str,
        direction: &str,
        started_at: DateTime<Utc>,
    ) -> Result<RunResult, AgentError> {
        let agent = self.kind.agent_name();
        let settings = self.settings().await?;
        let config = &settings.config;
        let model_label = if config.model.is_empty() {
            "default"
        } else {
            config.model.as_str()
        };

        let source = self
            .services
            .sources
            .fetch(project_id, source_id, SOURCE_CHAR_BUDGET)
            .await?;
        let first_turn = config.render_user_message(&source, direction)?;

        let mut state = RunState {
            started_at,
            transcript: Transcript::new(first_turn),
        };
        let base_ctx = ExecutionContext::new(project_id, job_id, source_id);
        let mut usage = TokenUsage::default();
        let mut units_completed = 0u32;

        info!(
            agent,
            job_id,
            source_id,
            source_chars = source.chars().count(),
            "Agent loop starting"
        );

        for iteration in 1..=self.max_iterations {
            info!(agent, job_id, iteration, units_completed, "Calling model");

            let request =
                GenerationRequest::new(config.model.clone(), state.transcript.messages().to_vec())
                    .with_system(config.system_prompt.clone())
                    .with_temperature(config.temperature)
                    .with_max_tokens(config.max_tokens)
                    .with_tools(settings.tools.clone())
                    .with_tool_choice(ToolChoice::Any)
                    .with_routing_id(project_id);

            let call_started = Instant::now();
            let response = match self.services.llm.generate(request).await {
                Ok(response) => {
                    self.metrics.record_llm_request(
                        model_label,
                        true,
                        call_started.elapsed().as_secs_f64(),
                        response.usage,
                    );
                    response
                }
                Err(e) => {
                    self.metrics.record_llm_request(
                        model_label,
                        false,
                        call_started.elapsed().as_secs_f64(),
                        TokenUsage::default(),
                    );
                    return Err(e.into());
                }
            };
            usage.add(response.usage);

            let calls: Vec<(String, String, serde_json::Value)> = response
                .content
                .iter()
                .filter_map(|block| block.as_tool_use())
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();
            state.transcript.push_assistant(response.content)?;

            if calls.is_empty() {
                warn!(agent, job_id, iteration, "Model answered without a tool call");
                state.transcript.push_user_text(TOOL_NUDGE)?;
                continue;
            }

            let mut results = Vec::with_capacity(calls.len());
            for (call_id, name, input) in calls {
                let ctx = base_ctx
                    .clone()
                    .with_progress(units_completed, iteration, usage);
                debug!(agent, job_id, iteration, tool = %name, "Dispatching tool call");

                match self.registry.execute(&name, input, &ctx).await {
                    ToolOutcome::Finish(result) => {
                        self.metrics.record_tool_call(&name, result.success);
                        info!(
                            agent,
                            job_id,
                            iteration,
                            tool = %name,
                            success = result.success,
                            units = result.units_completed,
                            "Agent run finished"
                        );
                        self.save_trace(settings, &base_ctx, state, &result).await;
                        return Ok(result);
                    }
                    ToolOutcome::Continue(result) => {
                        self.metrics.record_tool_call(&name, result.success);
                        if result.success && self.registry.is_unit_tool(&name) {
                            units_completed += 1;
                        }
                        results.push(result.to_block(&call_id));
                    }
                }
            }
            state.transcript.push_tool_results(results)?;
        }

        let message = format!("Agent reached maximum iterations ({})", self.max_iterations);
        warn!(agent, job_id, units_completed, "{}", message);

        self.services
            .jobs
            .update(
                project_id,
                job_id,
                JobUpdate::new()
                    .status(JobStatus::Error)
                    .error_message(message.clone())
                    .iterations(self.max_iterations)
                    .tokens(usage.input_tokens, usage.output_tokens)
                    .completed_at(Utc::now()),
            )
            .await?;

        let result = RunResult::failure(
            job_id,
            message,
            self.max_iterations,
            units_completed,
            usage,
        );
        self.save_trace(settings, &base_ctx, state, &result).await;
        Ok(result)
    }

    /// Archive the run. Failures are logged, never propagated.
    async fn save_trace(
        &self,
        settings: &AgentSettings,
        ctx: &ExecutionContext,
        state: RunState,
        result: &RunResult,
    ) {
        let trace = ExecutionTrace {
            execution_id: Uuid::new_v4(),
            agent_name: self.kind.agent_name().to_string(),
            task: format!(
                "{} generation for job {}",
                self.kind.task_label(),
                short_id(&ctx.job_id)
            ),
            model: settings.config.model.clone(),
            messages: state.transcript.into_messages(),
            result: result.clone(),
            started_at: state.started_at,
            completed_at: Utc::now(),
            metadata: TraceMetadata {
                project_id: ctx.project_id.clone(),
                job_id: ctx.job_id.clone(),
                source_id: ctx.source_id.clone(),
                iterations: result.iterations,
                units_completed: result.units_completed,
                usage: result.usage,
            },
        };

        match self.services.traces.save(&trace).await {
            Ok(path) => debug!(path = %path.display(), "Saved execution trace"),
            Err(e) => warn!(job_id = %ctx.job_id, error = %e, "Failed to save execution trace"),
        }
    }
}

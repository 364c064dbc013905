//! Component generation tools.
//!
//! The component agent plans a set of UI variations, then writes all of them
//! in a single terminal call. Each variation is saved as a standalone HTML
//! file under `studio/components/<job_id>/`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{ExecutionContext, Tool, ToolError, ToolOutcome, ToolResult};
use crate::jobs::{JobStatus, JobStore, JobUpdate};
use crate::scaffold::result::{ComponentArtifact, RunOutput, RunResult};
use crate::storage::ArtifactStore;
use crate::utils::safe_file_stem;

pub const PLAN_COMPONENTS: &str = "plan_components";
pub const WRITE_COMPONENT_CODE: &str = "write_component_code";

const COLLECTION: &str = "components";

fn default_category() -> String {
    "other".to_string()
}

#[derive(Debug, Deserialize)]
struct PlanInput {
    #[serde(default = "default_category")]
    component_category: String,
    #[serde(default)]
    component_description: String,
    #[serde(default)]
    variations: Vec<Value>,
    #[serde(default)]
    technical_notes: Option<String>,
}

/// Saves the component plan into the job record.
pub struct PlanComponentsTool {
    jobs: Arc<dyn JobStore>,
}

impl PlanComponentsTool {
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl Tool for PlanComponentsTool {
    fn name(&self) -> &str {
        PLAN_COMPONENTS
    }

    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, ToolError> {
        let plan: PlanInput = serde_json::from_value(input).map_err(ToolError::invalid)?;
        let count = plan.variations.len();
        let names: Vec<String> = plan
            .variations
            .iter()
            .map(|v| {
                v.get("variation_name")
                    .and_then(Value::as_str)
                    .unwrap_or("Unnamed")
                    .to_string()
            })
            .collect();

        info!(
            job_id = %ctx.job_id,
            category = %plan.component_category,
            variations = count,
            "Planning components"
        );

        self.jobs
            .update(
                &ctx.project_id,
                &ctx.job_id,
                JobUpdate::new()
                    .title(plan.component_category.clone())
                    .planned_items(plan.variations)
                    .total_items(count as u32)
                    .status_message(format!(
                        "Planned {} variations, generating code...",
                        count
                    ))
                    .detail("component_category", plan.component_category.clone())
                    .detail("component_description", plan.component_description)
                    .detail("technical_notes", plan.technical_notes),
            )
            .await?;

        Ok(ToolOutcome::Continue(ToolResult::success(format!(
            "Component plan saved successfully. Category: {}, Variations: {}",
            plan.component_category,
            names.join(", ")
        ))))
    }
}

#[derive(Debug, Deserialize)]
struct ComponentInput {
    #[serde(default)]
    variation_name: Option<String>,
    #[serde(default)]
    html_code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WriteInput {
    components: Vec<ComponentInput>,
    #[serde(default)]
    usage_notes: String,
}

/// Writes every component file and finishes the run.
pub struct WriteComponentCodeTool {
    jobs: Arc<dyn JobStore>,
    artifacts: Arc<ArtifactStore>,
}

impl WriteComponentCodeTool {
    pub fn new(jobs: Arc<dyn JobStore>, artifacts: Arc<ArtifactStore>) -> Self {
        Self { jobs, artifacts }
    }

    fn preview_url(project_id: &str, job_id: &str, file: &str) -> String {
        format!(
            "/api/v1/projects/{}/studio/{}/{}/preview/{}",
            project_id, COLLECTION, job_id, file
        )
    }

    async fn write_all(
        &self,
        ctx: &ExecutionContext,
        input: WriteInput,
    ) -> Result<RunResult, ToolError> {
        let dir = self
            .artifacts
            .job_dir(&ctx.project_id, COLLECTION, &ctx.job_id)?;
        self.artifacts.ensure_dir(&dir).await?;

        let mut used = HashSet::new();
        let mut saved = Vec::with_capacity(input.components.len());
        for (idx, component) in input.components.into_iter().enumerate() {
            let name = component
                .variation_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Variation {}", idx + 1));

            let stem = safe_file_stem(&name, &format!("variation_{}", idx + 1));
            let mut file = format!("{}.html", stem);
            let mut suffix = 2;
            while !used.insert(file.clone()) {
                file = format!("{}_{}.html", stem, suffix);
                suffix += 1;
            }

            self.artifacts
                .write_file(&dir, &file, &component.html_code)
                .await?;
            info!(job_id = %ctx.job_id, file = %file, "Saved component");

            saved.push(ComponentArtifact {
                preview_url: Self::preview_url(&ctx.project_id, &ctx.job_id, &file),
                char_count: component.html_code.chars().count(),
                name,
                description: component.description,
                file,
            });
        }

        let job = self.jobs.get(&ctx.project_id, &ctx.job_id).await?;
        let detail = |key: &str| {
            job.as_ref()
                .and_then(|j| j.detail(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let category = detail("component_category").unwrap_or_else(|| "component".to_string());
        let description = detail("component_description").unwrap_or_default();

        let written = saved.len() as u32;
        let components_json = serde_json::to_value(&saved)?;
        self.jobs
            .update(
                &ctx.project_id,
                &ctx.job_id,
                JobUpdate::new()
                    .status(JobStatus::Ready)
                    .status_message("Components generated successfully!")
                    .items_written(written)
                    .iterations(ctx.iteration)
                    .tokens(ctx.usage.input_tokens, ctx.usage.output_tokens)
                    .completed_at(Utc::now())
                    .detail("components", components_json)
                    .detail("usage_notes", input.usage_notes.clone()),
            )
            .await?;

        Ok(RunResult::success(
            ctx.job_id.clone(),
            RunOutput::Components {
                category,
                description,
                components: saved,
                usage_notes: input.usage_notes,
            },
            ctx.iteration,
            written,
            ctx.usage,
        ))
    }
}

#[async_trait]
impl Tool for WriteComponentCodeTool {
    fn name(&self) -> &str {
        WRITE_COMPONENT_CODE
    }

    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, ToolError> {
        let input: WriteInput = serde_json::from_value(input).map_err(ToolError::invalid)?;
        info!(
            job_id = %ctx.job_id,
            components = input.components.len(),
            "Writing component code"
        );

        match self.write_all(ctx, input).await {
            Ok(result) => Ok(ToolOutcome::Finish(result)),
            Err(e) => {
                let message = format!("Error writing component code: {}", e);
                error!(job_id = %ctx.job_id, error = %message, "Component write failed");

                let update = JobUpdate::new()
                    .status(JobStatus::Error)
                    .error_message(message.clone())
                    .status_message(message.clone())
                    .completed_at(Utc::now());
                if let Err(e) = self.jobs.update(&ctx.project_id, &ctx.job_id, update).await {
                    warn!(job_id = %ctx.job_id, error = %e, "Failed to mark job as errored");
                }

                Ok(ToolOutcome::Finish(RunResult::failure(
                    ctx.job_id.clone(),
                    message,
                    ctx.iteration,
                    ctx.units_completed,
                    ctx.usage,
                )))
            }
        }
    }
}

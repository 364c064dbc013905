//! Plan-then-write document tools.
//!
//! A document agent first saves a plan (title, ordered sections, notes), then
//! writes the document one section per tool call. The section number and the
//! create-vs-append decision come from the loop's own unit counter; whatever
//! the model claims is only logged.
//!
//! A [`DocumentProfile`] names the tools, storage collection, routes and
//! labels of one document generator, so every plan-then-write document agent
//! shares these handlers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::{ExecutionContext, Tool, ToolError, ToolOutcome, ToolResult};
use crate::jobs::{JobStatus, JobStore, JobUpdate};
use crate::scaffold::result::{RunOutput, RunResult};
use crate::storage::ArtifactStore;

const DOCUMENT_EXTENSION: &str = "md";

/// Naming and routing of one document generator.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProfile {
    /// Name of the planning tool.
    pub plan_tool: String,
    /// Name of the section-writing tool.
    pub write_tool: String,
    /// Artifact collection under the project's studio directory.
    pub collection: String,
    /// URL path segment for preview and download routes.
    pub route: String,
    /// Title used when neither the plan nor the job record has one.
    pub default_title: String,
    /// Plan field naming what the document is about, stored as a job detail.
    pub subject_field: String,
    /// Display label of the subject field.
    pub subject_label: String,
    pub default_subject: String,
    /// Further optional plan fields copied into the job details.
    pub extra_fields: Vec<String>,
    /// Display name of the document kind, e.g. "Marketing strategy".
    pub label: String,
}

impl DocumentProfile {
    /// The marketing strategy document generator.
    pub fn marketing_strategy() -> Self {
        Self {
            plan_tool: "plan_marketing_strategy".to_string(),
            write_tool: "write_marketing_section".to_string(),
            collection: "marketing_strategies".to_string(),
            route: "marketing-strategies".to_string(),
            default_title: "Marketing Strategy Document".to_string(),
            subject_field: "product_name".to_string(),
            subject_label: "Product".to_string(),
            default_subject: "Unknown Product".to_string(),
            extra_fields: vec!["target_market".to_string()],
            label: "Marketing strategy".to_string(),
        }
    }

    /// File name of a job's document.
    pub fn file_name(&self, job_id: &str) -> String {
        format!("{}.{}", job_id, DOCUMENT_EXTENSION)
    }

    pub fn preview_url(&self, project_id: &str, job_id: &str) -> String {
        format!(
            "/api/v1/projects/{}/studio/{}/{}/preview",
            project_id, self.route, job_id
        )
    }

    pub fn download_url(&self, project_id: &str, job_id: &str) -> String {
        format!(
            "/api/v1/projects/{}/studio/{}/{}/download",
            project_id, self.route, job_id
        )
    }
}

#[derive(Debug, Deserialize)]
struct PlanInput {
    #[serde(default)]
    document_title: Option<String>,
    #[serde(default)]
    sections: Vec<Value>,
    #[serde(default)]
    planning_notes: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Display title of a planned section: either a bare string or an object
/// with `section_title` (or `title`).
fn section_title(section: &Value, position: usize) -> String {
    match section {
        Value::String(title) => title.clone(),
        Value::Object(fields) => fields
            .get("section_title")
            .or_else(|| fields.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Section {}", position)),
        _ => format!("Section {}", position),
    }
}

/// Saves the document plan into the job record.
pub struct PlanDocumentTool {
    profile: DocumentProfile,
    jobs: Arc<dyn JobStore>,
}

impl PlanDocumentTool {
    pub fn new(profile: DocumentProfile, jobs: Arc<dyn JobStore>) -> Self {
        Self { profile, jobs }
    }
}

#[async_trait]
impl Tool for PlanDocumentTool {
    fn name(&self) -> &str {
        &self.profile.plan_tool
    }

    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, ToolError> {
        let plan: PlanInput = serde_json::from_value(input).map_err(ToolError::invalid)?;
        let profile = &self.profile;

        let title = plan
            .document_title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| profile.default_title.clone());
        let subject = plan
            .extra
            .get(&profile.subject_field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(profile.default_subject.as_str())
            .to_string();
        let count = plan.sections.len();
        let titles: Vec<String> = plan
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| section_title(s, i + 1))
            .collect();

        info!(
            job_id = %ctx.job_id,
            title = %title,
            sections = count,
            "Planning document"
        );

        let mut update = JobUpdate::new()
            .title(title.clone())
            .planned_items(plan.sections)
            .total_items(count as u32)
            .status_message(format!(
                "Planned {} sections, starting to write...",
                count
            ))
            .detail(profile.subject_field.clone(), subject.clone())
            .detail("planning_notes", plan.planning_notes);
        for field in &profile.extra_fields {
            let value = plan.extra.get(field).cloned().unwrap_or(Value::Null);
            update = update.detail(field.clone(), value);
        }
        self.jobs.update(&ctx.project_id, &ctx.job_id, update).await?;

        let outline = titles
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t))
            .collect::<Vec<_>>()
            .join("; ");

        Ok(ToolOutcome::Continue(ToolResult::success(format!(
            "{} plan saved successfully. Document: '{}', {}: '{}', Sections planned: {} ({}). \
             Now proceed to write each section using the {} tool.",
            profile.label,
            title,
            profile.subject_label,
            subject,
            count,
            outline,
            profile.write_tool
        ))))
    }
}

#[derive(Debug, Deserialize)]
struct SectionInput {
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    section_number: Option<Value>,
    #[serde(default)]
    section_title: String,
    markdown_content: String,
    #[serde(default)]
    is_last_section: bool,
}

impl SectionInput {
    /// The section number the model claims, if it sent a usable one.
    fn claimed_number(&self) -> Option<u64> {
        match self.section_number.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// How a section lands in the document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    /// Create or overwrite the file with a header.
    Write,
    /// Append to the existing file.
    Append,
}

impl WriteOperation {
    /// The first unit of a run creates the file; every later unit appends.
    pub fn for_unit(number: u32) -> Self {
        if number <= 1 {
            WriteOperation::Write
        } else {
            WriteOperation::Append
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOperation::Write => "write",
            WriteOperation::Append => "append",
        }
    }
}

/// Writes one section and finalizes the job on the last one.
pub struct WriteSectionTool {
    profile: DocumentProfile,
    jobs: Arc<dyn JobStore>,
    artifacts: Arc<ArtifactStore>,
}

impl WriteSectionTool {
    pub fn new(
        profile: DocumentProfile,
        jobs: Arc<dyn JobStore>,
        artifacts: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            profile,
            jobs,
            artifacts,
        }
    }

    /// Writes the section and records progress. Returns the planned total.
    async fn write_section(
        &self,
        ctx: &ExecutionContext,
        number: u32,
        input: &SectionInput,
    ) -> Result<u32, ToolError> {
        let path = self.artifacts.job_file(
            &ctx.project_id,
            &self.profile.collection,
            &ctx.job_id,
            DOCUMENT_EXTENSION,
        )?;
        if let Some(dir) = path.parent() {
            self.artifacts.ensure_dir(dir).await?;
        }

        let job = self.jobs.get(&ctx.project_id, &ctx.job_id).await?;
        let title = job
            .as_ref()
            .and_then(|j| j.title.clone())
            .unwrap_or_else(|| self.profile.default_title.clone());
        let total = job.as_ref().map(|j| j.total_items).unwrap_or(0);

        match WriteOperation::for_unit(number) {
            WriteOperation::Write => {
                self.artifacts
                    .write_document(&path, &title, &input.markdown_content)
                    .await?
            }
            WriteOperation::Append => {
                self.artifacts
                    .append_document(&path, &input.markdown_content)
                    .await?
            }
        }

        self.jobs
            .update(
                &ctx.project_id,
                &ctx.job_id,
                JobUpdate::new()
                    .items_written(number)
                    .current_item(input.section_title.clone())
                    .output_file(self.profile.file_name(&ctx.job_id))
                    .status_message(format!(
                        "Writing section {}/{}: {}...",
                        number, total, input.section_title
                    )),
            )
            .await?;

        Ok(total)
    }

    /// Marks the job ready and builds the terminal result.
    async fn finalize(&self, ctx: &ExecutionContext, written: u32) -> Result<RunResult, ToolError> {
        let job = self
            .jobs
            .get(&ctx.project_id, &ctx.job_id)
            .await?
            .ok_or_else(|| ToolError::JobMissing(ctx.job_id.clone()))?;
        let title = job
            .title
            .unwrap_or_else(|| self.profile.default_title.clone());

        let file = self.profile.file_name(&ctx.job_id);
        let preview_url = self.profile.preview_url(&ctx.project_id, &ctx.job_id);
        let download_url = self.profile.download_url(&ctx.project_id, &ctx.job_id);

        self.jobs
            .update(
                &ctx.project_id,
                &ctx.job_id,
                JobUpdate::new()
                    .status(JobStatus::Ready)
                    .status_message(format!("{} generated successfully!", self.profile.label))
                    .output_file(file.clone())
                    .preview_url(preview_url.clone())
                    .download_url(download_url.clone())
                    .items_written(written)
                    .iterations(ctx.iteration)
                    .tokens(ctx.usage.input_tokens, ctx.usage.output_tokens)
                    .completed_at(Utc::now()),
            )
            .await?;

        Ok(RunResult::success(
            ctx.job_id.clone(),
            RunOutput::Document {
                title,
                file,
                preview_url,
                download_url,
            },
            ctx.iteration,
            written,
            ctx.usage,
        ))
    }

    /// Records a handler failure on the job and ends the run.
    ///
    /// `written` is the number of sections on disk when the failure hit.
    async fn fail(&self, ctx: &ExecutionContext, written: u32, message: String) -> ToolOutcome {
        error!(job_id = %ctx.job_id, error = %message, "Section write failed");

        let update = JobUpdate::new()
            .status(JobStatus::Error)
            .error_message(message.clone())
            .status_message(message.clone())
            .completed_at(Utc::now());
        if let Err(e) = self.jobs.update(&ctx.project_id, &ctx.job_id, update).await {
            warn!(job_id = %ctx.job_id, error = %e, "Failed to mark job as errored");
        }

        ToolOutcome::Finish(RunResult::failure(
            ctx.job_id.clone(),
            message,
            ctx.iteration,
            written,
            ctx.usage,
        ))
    }
}

#[async_trait]
impl Tool for WriteSectionTool {
    fn name(&self) -> &str {
        &self.profile.write_tool
    }

    fn produces_unit(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, ToolError> {
        let input: SectionInput = serde_json::from_value(input).map_err(ToolError::invalid)?;
        let number = ctx.next_unit();

        if let Some(claimed) = input.claimed_number() {
            if claimed != u64::from(number) {
                info!(
                    job_id = %ctx.job_id,
                    claimed,
                    actual = number,
                    "Model sent a different section number, using own count"
                );
            }
        }
        let operation = WriteOperation::for_unit(number);
        if let Some(requested) = input.operation.as_deref() {
            if !requested.eq_ignore_ascii_case(operation.as_str()) {
                debug!(
                    job_id = %ctx.job_id,
                    requested,
                    actual = operation.as_str(),
                    "Model requested a different write operation, using own count"
                );
            }
        }

        info!(
            job_id = %ctx.job_id,
            section = number,
            title = %input.section_title,
            is_last = input.is_last_section,
            "Writing section"
        );

        let total = match self.write_section(ctx, number, &input).await {
            Ok(total) => total,
            Err(e) => {
                return Ok(self
                    .fail(
                        ctx,
                        ctx.units_completed,
                        format!("Error writing section {}: {}", number, e),
                    )
                    .await)
            }
        };

        if input.is_last_section {
            return Ok(match self.finalize(ctx, number).await {
                Ok(result) => {
                    info!(
                        job_id = %ctx.job_id,
                        sections = number,
                        iterations = ctx.iteration,
                        "Document complete"
                    );
                    ToolOutcome::Finish(result)
                }
                Err(e) => {
                    self.fail(
                        ctx,
                        number,
                        format!(
                            "Error finalizing {}: {}",
                            self.profile.label.to_lowercase(),
                            e
                        ),
                    )
                    .await
                }
            });
        }

        let mut message = format!(
            "Section {} '{}' written successfully.",
            number, input.section_title
        );
        if total > 0 {
            let remaining = total.saturating_sub(number);
            message.push_str(&format!(
                " Progress: {}/{} sections complete. {} section(s) remaining.",
                number, total, remaining
            ));
        }
        Ok(ToolOutcome::Continue(ToolResult::success(message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::jobs::{JobRecord, MemoryJobStore};
    use crate::llm::TokenUsage;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        jobs: Arc<MemoryJobStore>,
        artifacts: Arc<ArtifactStore>,
        plan: PlanDocumentTool,
        write: WriteSectionTool,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().expect("failed to create temp dir");
        let jobs = Arc::new(MemoryJobStore::new());
        jobs.create(JobRecord::new("proj", "job-1", "marketing_strategy_agent"))
            .await
            .unwrap();
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let profile = DocumentProfile::marketing_strategy();
        Fixture {
            plan: PlanDocumentTool::new(profile.clone(), jobs.clone()),
            write: WriteSectionTool::new(profile, jobs.clone(), artifacts.clone()),
            _dir: dir,
            jobs,
            artifacts,
        }
    }

    fn ctx(units: u32, iteration: u32) -> ExecutionContext {
        ExecutionContext::new("proj", "job-1", "src-1").with_progress(
            units,
            iteration,
            TokenUsage::new(100, 50),
        )
    }

    fn section(number: u64, title: &str, body: &str, last: bool) -> Value {
        json!({
            "operation": "append",
            "section_number": number,
            "section_title": title,
            "markdown_content": body,
            "is_last_section": last,
        })
    }

    #[test]
    fn test_profile_urls() {
        let profile = DocumentProfile::marketing_strategy();
        assert_eq!(
            profile.preview_url("p", "j"),
            "/api/v1/projects/p/studio/marketing-strategies/j/preview"
        );
        assert_eq!(
            profile.download_url("p", "j"),
            "/api/v1/projects/p/studio/marketing-strategies/j/download"
        );
        assert_eq!(profile.file_name("j"), "j.md");
    }

    #[test]
    fn test_write_operation_for_unit() {
        assert_eq!(WriteOperation::for_unit(1), WriteOperation::Write);
        assert_eq!(WriteOperation::for_unit(2), WriteOperation::Append);
    }

    #[tokio::test]
    async fn test_plan_saves_job_fields() {
        let f = fixture().await;
        let outcome = f
            .plan
            .execute(
                json!({
                    "document_title": "Acme GTM",
                    "product_name": "Acme",
                    "sections": [
                        {"section_title": "Overview"},
                        {"section_title": "Channels"},
                        "Budget"
                    ]
                }),
                &ctx(0, 1),
            )
            .await
            .unwrap();

        let ToolOutcome::Continue(result) = outcome else {
            panic!("plan must not be terminal");
        };
        assert!(result.success);
        assert!(result.output.starts_with(
            "Marketing strategy plan saved successfully. Document: 'Acme GTM', Product: 'Acme', Sections planned: 3"
        ));
        assert!(result.output.contains("1. Overview; 2. Channels; 3. Budget"));

        let job = f.jobs.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(job.title.as_deref(), Some("Acme GTM"));
        assert_eq!(job.total_items, 3);
        assert_eq!(job.planned_items.len(), 3);
        assert_eq!(job.detail("product_name"), Some(&json!("Acme")));
        assert_eq!(job.detail("target_market"), Some(&Value::Null));
        assert_eq!(job.status_message, "Planned 3 sections, starting to write...");
    }

    #[tokio::test]
    async fn test_plan_defaults() {
        let f = fixture().await;
        let outcome = f.plan.execute(json!({}), &ctx(0, 1)).await.unwrap();
        let ToolOutcome::Continue(result) = outcome else {
            panic!("plan must not be terminal");
        };
        assert!(result
            .output
            .contains("Document: 'Marketing Strategy Document', Product: 'Unknown Product'"));
    }

    #[tokio::test]
    async fn test_claimed_number_is_ignored() {
        let f = fixture().await;
        f.jobs
            .update("proj", "job-1", JobUpdate::new().title("Doc").total_items(4))
            .await
            .unwrap();

        f.write
            .execute(section(1, "A", "alpha", false), &ctx(0, 2))
            .await
            .unwrap();
        f.write
            .execute(section(1, "B", "beta", false), &ctx(1, 3))
            .await
            .unwrap();
        let outcome = f
            .write
            .execute(section(5, "C", "gamma", false), &ctx(2, 4))
            .await
            .unwrap();

        let ToolOutcome::Continue(result) = outcome else {
            panic!("non-last section must not be terminal");
        };
        assert_eq!(
            result.output,
            "Section 3 'C' written successfully. Progress: 3/4 sections complete. 1 section(s) remaining."
        );
        let job = f.jobs.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(job.items_written, 3);
        assert_eq!(job.current_item.as_deref(), Some("C"));
        assert_eq!(job.output_file.as_deref(), Some("job-1.md"));
    }

    #[tokio::test]
    async fn test_single_header_and_ordered_body() {
        let f = fixture().await;
        f.jobs
            .update("proj", "job-1", JobUpdate::new().title("Doc"))
            .await
            .unwrap();

        // The model asks to append first and to rewrite later; the counter wins.
        f.write
            .execute(section(1, "A", "alpha", false), &ctx(0, 1))
            .await
            .unwrap();
        let mut second = section(2, "B", "beta", false);
        second["operation"] = json!("write");
        f.write.execute(second, &ctx(1, 2)).await.unwrap();

        let path = f
            .artifacts
            .job_file("proj", "marketing_strategies", "job-1", "md")
            .unwrap();
        let text = f.artifacts.read_to_string(&path).await.unwrap();
        assert_eq!(text.matches("# Doc").count(), 1);
        let body = text.split("---\n\n").nth(1).unwrap();
        assert_eq!(body, "alpha\n\nbeta\n\n");
    }

    #[tokio::test]
    async fn test_last_section_finalizes() {
        let f = fixture().await;
        f.jobs
            .update(
                "proj",
                "job-1",
                JobUpdate::new()
                    .status(JobStatus::Processing)
                    .title("Doc")
                    .total_items(1),
            )
            .await
            .unwrap();

        let outcome = f
            .write
            .execute(section(1, "Only", "body", true), &ctx(0, 2))
            .await
            .unwrap();

        let ToolOutcome::Finish(result) = outcome else {
            panic!("last section must be terminal");
        };
        assert!(result.success);
        assert_eq!(result.units_completed, 1);
        assert_eq!(result.iterations, 2);
        assert_eq!(
            result.output,
            Some(RunOutput::Document {
                title: "Doc".into(),
                file: "job-1.md".into(),
                preview_url: "/api/v1/projects/proj/studio/marketing-strategies/job-1/preview"
                    .into(),
                download_url: "/api/v1/projects/proj/studio/marketing-strategies/job-1/download"
                    .into(),
            })
        );

        let job = f.jobs.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Ready);
        assert!(job.completed_at.is_some());
        assert_eq!(job.input_tokens, 100);
        assert_eq!(job.output_tokens, 50);
    }

    #[tokio::test]
    async fn test_write_failure_is_terminal_error() {
        let dir = TempDir::new().expect("failed to create temp dir");
        // A file where the collection directory should be makes mkdir fail.
        std::fs::create_dir_all(dir.path().join("proj").join("studio")).unwrap();
        std::fs::write(
            dir.path()
                .join("proj")
                .join("studio")
                .join("marketing_strategies"),
            "not a dir",
        )
        .unwrap();

        let jobs = Arc::new(MemoryJobStore::new());
        jobs.create(JobRecord::new("proj", "job-1", "marketing_strategy_agent"))
            .await
            .unwrap();
        let write = WriteSectionTool::new(
            DocumentProfile::marketing_strategy(),
            jobs.clone(),
            Arc::new(ArtifactStore::new(dir.path())),
        );

        let outcome = write
            .execute(section(1, "A", "alpha", false), &ctx(0, 1))
            .await
            .unwrap();
        let ToolOutcome::Finish(result) = outcome else {
            panic!("write failure must be terminal");
        };
        assert!(!result.success);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Error writing section 1"));

        let job = jobs.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.error_message.is_some());
    }

    /// Job store that refuses to move a job to `ready`.
    struct NoReadyStore(MemoryJobStore);

    #[async_trait]
    impl JobStore for NoReadyStore {
        async fn create(&self, record: JobRecord) -> Result<(), StoreError> {
            self.0.create(record).await
        }

        async fn get(
            &self,
            project_id: &str,
            job_id: &str,
        ) -> Result<Option<JobRecord>, StoreError> {
            self.0.get(project_id, job_id).await
        }

        async fn update(
            &self,
            project_id: &str,
            job_id: &str,
            update: JobUpdate,
        ) -> Result<JobRecord, StoreError> {
            if update.status == Some(JobStatus::Ready) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.0.update(project_id, job_id, update).await
        }

        async fn list(&self, project_id: &str) -> Result<Vec<JobRecord>, StoreError> {
            self.0.list(project_id).await
        }
    }

    #[tokio::test]
    async fn test_finalize_failure_counts_written_section() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let jobs = Arc::new(NoReadyStore(MemoryJobStore::new()));
        jobs.create(JobRecord::new("proj", "job-1", "marketing_strategy_agent"))
            .await
            .unwrap();
        let write = WriteSectionTool::new(
            DocumentProfile::marketing_strategy(),
            jobs.clone(),
            Arc::new(ArtifactStore::new(dir.path())),
        );

        write
            .execute(section(1, "A", "alpha", false), &ctx(0, 2))
            .await
            .unwrap();
        let outcome = write
            .execute(section(2, "B", "beta", true), &ctx(1, 3))
            .await
            .unwrap();
        let ToolOutcome::Finish(result) = outcome else {
            panic!("finalize failure must be terminal");
        };
        assert!(!result.success);
        assert_eq!(result.units_completed, 2);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Error finalizing marketing strategy"));

        let job = jobs.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.items_written, result.units_completed);
    }

    #[tokio::test]
    async fn test_invalid_input_is_recoverable() {
        let f = fixture().await;
        let err = f
            .write
            .execute(json!({"section_title": "No body"}), &ctx(0, 1))
            .await;
        assert!(matches!(err, Err(ToolError::InvalidParameters(_))));

        let job = f.jobs.get("proj", "job-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }
}

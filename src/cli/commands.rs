//! CLI command definitions for studio-forge.
//!
//! `generate` creates a job record and runs one studio agent against a
//! project source; `status` polls job records the way an API client would.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PromptLoader;
use crate::jobs::{FileJobStore, JobRecord, JobStatus, JobStore, JobUpdate};
use crate::llm::{LiteLlmClient, LlmProvider};
use crate::metrics::{export_metrics, init_metrics};
use crate::scaffold::{AgentKind, AgentLoop, AgentServices, RunResult, MAX_ITERATIONS};
use crate::source::FsSourceFetcher;
use crate::storage::ArtifactStore;
use crate::trajectory::TraceStorage;

/// Default root for job records, sources and artifacts.
const DEFAULT_DATA_DIR: &str = "./studio-data";

/// Subdirectory of the data root holding execution traces.
const TRACES_DIR: &str = ".traces";

/// Plan-then-write studio agents driven by a bounded tool-calling loop.
#[derive(Parser)]
#[command(name = "studio-forge")]
#[command(about = "Generate studio documents and components with tool-calling LLM agents")]
#[command(version)]
#[command(
    long_about = "studio-forge runs a plan-then-write agent against a project source and tracks its progress in a job record.\n\nExample usage:\n  studio-forge generate --agent marketing-strategy --project acme --source brief\n  studio-forge status --project acme --job <job-id>"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run a studio agent for one source and wait for it to finish.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Show job records of a project.
    Status(StatusArgs),
}

/// Arguments for `studio-forge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Agent to run (marketing-strategy, component).
    #[arg(short = 'a', long, default_value = "marketing-strategy")]
    pub agent: AgentKind,

    /// Project identifier.
    #[arg(short = 'p', long)]
    pub project: String,

    /// Source identifier, read from `<data-dir>/<project>/sources/<source>.txt` or `.md`.
    #[arg(short = 's', long)]
    pub source: String,

    /// Job identifier. A random one is generated when omitted.
    #[arg(long)]
    pub job: Option<String>,

    /// Free-form direction for the agent. Falls back to the configured default.
    #[arg(short = 'd', long, default_value = "")]
    pub direction: String,

    /// Root directory for job records, sources, artifacts and traces.
    #[arg(long, env = "STUDIO_FORGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Directory with `prompts/<agent>.yaml` and `tools/<agent>.json` overrides.
    #[arg(long, env = "STUDIO_FORGE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Maximum number of model calls.
    #[arg(long, default_value_t = MAX_ITERATIONS)]
    pub max_iterations: u32,

    /// OpenRouter API key (can also be set via OPENROUTER_API_KEY; otherwise LITELLM_* env vars are used).
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub api_key: Option<String>,

    /// Output JSON to stdout instead of a summary.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for `studio-forge status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Project identifier.
    #[arg(short = 'p', long)]
    pub project: String,

    /// Job identifier. Lists every job of the project when omitted.
    #[arg(long)]
    pub job: Option<String>,

    /// Root directory for job records.
    #[arg(long, env = "STUDIO_FORGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Output JSON to stdout.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// JSON output of `generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOutput {
    /// "success" or "failed".
    pub status: String,
    pub agent: String,
    pub project_id: String,
    pub job_id: String,
    pub total_duration_ms: u64,
    pub result: RunResult,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Status(args) => run_status_command(args).await,
    }
}

fn build_llm_client(api_key: Option<String>) -> anyhow::Result<Arc<dyn LlmProvider>> {
    if let Some(key) = api_key {
        info!("Using OpenRouter with specified API key");
        Ok(Arc::new(LiteLlmClient::new_with_defaults(key)))
    } else {
        info!("Using LiteLLM client from environment");
        Ok(Arc::new(LiteLlmClient::from_env().map_err(|e| {
            anyhow::anyhow!(
                "Failed to initialize LLM client: {}. Please provide --api-key or set \
                 OPENROUTER_API_KEY or LITELLM_API_BASE.",
                e
            )
        })?))
    }
}

// ============================================================================
// Generate Command Implementation
// ============================================================================

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    if args.metrics {
        init_metrics()?;
    }

    let llm = build_llm_client(args.api_key.clone())?;
    let jobs: Arc<dyn JobStore> = Arc::new(FileJobStore::new(&args.data_dir));
    let prompts = match &args.config_dir {
        Some(dir) => PromptLoader::from_dir(dir),
        None => PromptLoader::builtin(),
    };

    let job_id = args
        .job
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    jobs.create(
        JobRecord::new(&args.project, &job_id, args.agent.job_type())
            .with_source(&args.source)
            .with_direction(&args.direction),
    )
    .await?;
    info!(agent = %args.agent, project_id = %args.project, job_id = %job_id, "Created job");

    let services = AgentServices {
        llm,
        jobs: Arc::clone(&jobs),
        sources: Arc::new(FsSourceFetcher::new(&args.data_dir)),
        artifacts: Arc::new(ArtifactStore::new(&args.data_dir)),
        traces: Arc::new(TraceStorage::new(args.data_dir.join(TRACES_DIR))),
        prompts,
    };
    let agent = Arc::new(
        AgentLoop::new(args.agent, services).with_max_iterations(args.max_iterations),
    );

    let start = Instant::now();
    let handle = agent
        .start(&args.project, &job_id, &args.source, &args.direction)
        .await?;
    let outcome = handle
        .await
        .map_err(|e| anyhow::anyhow!("Agent task failed: {}", e))?;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            // The loop leaves the job processing on unrecovered errors.
            let update = JobUpdate::new()
                .status(JobStatus::Error)
                .error_message(e.to_string())
                .completed_at(Utc::now());
            if let Err(store_err) = jobs.update(&args.project, &job_id, update).await {
                warn!(job_id = %job_id, error = %store_err, "Failed to mark job as failed");
            }
            return Err(e.into());
        }
    };

    let output = GenerateOutput {
        status: if result.success { "success" } else { "failed" }.to_string(),
        agent: args.agent.agent_name().to_string(),
        project_id: args.project.clone(),
        job_id: job_id.clone(),
        total_duration_ms: start.elapsed().as_millis() as u64,
        result,
    };

    if args.json {
        let json_output = serde_json::to_string_pretty(&output)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
        println!("{}", json_output);
    } else {
        print_generate_summary(&output);
    }

    if args.metrics {
        print!("{}", export_metrics());
    }

    if !output.result.success {
        anyhow::bail!(
            "Generation failed: {}",
            output.result.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_generate_summary(output: &GenerateOutput) {
    let result = &output.result;
    println!("Job:        {} ({})", output.job_id, output.agent);
    println!("Status:     {}", output.status);
    println!("Iterations: {}", result.iterations);
    println!("Units:      {}", result.units_completed);
    println!(
        "Tokens:     {} in / {} out",
        result.usage.input_tokens, result.usage.output_tokens
    );
    println!("Duration:   {} ms", output.total_duration_ms);
    if let Some(error) = &result.error_message {
        println!("Error:      {}", error);
    }
    if let Some(run_output) = &result.output {
        if let Ok(json) = serde_json::to_string_pretty(run_output) {
            println!("Output:\n{}", json);
        }
    }
}

// ============================================================================
// Status Command Implementation
// ============================================================================

async fn run_status_command(args: StatusArgs) -> anyhow::Result<()> {
    let jobs = FileJobStore::new(&args.data_dir);

    let records = match &args.job {
        Some(job_id) => match jobs.get(&args.project, job_id).await? {
            Some(record) => vec![record],
            None => anyhow::bail!("Job '{}' not found in project '{}'", job_id, args.project),
        },
        None => jobs.list(&args.project).await?,
    };

    if args.json {
        let json_output = if args.job.is_some() {
            serde_json::to_string_pretty(&records[0])?
        } else {
            serde_json::to_string_pretty(&records)?
        };
        println!("{}", json_output);
        return Ok(());
    }

    if records.is_empty() {
        println!("No jobs in project '{}'", args.project);
    }
    for record in &records {
        println!("{}", format_job_line(record));
    }
    Ok(())
}

fn format_job_line(record: &JobRecord) -> String {
    let progress = if record.total_items > 0 {
        format!("{}/{}", record.items_written, record.total_items)
    } else {
        record.items_written.to_string()
    };
    let message = record
        .error_message
        .as_deref()
        .unwrap_or(&record.status_message);
    format!(
        "{}  {:<10}  {:<18}  {:>5}  {}",
        record.id,
        record.status.as_str(),
        record.job_type,
        progress,
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        // Verify CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_command_defaults() {
        let args = vec![
            "studio-forge",
            "generate",
            "--project",
            "acme",
            "--source",
            "brief",
        ];
        let cli = Cli::try_parse_from(args).expect("should parse");

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.agent, AgentKind::MarketingStrategy);
                assert_eq!(args.project, "acme");
                assert_eq!(args.source, "brief");
                assert!(args.job.is_none());
                assert_eq!(args.direction, "");
                assert_eq!(args.max_iterations, MAX_ITERATIONS);
                assert!(args.config_dir.is_none());
                assert!(!args.json);
                assert!(!args.metrics);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_command_with_all_options() {
        let args = vec![
            "studio-forge",
            "gen",
            "-a",
            "component",
            "-p",
            "acme",
            "-s",
            "brief",
            "--job",
            "job-42",
            "-d",
            "dark theme",
            "--data-dir",
            "/tmp/studio",
            "--config-dir",
            "/tmp/config",
            "--max-iterations",
            "4",
            "-j",
            "--metrics",
        ];
        let cli = Cli::try_parse_from(args).expect("should parse");

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.agent, AgentKind::Component);
                assert_eq!(args.job.as_deref(), Some("job-42"));
                assert_eq!(args.direction, "dark theme");
                assert_eq!(args.data_dir, PathBuf::from("/tmp/studio"));
                assert_eq!(args.config_dir, Some(PathBuf::from("/tmp/config")));
                assert_eq!(args.max_iterations, 4);
                assert!(args.json);
                assert!(args.metrics);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_rejects_unknown_agent() {
        let args = vec![
            "studio-forge",
            "generate",
            "-a",
            "podcast",
            "-p",
            "acme",
            "-s",
            "brief",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_status_command() {
        let args = vec!["studio-forge", "status", "-p", "acme", "--job", "job-1", "-l", "debug"];
        let cli = Cli::try_parse_from(args).expect("should parse");
        assert_eq!(cli.log_level, "debug");

        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.project, "acme");
                assert_eq!(args.job.as_deref(), Some("job-1"));
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_format_job_line() {
        let mut record = JobRecord::new("acme", "job-1", "marketing_strategy");
        record.status = JobStatus::Processing;
        record.total_items = 4;
        record.items_written = 1;
        record.status_message = "Writing section 1/4: Overview...".to_string();

        let line = format_job_line(&record);
        assert!(line.starts_with("job-1"));
        assert!(line.contains("processing"));
        assert!(line.contains("1/4"));
        assert!(line.ends_with("Writing section 1/4: Overview..."));
    }
}

//! Prompt and tool configuration for studio agents.
//!
//! Each agent has two configuration files, keyed by agent name:
//!
//! - `prompts/<agent>.yaml`: system prompt, user message template, default
//!   direction, and model parameters ([`AgentConfig`])
//! - `tools/<agent>.json`: the tool schema sent to the model, either a bare
//!   list of tool definitions or `{ "all_tools": [...] }`
//!
//! [`PromptLoader::builtin`] serves the defaults shipped in the repository's
//! `config/` directory; [`PromptLoader::from_dir`] reads an override tree.
//!
//! # Example
//!
//! ```ignore
//! use studio_forge::config::PromptLoader;
//!
//! let loader = PromptLoader::builtin();
//! let config = loader.load_agent_config("marketing_strategy_agent")?;
//! let tools = loader.load_tools("marketing_strategy_agent")?;
//! let first_turn = config.render_user_message("source text", "")?;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::ToolDefinition;

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        "marketing_strategy_agent",
        include_str!("../../config/prompts/marketing_strategy_agent.yaml"),
    ),
    (
        "component_agent",
        include_str!("../../config/prompts/component_agent.yaml"),
    ),
];

const BUILTIN_TOOLS: &[(&str, &str)] = &[
    (
        "marketing_strategy_agent",
        include_str!("../../config/tools/marketing_strategy_agent.json"),
    ),
    (
        "component_agent",
        include_str!("../../config/tools/component_agent.json"),
    ),
];

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.4
}

/// Static prompt configuration for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// System prompt sent with every model call.
    pub system_prompt: String,
    /// Tera template for the first user turn. Receives `source_content` and
    /// `direction`.
    pub user_message: String,
    /// Direction used when the caller supplies none.
    #[serde(default)]
    pub default_direction: String,
    /// Model identifier; empty means the gateway's default.
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl AgentConfig {
    fn validate(&self, agent: &str) -> Result<(), ConfigError> {
        for (field, value) in [
            ("system_prompt", &self.system_prompt),
            ("user_message", &self.user_message),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    agent: agent.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Direction to use for a run: the caller's when non-empty, the
    /// configured default otherwise.
    pub fn effective_direction<'a>(&'a self, direction: &'a str) -> &'a str {
        if direction.trim().is_empty() {
            &self.default_direction
        } else {
            direction
        }
    }

    /// Render the first user turn from the configured template.
    pub fn render_user_message(
        &self,
        source_content: &str,
        direction: &str,
    ) -> Result<String, ConfigError> {
        let mut context = tera::Context::new();
        context.insert("source_content", source_content);
        context.insert("direction", self.effective_direction(direction));
        Ok(tera::Tera::one_off(&self.user_message, &context, false)?)
    }
}

/// On-disk shapes accepted for a tool schema file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolSchemaFile {
    List(Vec<ToolDefinition>),
    Grouped { all_tools: Vec<ToolDefinition> },
}

impl From<ToolSchemaFile> for Vec<ToolDefinition> {
    fn from(file: ToolSchemaFile) -> Self {
        match file {
            ToolSchemaFile::List(tools) => tools,
            ToolSchemaFile::Grouped { all_tools } => all_tools,
        }
    }
}

#[derive(Debug, Clone)]
enum ConfigSource {
    Builtin,
    Directory(PathBuf),
}

/// Loads agent prompt configurations and tool schemas.
#[derive(Debug, Clone)]
pub struct PromptLoader {
    source: ConfigSource,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptLoader {
    /// Loader serving the configuration compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            source: ConfigSource::Builtin,
        }
    }

    /// Loader reading `prompts/` and `tools/` under `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: ConfigSource::Directory(dir.into()),
        }
    }

    /// Names of the agents with built-in configuration.
    pub fn builtin_agents() -> Vec<&'static str> {
        BUILTIN_PROMPTS.iter().map(|(name, _)| *name).collect()
    }

    /// Load and validate the prompt configuration for `agent`.
    pub fn load_agent_config(&self, agent: &str) -> Result<AgentConfig, ConfigError> {
        let (path, content) = self.read(agent, "prompts", "yaml", BUILTIN_PROMPTS)?;
        let config: AgentConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path,
                message: e.to_string(),
            })?;
        config.validate(agent)?;
        Ok(config)
    }

    /// Load the tool schema for `agent`.
    pub fn load_tools(&self, agent: &str) -> Result<Vec<ToolDefinition>, ConfigError> {
        let (path, content) = self.read(agent, "tools", "json", BUILTIN_TOOLS)?;
        let file: ToolSchemaFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path,
                message: e.to_string(),
            })?;
        Ok(file.into())
    }

    fn read(
        &self,
        agent: &str,
        kind: &str,
        extension: &str,
        builtin: &[(&str, &str)],
    ) -> Result<(String, String), ConfigError> {
        match &self.source {
            ConfigSource::Builtin => builtin
                .iter()
                .find(|(name, _)| *name == agent)
                .map(|(_, content)| (format!("builtin:{}/{}", kind, agent), content.to_string()))
                .ok_or_else(|| ConfigError::UnknownAgent(agent.to_string())),
            ConfigSource::Directory(dir) => {
                let path = config_path(dir, kind, agent, extension);
                match fs::read_to_string(&path) {
                    Ok(content) => Ok((path.display().to_string(), content)),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        Err(ConfigError::UnknownAgent(agent.to_string()))
                    }
                    Err(e) => Err(ConfigError::Io(e)),
                }
            }
        }
    }
}

fn config_path(dir: &Path, kind: &str, agent: &str, extension: &str) -> PathBuf {
    dir.join(kind).join(format!("{}.{}", agent, extension))
}

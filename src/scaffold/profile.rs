//! Agent kinds and their tool dispatch tables.
//!
//! Each kind maps to one prompt/tool configuration (keyed by
//! [`AgentKind::agent_name`]) and one fixed set of tool handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::tools::{
    DocumentProfile, PlanComponentsTool, PlanDocumentTool, ToolRegistry, WriteComponentCodeTool,
    WriteSectionTool,
};
use crate::jobs::JobStore;
use crate::storage::ArtifactStore;

/// Supported studio agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Plans and writes a marketing strategy document section by section.
    MarketingStrategy,
    /// Plans and writes a set of standalone HTML components.
    Component,
}

impl AgentKind {
    /// All agent kinds.
    pub fn all() -> &'static [AgentKind] {
        &[AgentKind::MarketingStrategy, AgentKind::Component]
    }

    /// Configuration key of this agent.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentKind::MarketingStrategy => "marketing_strategy_agent",
            AgentKind::Component => "component_agent",
        }
    }

    /// Job type stored on records created for this agent.
    pub fn job_type(&self) -> &'static str {
        match self {
            AgentKind::MarketingStrategy => "marketing_strategy",
            AgentKind::Component => "component",
        }
    }

    /// Lowercase label used in status messages.
    pub fn task_label(&self) -> &'static str {
        match self {
            AgentKind::MarketingStrategy => "marketing strategy",
            AgentKind::Component => "component",
        }
    }

    /// Builds the dispatch table for this agent.
    pub fn build_registry(
        &self,
        jobs: Arc<dyn JobStore>,
        artifacts: Arc<ArtifactStore>,
    ) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        match self {
            AgentKind::MarketingStrategy => {
                let profile = DocumentProfile::marketing_strategy();
                registry.register(Arc::new(PlanDocumentTool::new(
                    profile.clone(),
                    Arc::clone(&jobs),
                )));
                registry.register(Arc::new(WriteSectionTool::new(profile, jobs, artifacts)));
            }
            AgentKind::Component => {
                registry.register(Arc::new(PlanComponentsTool::new(Arc::clone(&jobs))));
                registry.register(Arc::new(WriteComponentCodeTool::new(jobs, artifacts)));
            }
        }
        registry
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.agent_name())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "marketing_strategy" | "marketing_strategy_agent" | "marketing" => {
                Ok(AgentKind::MarketingStrategy)
            }
            "component" | "components" | "component_agent" => Ok(AgentKind::Component),
            other => Err(format!("Unknown agent: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptLoader;
    use crate::jobs::MemoryJobStore;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(
            "marketing-strategy".parse::<AgentKind>(),
            Ok(AgentKind::MarketingStrategy)
        );
        assert_eq!(
            "component_agent".parse::<AgentKind>(),
            Ok(AgentKind::Component)
        );
        assert!("podcast".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_registry_matches_tool_schema() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let loader = PromptLoader::builtin();

        for kind in AgentKind::all() {
            let registry = kind.build_registry(Arc::clone(&jobs), Arc::clone(&artifacts));
            let mut declared: Vec<String> = loader
                .load_tools(kind.agent_name())
                .unwrap()
                .into_iter()
                .map(|t| t.name)
                .collect();
            declared.sort();
            assert_eq!(registry.list_tools(), declared, "agent {}", kind);
        }
    }

    #[test]
    fn test_only_section_writer_produces_units() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));

        let registry = AgentKind::MarketingStrategy.build_registry(jobs, artifacts);
        assert!(registry.is_unit_tool("write_marketing_section"));
        assert!(!registry.is_unit_tool("plan_marketing_strategy"));
    }
}

//! Agent spawner — lifecycle management for agents.
//!
//! Manages creating and terminating agents, enforces limits, and tracks
//! parent-child relationships for hierarchical agent spawning.

use super::isolation::{AgentContext, AgentStatus, ResourceLimits};
use crate::config::SafetyConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Configuration for multi-agent spawning.
#[derive(Debug, Clone)]
pub struct SpawnerConfig {
    /// Maximum number of concurrent agents.
    pub max_agents: usize,
    /// Default window size for agent memory.
    pub default_window_size: usize,
    /// Default safety config applied to spawned agents.
    pub default_safety: SafetyConfig,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_agents: 8,
            default_window_size: 10,
            default_safety: SafetyConfig::default(),
        }
    }
}

/// Manages agent lifecycle — spawn, terminate, query.
pub struct AgentSpawner {
    config: SpawnerConfig,
    contexts: HashMap<Uuid, AgentContext>,
}

impl AgentSpawner {
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            config,
            contexts: HashMap::new(),
        }
    }

    /// Spawn a new top-level agent. Returns the agent ID, or an error if limit reached.
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<Uuid, String> {
        if self.contexts.len() >= self.config.max_agents {
            return Err(format!(
                "Agent limit reached (max {})",
                self.config.max_agents
            ));
        }

        let ctx = AgentContext::new(
            name,
            self.config.default_window_size,
            self.config.default_safety.clone(),
        );
        let id = ctx.agent_id;
        self.contexts.insert(id, ctx);
        Ok(id)
    }

    /// Spawn a child agent under a parent. Returns the child's ID.
    pub fn spawn_child(
        &mut self,
        name: impl Into<String>,
        parent_id: Uuid,
    ) -> Result<Uuid, String> {
        if !self.contexts.contains_key(&parent_id) {
            return Err(format!("Parent agent {parent_id} not found"));
        }
        if self.contexts.len() >= self.config.max_agents {
            return Err(format!(
                "Agent limit reached (max {})",
                self.config.max_agents
            ));
        }

        let ctx = AgentContext::new_child(
            name,
            parent_id,
            self.config.default_window_size,
            self.config.default_safety.clone(),
        );
        let id = ctx.agent_id;
        self.contexts.insert(id, ctx);
        Ok(id)
    }

    /// Terminate an agent and all its children. Returns number of agents removed.
    pub fn terminate(&mut self, agent_id: Uuid) -> usize {
        let children = self.children_of(agent_id);
        let mut count = 0;

        // Recursively terminate children first
        for child_id in children {
            count += self.terminate(child_id);
        }

        if self.contexts.remove(&agent_id).is_some() {
            count += 1;
        }
        count
    }

    /// Get a reference to an agent's context.
    pub fn get(&self, agent_id: &Uuid) -> Option<&AgentContext> {
        self.contexts.get(agent_id)
    }

    /// Get a mutable reference to an agent's context.
    pub fn get_mut(&mut self, agent_id: &Uuid) -> Option<&mut AgentContext> {
        self.contexts.get_mut(agent_id)
    }

    /// Find all direct children of a given agent.
    pub fn children_of(&self, parent_id: Uuid) -> Vec<Uuid> {
        self.contexts
            .iter()
            .filter(|(_, ctx)| ctx.parent_id == Some(parent_id))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Total number of active agents.
    pub fn agent_count(&self) -> usize {
        self.contexts.len()
    }

    /// List all active agent IDs.
    pub fn agent_ids(&self) -> Vec<Uuid> {
        self.contexts.keys().copied().collect()
    }

    /// Spawn an agent with custom configuration.
    pub fn spawn_with_config(
        &mut self,
        name: impl Into<String>,
        workspace_dir: Option<PathBuf>,
        llm_override: Option<String>,
        resource_limits: ResourceLimits,
    ) -> Result<Uuid, String> {
        if self.contexts.len() >= self.config.max_agents {
            return Err(format!(
                "Agent limit reached (max {})",
                self.config.max_agents
            ));
        }

        let mut ctx = AgentContext::new(
            name,
            self.config.default_window_size,
            self.config.default_safety.clone(),
        );
        ctx.workspace_dir = workspace_dir;
        ctx.llm_override = llm_override;
        ctx.resource_limits = resource_limits;
        let id = ctx.agent_id;
        self.contexts.insert(id, ctx);
        Ok(id)
    }

    /// Get the status of an agent.
    pub fn get_status(&self, agent_id: &Uuid) -> Option<AgentStatus> {
        self.contexts.get(agent_id).map(|ctx| ctx.status)
    }

    /// Set the status of an agent.
    pub fn set_status(&mut self, agent_id: &Uuid, status: AgentStatus) -> Result<(), String> {
        let ctx = self
            .contexts
            .get_mut(agent_id)
            .ok_or_else(|| format!("Agent {agent_id} not found"))?;
        ctx.status = status;
        Ok(())
    }

    /// List all agents with a given status.
    pub fn list_by_status(&self, status: AgentStatus) -> Vec<Uuid> {
        self.contexts
            .iter()
            .filter(|(_, ctx)| ctx.status == status)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Default for AgentSpawner {
    fn default() -> Self {
        Self::new(SpawnerConfig::default())
    }
}

//! Agent orchestrator — the async run loop that connects message bus, spawner,
//! routing, and task handlers into a cohesive multi-agent execution engine.
//!
//! The orchestrator receives messages from the `MessageBus`, dispatches them
//! to registered `TaskHandler` implementations, and returns results via the bus.
//! It enforces `ResourceLimits` on each agent.

use super::messaging::{AgentEnvelope, AgentPayload, MessageBus, MessagePriority};
use super::routing::AgentRouter;
use super::spawner::AgentSpawner;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Trait for handling tasks dispatched by the orchestrator.
///
/// Implementations receive a task description and arguments, execute the work,
/// and return a string result or an error message.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle_task(
        &self,
        description: &str,
        args: &HashMap<String, String>,
    ) -> Result<String, String>;
}

/// The agent orchestrator ties together the spawner, message bus, router,
/// and task handlers into a cohesive execution engine.
pub struct AgentOrchestrator {
    spawner: AgentSpawner,
    bus: MessageBus,
    router: AgentRouter,
    handlers: HashMap<Uuid, Box<dyn TaskHandler>>,
    tool_call_counts: HashMap<Uuid, u32>,
}

impl AgentOrchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(spawner: AgentSpawner, bus: MessageBus, router: AgentRouter) -> Self {
        Self {
            spawner,
            bus,
            router,
            handlers: HashMap::new(),
            tool_call_counts: HashMap::new(),
        }
    }

    /// Register a task handler for a specific agent.
    pub fn register_handler(&mut self, agent_id: Uuid, handler: Box<dyn TaskHandler>) {
        self.handlers.insert(agent_id, handler);
    }

    /// Access the spawner.
    pub fn spawner(&self) -> &AgentSpawner {
        &self.spawner
    }

    /// Mutably access the spawner.
    pub fn spawner_mut(&mut self) -> &mut AgentSpawner {
        &mut self.spawner
    }

    /// Access the message bus.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Mutably access the message bus.
    pub fn bus_mut(&mut self) -> &mut MessageBus {
        &mut self.bus
    }

    /// Access the router.
    pub fn router(&self) -> &AgentRouter {
        &self.router
    }

    /// Mutably access the router.
    pub fn router_mut(&mut self) -> &mut AgentRouter {
        &mut self.router
    }

    /// Get the current tool call count for an agent.
    pub fn tool_call_count(&self, agent_id: &Uuid) -> u32 {
        self.tool_call_counts.get(agent_id).copied().unwrap_or(0)
    }

    /// Reset tool call counts for an agent (e.g., at the start of a new turn).
    pub fn reset_tool_counts(&mut self, agent_id: &Uuid) {
        self.tool_call_counts.insert(*agent_id, 0);
    }

    /// Check whether processing a task would violate the agent's resource limits.
    ///
    /// Returns `Ok(())` if within limits, or `Err(reason)` if a limit would be exceeded.
    pub fn check_resource_limits(&self, agent_id: &Uuid) -> Result<(), String> {
        let limits = self
            .spawner
            .get(agent_id)
            .map(|ctx| &ctx.resource_limits)
            .cloned()
            .unwrap_or_default();

        // Check tool call limit
        if let Some(max_calls) = limits.max_tool_calls {
            let current = self.tool_call_count(agent_id);
            if current >= max_calls {
                return Err(format!(
                    "Agent {} exceeded max_tool_calls limit ({}/{})",
                    agent_id, current, max_calls
                ));
            }
        }

        Ok(())
    }

    /// Process all pending messages for all registered agents.
    ///
    /// For each agent with pending messages:
    /// 1. Check resource limits
    /// 2. Receive the message
    /// 3. Dispatch to the registered handler (for TaskRequest)
    /// 4. Send the result back via the bus
    ///
    /// Returns the number of messages processed.
    pub async fn process_pending(&mut self) -> usize {
        // Collect agent IDs that have pending messages and handlers
        let agent_ids: Vec<Uuid> = self
            .handlers
            .keys()
            .filter(|id| self.bus.pending_count(id) > 0)
            .copied()
            .collect();

        let mut processed = 0;

        for agent_id in agent_ids {
            // Check resource limits before processing
            if let Err(reason) = self.check_resource_limits(&agent_id) {
                // Send an error back if there's a pending message
                if let Some(envelope) = self.bus.receive(&agent_id) {
                    let error_response = AgentEnvelope::new(
                        agent_id,
                        envelope.from,
                        AgentPayload::Error {
                            code: "RESOURCE_LIMIT".into(),
                            message: reason,
                            recoverable: false,
                        },
                    )
                    .with_priority(MessagePriority::High);
                    if let Some(corr) = envelope.correlation_id {
                        let error_response = error_response.with_correlation(corr);
                        let _ = self.bus.send(error_response);
                    } else {
                        let _ = self.bus.send(error_response);
                    }
                    processed += 1;
                }
                continue;
            }

            // Receive the next message
            let envelope = match self.bus.receive(&agent_id) {
                Some(e) => e,
                None => continue,
            };

            match &envelope.payload {
                AgentPayload::TaskRequest { description, args } => {
                    // Increment tool call count
                    *self.tool_call_counts.entry(agent_id).or_insert(0) += 1;

                    let handler = match self.handlers.get(&agent_id) {
                        Some(h) => h,
                        None => continue,
                    };

                    let result = handler.handle_task(description, args).await;

                    let response_payload = match result {
                        Ok(output) => AgentPayload::TaskResult {
                            success: true,
                            output,
                        },
                        Err(err) => AgentPayload::TaskResult {
                            success: false,
                            output: err,
                        },
                    };

                    let mut response = AgentEnvelope::new(agent_id, envelope.from, response_payload);
                    if let Some(corr) = envelope.correlation_id {
                        response = response.with_correlation(corr);
                    }
                    let _ = self.bus.send(response);
                    processed += 1;
                }
                AgentPayload::Shutdown => {
                    // Terminate the agent and its children
                    self.spawner.terminate(agent_id);
                    self.handlers.remove(&agent_id);
                    self.tool_call_counts.remove(&agent_id);
                    processed += 1;
                }
                AgentPayload::StatusQuery => {
                    let pending = self.bus.pending_count(&agent_id);
                    let agent_name = self
                        .spawner
                        .get(&agent_id)
                        .map(|ctx| ctx.name.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    let response = AgentEnvelope::new(
                        agent_id,
                        envelope.from,
                        AgentPayload::StatusResponse {
                            agent_name,
                            active: true,
                            pending_tasks: pending,
                        },
                    );
                    let _ = self.bus.send(response);
                    processed += 1;
                }
                _ => {
                    // Other payload types are forwarded as-is (no special handling)
                    processed += 1;
                }
            }
        }

        processed
    }
}

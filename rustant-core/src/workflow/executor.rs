//! Workflow executor â€” runs workflow steps sequentially, gating on approvals,
//! handling errors, and persisting state for pause/resume.

use crate::error::WorkflowError;
use crate::workflow::templates::{evaluate_condition, render_value, TemplateContext};
use crate::workflow::types::{
    ApprovalDecision, ErrorAction, GateType, WorkflowDefinition, WorkflowState, WorkflowStatus,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Trait for executing a tool by name with JSON arguments.
/// This abstracts over the real ToolRegistry for testability.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute_tool(
        &self,
        tool_name: &str,
        args: Value,
    ) -> Result<Value, String>;
}

/// Trait for requesting approval from the user for gated steps.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn request_approval(
        &self,
        workflow: &str,
        step_id: &str,
        message: &str,
        preview: Option<&str>,
    ) -> ApprovalDecision;
}

/// A simple auto-approve handler for testing.
pub struct AutoApproveHandler;

#[async_trait]
impl ApprovalHandler for AutoApproveHandler {
    async fn request_approval(
        &self,
        _workflow: &str,
        _step_id: &str,
        _message: &str,
        _preview: Option<&str>,
    ) -> ApprovalDecision {
        ApprovalDecision::Approved
    }
}

/// A handler that always denies for testing.
pub struct AutoDenyHandler;

#[async_trait]
impl ApprovalHandler for AutoDenyHandler {
    async fn request_approval(
        &self,
        _workflow: &str,
        _step_id: &str,
        _message: &str,
        _preview: Option<&str>,
    ) -> ApprovalDecision {
        ApprovalDecision::Denied
    }
}

/// The workflow executor manages workflow runs and their lifecycle.
pub struct WorkflowExecutor {
    tool_executor: Arc<dyn ToolExecutor>,
    approval_handler: Arc<dyn ApprovalHandler>,
    runs: Arc<Mutex<HashMap<Uuid, WorkflowState>>>,
    state_path: Option<PathBuf>,
}

impl WorkflowExecutor {
    pub fn new(
        tool_executor: Arc<dyn ToolExecutor>,
        approval_handler: Arc<dyn ApprovalHandler>,
        state_path: Option<PathBuf>,
    ) -> Self {
        Self {
            tool_executor,
            approval_handler,
            runs: Arc::new(Mutex::new(HashMap::new())),
            state_path,
        }
    }

    /// Start a new workflow run.
    pub async fn start(
        &self,
        workflow: &WorkflowDefinition,
        inputs: HashMap<String, Value>,
    ) -> Result<WorkflowState, WorkflowError> {
        let mut state = WorkflowState::new(workflow.name.clone(), inputs);
        state.status = WorkflowStatus::Running;
        state.updated_at = chrono::Utc::now();

        // Store the run
        {
            let mut runs = self.runs.lock().await;
            runs.insert(state.run_id, state.clone());
        }

        // Execute steps
        let final_state = self
            .execute_steps(workflow, state)
            .await?;

        // Update stored state
        {
            let mut runs = self.runs.lock().await;
            runs.insert(final_state.run_id, final_state.clone());
        }

        // Persist state if configured
        if let Some(ref path) = self.state_path {
            self.persist_state(&final_state, path).await?;
        }

        Ok(final_state)
    }

    /// Resume a paused workflow run with an approval decision.
    pub async fn resume(
        &self,
        run_id: Uuid,
        workflow: &WorkflowDefinition,
        decision: ApprovalDecision,
    ) -> Result<WorkflowState, WorkflowError> {
        let state = {
            let runs = self.runs.lock().await;
            runs.get(&run_id)
                .cloned()
                .ok_or(WorkflowError::RunNotFound { run_id })?
        };

        if state.status != WorkflowStatus::WaitingApproval {
            return Err(WorkflowError::StepFailed {
                step: format!("step_{}", state.current_step_index),
                message: format!("Cannot resume workflow in status: {}", state.status),
            });
        }

        let mut state = state;

        match decision {
            ApprovalDecision::Approved => {
                // Execute the current gated step
                let step = &workflow.steps[state.current_step_index];
                let ctx = TemplateContext::new(
                    state.inputs.clone(),
                    state.step_outputs.clone(),
                );

                let rendered_params = render_value(&serde_json::to_value(&step.params).unwrap(), &ctx)
                    .map_err(|e| WorkflowError::StepFailed {
                        step: step.id.clone(),
                        message: e.to_string(),
                    })?;

                let output = self
                    .tool_executor
                    .execute_tool(&step.tool, rendered_params)
                    .await
                    .map_err(|e| WorkflowError::StepFailed {
                        step: step.id.clone(),
                        message: e,
                    })?;

                state.step_outputs.insert(step.id.clone(), output);
                state.current_step_index += 1;
                state.status = WorkflowStatus::Running;
                state.updated_at = chrono::Utc::now();

                // Continue executing remaining steps
                let final_state = self.execute_steps(workflow, state).await?;
                let mut runs = self.runs.lock().await;
                runs.insert(final_state.run_id, final_state.clone());
                Ok(final_state)
            }
            ApprovalDecision::Denied => {
                state.status = WorkflowStatus::Failed;
                state.error = Some("Approval denied by user".to_string());
                state.updated_at = chrono::Utc::now();
                let mut runs = self.runs.lock().await;
                runs.insert(state.run_id, state.clone());
                Ok(state)
            }
        }
    }

    /// Cancel a running workflow.
    pub async fn cancel(&self, run_id: Uuid) -> Result<WorkflowState, WorkflowError> {
        let mut runs = self.runs.lock().await;
        let state = runs
            .get_mut(&run_id)
            .ok_or(WorkflowError::RunNotFound { run_id })?;
        state.status = WorkflowStatus::Cancelled;
        state.updated_at = chrono::Utc::now();
        Ok(state.clone())
    }

    /// Get the current status of a workflow run.
    pub async fn get_status(&self, run_id: Uuid) -> Result<WorkflowState, WorkflowError> {
        let runs = self.runs.lock().await;
        runs.get(&run_id)
            .cloned()
            .ok_or(WorkflowError::RunNotFound { run_id })
    }

    /// List all workflow runs.
    pub async fn list_runs(&self) -> Vec<WorkflowState> {
        let runs = self.runs.lock().await;
        runs.values().cloned().collect()
    }

    /// Execute steps starting from `state.current_step_index`.
    async fn execute_steps(
        &self,
        workflow: &WorkflowDefinition,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, WorkflowError> {
        while state.current_step_index < workflow.steps.len() {
            let step = &workflow.steps[state.current_step_index];
            let ctx = TemplateContext::new(
                state.inputs.clone(),
                state.step_outputs.clone(),
            );

            // Check condition
            if let Some(ref condition) = step.condition {
                let should_run = evaluate_condition(condition, &ctx).unwrap_or(false);
                if !should_run {
                    state.current_step_index += 1;
                    state.updated_at = chrono::Utc::now();
                    continue;
                }
            }

            // Check gate
            if let Some(ref gate) = step.gate {
                if gate.gate_type == GateType::ApprovalRequired {
                    let message = step
                        .gate_message
                        .as_deref()
                        .unwrap_or(&gate.message);
                    let preview = step.gate_preview.as_deref().or(gate.preview.as_deref());

                    let decision = self
                        .approval_handler
                        .request_approval(
                            &state.workflow_name,
                            &step.id,
                            message,
                            preview,
                        )
                        .await;

                    match decision {
                        ApprovalDecision::Denied => {
                            state.status = WorkflowStatus::WaitingApproval;
                            state.updated_at = chrono::Utc::now();
                            return Ok(state);
                        }
                        ApprovalDecision::Approved => {
                            // Continue to execute the step
                        }
                    }
                }
            }

            // Render params
            let params_value = serde_json::to_value(&step.params).unwrap_or(Value::Object(Default::default()));
            let rendered_params = render_value(&params_value, &ctx).map_err(|e| {
                WorkflowError::StepFailed {
                    step: step.id.clone(),
                    message: e.to_string(),
                }
            })?;

            // Execute tool
            let result = self
                .tool_executor
                .execute_tool(&step.tool, rendered_params)
                .await;

            match result {
                Ok(output) => {
                    state.step_outputs.insert(step.id.clone(), output);
                    state.current_step_index += 1;
                    state.updated_at = chrono::Utc::now();
                }
                Err(err) => {
                    match &step.on_error {
                        Some(ErrorAction::Skip) => {
                            state.step_outputs.insert(
                                step.id.clone(),
                                Value::String(format!("skipped: {}", err)),
                            );
                            state.current_step_index += 1;
                            state.updated_at = chrono::Utc::now();
                        }
                        Some(ErrorAction::Retry { max_retries }) => {
                            let mut retries = 0;
                            let mut last_err = err;
                            while retries < *max_retries {
                                retries += 1;
                                let ctx2 = TemplateContext::new(
                                    state.inputs.clone(),
                                    state.step_outputs.clone(),
                                );
                                let params_value2 = serde_json::to_value(&step.params)
                                    .unwrap_or(Value::Object(Default::default()));
                                let rendered2 = render_value(&params_value2, &ctx2)
                                    .map_err(|e| WorkflowError::StepFailed {
                                        step: step.id.clone(),
                                        message: e.to_string(),
                                    })?;
                                match self.tool_executor.execute_tool(&step.tool, rendered2).await {
                                    Ok(output) => {
                                        state.step_outputs.insert(step.id.clone(), output);
                                        state.current_step_index += 1;
                                        state.updated_at = chrono::Utc::now();
                                        last_err = String::new();
                                        break;
                                    }
                                    Err(e) => {
                                        last_err = e;
                                    }
                                }
                            }
                            if !last_err.is_empty() {
                                state.status = WorkflowStatus::Failed;
                                state.error = Some(format!(
                                    "Step '{}' failed after {} retries: {}",
                                    step.id, max_retries, last_err
                                ));
                                state.updated_at = chrono::Utc::now();
                                return Ok(state);
                            }
                        }
                        Some(ErrorAction::Fail) | None => {
                            state.status = WorkflowStatus::Failed;
                            state.error =
                                Some(format!("Step '{}' failed: {}", step.id, err));
                            state.updated_at = chrono::Utc::now();
                            return Ok(state);
                        }
                    }
                }
            }
        }

        state.status = WorkflowStatus::Completed;
        state.updated_at = chrono::Utc::now();
        Ok(state)
    }

    /// Persist workflow state to disk.
    async fn persist_state(
        &self,
        state: &WorkflowState,
        base_path: &PathBuf,
    ) -> Result<(), WorkflowError> {
        let file_path = base_path.join(format!("{}.json", state.run_id));
        let json = serde_json::to_string_pretty(state).map_err(|e| {
            WorkflowError::StepFailed {
                step: "persistence".to_string(),
                message: e.to_string(),
            }
        })?;
        tokio::fs::create_dir_all(base_path)
            .await
            .map_err(|e| WorkflowError::StepFailed {
                step: "persistence".to_string(),
                message: e.to_string(),
            })?;
        tokio::fs::write(file_path, json)
            .await
            .map_err(|e| WorkflowError::StepFailed {
                step: "persistence".to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Load a workflow state from disk.
    pub async fn load_state(
        base_path: &std::path::Path,
        run_id: Uuid,
    ) -> Result<WorkflowState, WorkflowError> {
        let file_path = base_path.join(format!("{}.json", run_id));
        let json = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|_| WorkflowError::RunNotFound { run_id })?;
        serde_json::from_str(&json).map_err(|e| WorkflowError::ParseError {
            message: e.to_string(),
        })
    }
}

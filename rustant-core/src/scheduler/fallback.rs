//! Fallback model state machine — tracks whether the active model currently
//! differs from the selected one, and reports the transition as it happens.

use serde::{Deserialize, Serialize};

const MAX_REASON_LEN: usize = 80;

/// One attempted (provider, model) pair and why it didn't stick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackAttempt {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl FallbackAttempt {
    /// `"<provider/model> <reason>"`, falling back through reason -> code ->
    /// HTTP status -> the literal string `"error"`.
    pub fn summary(&self) -> String {
        let reason = self
            .reason
            .clone()
            .or_else(|| self.code.clone())
            .or_else(|| self.http_status.map(|s| s.to_string()))
            .unwrap_or_else(|| "error".to_string());
        format!("{}/{} {}", self.provider, self.model, normalize_reason(&reason))
    }
}

/// Persisted fallback state, before or after a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FallbackState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_model: Option<String>,
}

/// Inputs to a single evaluation of the fallback state machine.
#[derive(Debug, Clone)]
pub struct FallbackInput {
    pub selected_provider: String,
    pub selected_model: String,
    pub active_provider: String,
    pub active_model: String,
    pub attempts: Vec<FallbackAttempt>,
    pub prior_state: FallbackState,
}

/// Result of evaluating the fallback state machine for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    pub fallback_active: bool,
    pub fallback_transitioned: bool,
    pub fallback_cleared: bool,
    pub reason_summary: Option<String>,
    pub attempt_summaries: Vec<String>,
    pub previous_state: FallbackState,
    pub next_state: FallbackState,
    pub state_changed: bool,
}

/// Collapse whitespace and truncate to 80 chars with no added marker.
fn normalize_reason(raw: &str) -> String {
    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_REASON_LEN {
        collapsed.chars().take(MAX_REASON_LEN).collect()
    } else {
        collapsed
    }
}

/// Evaluate the fallback state machine for a single turn.
pub fn evaluate_fallback(input: &FallbackInput) -> FallbackOutcome {
    let active = input.selected_provider != input.active_provider || input.selected_model != input.active_model;

    let prior_had_state = input.prior_state.selected_model.is_some() || input.prior_state.active_model.is_some();

    let model_changed_vs_prior = active
        && (input.prior_state.selected_model.as_deref() != Some(input.selected_model.as_str())
            || input.prior_state.active_model.as_deref() != Some(input.active_model.as_str()));
    // `transitioned` also covers the false->true edge, which trivially
    // satisfies `model_changed_vs_prior` when prior_state was empty.
    let transitioned = active && model_changed_vs_prior;

    let cleared = !active && prior_had_state;

    let next_state = if active {
        FallbackState {
            selected_model: Some(input.selected_model.clone()),
            active_model: Some(input.active_model.clone()),
        }
    } else {
        FallbackState::default()
    };

    let state_changed = next_state != input.prior_state;

    let attempt_summaries: Vec<String> = input.attempts.iter().map(|a| a.summary()).collect();
    let reason_summary = if active {
        input
            .attempts
            .last()
            .map(|a| a.summary())
            .or_else(|| Some(format!("fell back to {}/{}", input.active_provider, input.active_model)))
    } else {
        None
    };

    FallbackOutcome {
        fallback_active: active,
        fallback_transitioned: transitioned,
        fallback_cleared: cleared,
        reason_summary,
        attempt_summaries,
        previous_state: input.prior_state.clone(),
        next_state,
        state_changed,
    }
}

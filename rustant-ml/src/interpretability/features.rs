//! Feature importance analysis (SHAP/LIME stubs).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature importance analyzer.
pub struct FeatureImportanceAnalyzer;

impl Default for FeatureImportanceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureImportanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn permutation_importance(
        &self,
        features: &[String],
        _predictions: &[f64],
    ) -> HashMap<String, f64> {
        features.iter().map(|f| (f.clone(), 0.0)).collect()
    }

    /// Compute SHAP-like feature attribution values (stub).
    pub fn shap_values(&self, _model: &str, features: &[f64]) -> Vec<f64> {
        // Stub: return zero attributions for each feature
        vec![0.0; features.len()]
    }

    /// Compute LIME-like feature importance explanations (stub).
    pub fn lime_explain(&self, _model: &str, input: &str) -> Vec<(String, f64)> {
        // Stub: return zero importance for each token
        input
            .split_whitespace()
            .map(|token| (token.to_string(), 0.0))
            .collect()
    }
}

/// SHAP result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapResult {
    pub feature_values: HashMap<String, f64>,
    pub base_value: f64,
    pub prediction: f64,
}

/// LIME result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimeResult {
    pub feature_weights: HashMap<String, f64>,
    pub intercept: f64,
    pub r_squared: f64,
}

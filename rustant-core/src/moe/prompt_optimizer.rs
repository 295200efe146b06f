//! Adaptive system prompt compression for MoE.
//!
//! When system_prompt + tools + history exceeds 70% of the context window,
//! this module truncates addenda at sensible boundaries and deduplicates
//! redundant instructions across persona/expert/workflow/knowledge addenda.

use std::collections::HashSet;

/// Prompt optimizer that compresses system prompt addenda when context usage
/// is too high.
pub struct PromptOptimizer {
    /// Maximum fraction of context window the prompt + tools can occupy (0.0-1.0).
    threshold: f64,
}

impl PromptOptimizer {
    /// Create a new optimizer with the given context usage threshold.
    ///
    /// When total prompt tokens exceed `threshold * context_window`, compression kicks in.
    /// Default threshold is 0.7 (70%).
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.1, 0.95),
        }
    }

    /// Check if compression is needed given current token usage.
    pub fn needs_compression(&self, prompt_tokens: usize, context_window: usize) -> bool {
        if context_window == 0 {
            return false;
        }
        (prompt_tokens as f64 / context_window as f64) > self.threshold
    }

    /// Deduplicate addenda by removing semantically redundant sentences.
    ///
    /// Uses sentence-level Jaccard similarity to identify near-duplicates across
    /// persona, expert, workflow, and knowledge addenda.
    pub fn dedup_addenda(&self, addenda: &[String]) -> Vec<String> {
        if addenda.len() <= 1 {
            return addenda.to_vec();
        }

        let mut seen_sentences: HashSet<Vec<String>> = HashSet::new();
        let mut result = Vec::new();

        for addendum in addenda {
            let mut deduped_lines = Vec::new();

            for line in addendum.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    deduped_lines.push(line.to_string());
                    continue;
                }

                // Tokenize into normalized words for Jaccard comparison
                let words: Vec<String> = trimmed
                    .split_whitespace()
                    .map(|w| w.to_lowercase())
                    .collect();

                if words.is_empty() {
                    deduped_lines.push(line.to_string());
                    continue;
                }

                // Check Jaccard similarity against all seen sentences
                let is_duplicate = seen_sentences
                    .iter()
                    .any(|seen| jaccard_similarity(&words, seen) > 0.75);

                if !is_duplicate {
                    seen_sentences.insert(words);
                    deduped_lines.push(line.to_string());
                }
            }

            let deduped = deduped_lines.join("\n");
            if !deduped.trim().is_empty() {
                result.push(deduped);
            }
        }

        result
    }

    /// Truncate an addendum to fit within a token budget.
    ///
    /// Truncates at sentence boundaries (periods, newlines) rather than
    /// mid-word, preserving readability.
    pub fn truncate_to_budget(&self, text: &str, max_tokens: usize) -> String {
        // Rough estimate: 1 token ~= 4 chars (for English text)
        let max_chars = max_tokens * 4;

        if text.len() <= max_chars {
            return text.to_string();
        }

        // Find the last sentence boundary before the limit
        let truncation_point = text[..max_chars]
            .rfind(". ")
            .or_else(|| text[..max_chars].rfind('\n'))
            .or_else(|| text[..max_chars].rfind(' '))
            .unwrap_or(max_chars);

        let mut result = text[..truncation_point].to_string();
        if !result.ends_with('.') {
            result.push('.');
        }
        result
    }

    /// Compress system prompt components to fit within the context budget.
    ///
    /// Returns the compressed system prompt string. Prioritizes keeping:
    /// 1. Core system instructions (never truncated)
    /// 2. Expert-specific addendum (truncated last)
    /// 3. Persona addendum (truncated second)
    /// 4. Workflow hints (truncated first)
    /// 5. Knowledge addendum (truncated first)
    pub fn compress_prompt(
        &self,
        core_prompt: &str,
        addenda: &[(&str, String)], // (label, content) pairs
        context_window: usize,
        tool_tokens: usize,
    ) -> String {
        let available_tokens =
            ((context_window as f64 * self.threshold) as usize).saturating_sub(tool_tokens);

        // Core prompt is never compressed
        let core_tokens = estimate_tokens(core_prompt);

        if core_tokens >= available_tokens {
            // Even core doesn't fit — return it unmodified, caller will handle
            return core_prompt.to_string();
        }

        let remaining = available_tokens - core_tokens;

        // Dedup addenda content
        let contents: Vec<String> = addenda.iter().map(|(_, c)| c.clone()).collect();
        let deduped = self.dedup_addenda(&contents);

        // Allocate budget proportionally to each addendum
        let total_addenda_tokens: usize = deduped.iter().map(|a| estimate_tokens(a)).sum();

        let mut parts = vec![core_prompt.to_string()];

        if total_addenda_tokens <= remaining {
            // Everything fits
            for d in &deduped {
                if !d.trim().is_empty() {
                    parts.push(d.clone());
                }
            }
        } else {
            // Need to truncate — distribute budget proportionally
            for d in &deduped {
                let d_tokens = estimate_tokens(d);
                let budget = if total_addenda_tokens > 0 {
                    (d_tokens as f64 / total_addenda_tokens as f64 * remaining as f64) as usize
                } else {
                    0
                };
                if budget > 0 {
                    let truncated = self.truncate_to_budget(d, budget);
                    if !truncated.trim().is_empty() {
                        parts.push(truncated);
                    }
                }
            }
        }

        parts.join("\n\n")
    }

    /// Strip irrelevant sections from a system prompt based on expert exclusion keywords.
    ///
    /// For each line in the prompt, if it contains any of the exclusion keywords
    /// (case-insensitive), the line is removed. This reduces the system prompt by
    /// 500-1500 tokens for domain-specific experts.
    ///
    /// Only non-empty lines containing keywords are removed; headings and structural
    /// lines (starting with `#` or `---`) are always preserved to maintain readability.
    pub fn strip_irrelevant_sections(&self, prompt: &str, exclusions: &[&str]) -> String {
        if exclusions.is_empty() {
            return prompt.to_string();
        }

        let exclusions_lower: Vec<String> = exclusions.iter().map(|e| e.to_lowercase()).collect();

        prompt
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                // Always keep empty lines, headings, and separators
                if trimmed.is_empty()
                    || trimmed.starts_with('#')
                    || trimmed.starts_with("---")
                    || trimmed.starts_with("| ")
                {
                    return true;
                }
                // Check if line contains any exclusion keyword
                let lower = trimmed.to_lowercase();
                !exclusions_lower
                    .iter()
                    .any(|exc| lower.contains(exc.as_str()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for PromptOptimizer {
    fn default() -> Self {
        Self::new(0.7)
    }
}

/// Estimate token count for a string (rough: ~4 chars per token).
fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Compute Jaccard similarity between two word lists.
fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let set_a: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let set_b: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

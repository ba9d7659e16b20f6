//! Token usage accounting for model calls.

use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated LLM usage for a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Total tokens used
    pub total_tokens: u64,

    /// Prompt/input tokens
    pub prompt_tokens: u64,

    /// Completion/output tokens
    pub completion_tokens: u64,

    /// Prompt tokens served from the context cache
    pub cached_tokens: u64,

    /// Number of LLM calls made
    pub llm_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += u64::from(usage.prompt_tokens);
        self.completion_tokens += u64::from(usage.completion_tokens);
        self.cached_tokens += u64::from(usage.cached_tokens);
        self.total_tokens += u64::from(usage.total());
        self.llm_calls += 1;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Estimate cost for a usage entry.
    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens: (input, output)
        let (input_rate, output_rate) = match model {
            m if m.contains("2.5-pro") => (1.25, 10.0),
            m if m.contains("2.5-flash") => (0.30, 2.50),
            m if m.contains("1.5-flash") => (0.075, 0.30),
            m if m.contains("1.5-pro") => (1.25, 5.0),
            _ => (0.10, 0.40),
        };

        // Cached prompt tokens bill at a quarter of the input rate
        let cached = usage.cached_tokens.min(usage.prompt_tokens) as f64;
        let fresh = usage.prompt_tokens as f64 - cached;

        let input_cost = (fresh + cached * 0.25) / 1_000_000.0 * input_rate;
        let output_cost = usage.completion_tokens as f64 / 1_000_000.0 * output_rate;

        input_cost + output_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u32, completion: u32, cached: u32) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            cached_tokens: cached,
        }
    }

    #[test]
    fn test_accumulates_calls() {
        let mut total = LlmUsage::default();
        total.add(&usage(1000, 200, 0), "gemini-2.0-flash-001");
        total.add(&usage(500, 100, 0), "gemini-2.0-flash-001");

        assert_eq!(total.llm_calls, 2);
        assert_eq!(total.prompt_tokens, 1500);
        assert_eq!(total.completion_tokens, 300);
        assert_eq!(total.total_tokens, 1800);
    }

    #[test]
    fn test_flash_pricing() {
        let mut total = LlmUsage::default();
        total.add(&usage(1_000_000, 1_000_000, 0), "gemini-2.0-flash-001");
        assert!((total.estimated_cost - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_cached_tokens_are_discounted() {
        let mut plain = LlmUsage::default();
        plain.add(&usage(1_000_000, 0, 0), "gemini-2.5-pro");

        let mut cached = LlmUsage::default();
        cached.add(&usage(1_000_000, 0, 1_000_000), "gemini-2.5-pro");

        assert!((plain.estimated_cost - 1.25).abs() < 1e-9);
        assert!((cached.estimated_cost - 0.3125).abs() < 1e-9);
    }
}

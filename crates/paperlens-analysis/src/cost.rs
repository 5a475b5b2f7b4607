//! Token usage and cost accounting.
//!
//! Billing uses the token counts reported by the backend, never the
//! 4-chars-per-token sizing estimate.

use serde::{Deserialize, Serialize};

/// Per-million-token rates in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_million: 2.00,
            output_per_million: 8.00,
        }
    }
}

impl Pricing {
    /// Cost of a single call.
    pub fn call_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (output_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

/// Round to 4 decimal places.
pub fn round_cost(cost: f64) -> f64 {
    (cost * 10_000.0).round() / 10_000.0
}

/// Running totals across the calls of one analysis. Adding returns a new value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Unrounded; round once when building the final result.
    pub cost_usd: f64,
    pub calls: u32,
}

impl UsageTotals {
    #[must_use]
    pub fn add(self, input_tokens: u32, output_tokens: u32, pricing: &Pricing) -> Self {
        Self {
            input_tokens: self.input_tokens + input_tokens as u64,
            output_tokens: self.output_tokens + output_tokens as u64,
            cost_usd: self.cost_usd + pricing.call_cost(input_tokens, output_tokens),
            calls: self.calls + 1,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn rounded_cost(&self) -> f64 {
        round_cost(self.cost_usd)
    }
}

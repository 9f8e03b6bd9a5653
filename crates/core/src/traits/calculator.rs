//! Per-minute cost estimation
//!
//! Estimates what one minute of conversation costs for a given selection of
//! LLM, transcriber and synthesizer models, using the prices in the provider
//! catalog and fixed usage assumptions.
//!
//! # Example
//!
//! ```
//! use voice_console_core::{CostCalculator, ProviderCatalog, Selection};
//!
//! let catalog = ProviderCatalog::default();
//! let cost = catalog.estimate(&Selection::default());
//! assert_eq!(cost.total, 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::agent::{ModelSelection, Selection};
use crate::provider::{ModelPrice, ProviderCatalog, ProviderCategory};

/// Fixed usage assumptions for one minute of conversation
pub mod assumptions {
    /// Prices of LLM models are quoted per this many tokens
    pub const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

    /// Tokens per minute for flat-priced models
    pub const TOKENS_PER_MINUTE: f64 = 8000.0;

    /// Input tokens per minute for split-priced models
    pub const INPUT_TOKENS_PER_MINUTE: f64 = 5000.0;

    /// Output tokens per minute for split-priced models
    pub const OUTPUT_TOKENS_PER_MINUTE: f64 = 3000.0;

    /// Synthesized characters per minute (90 words x 5 chars)
    pub const CHARACTERS_PER_MINUTE: f64 = 450.0;
}

/// Estimated cost of one minute of conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub llm: f64,
    pub transcriber: f64,
    pub synthesizer: f64,
    pub platform: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from components; non-finite or negative components count as 0
    pub fn from_components(llm: f64, transcriber: f64, synthesizer: f64, platform: f64) -> Self {
        let llm = sanitize(llm);
        let transcriber = sanitize(transcriber);
        let synthesizer = sanitize(synthesizer);
        let platform = sanitize(platform);
        Self {
            llm,
            transcriber,
            synthesizer,
            platform,
            total: llm + transcriber + synthesizer + platform,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// LLM cost per minute for a price entry
pub fn llm_cost(price: ModelPrice) -> f64 {
    use assumptions::*;
    match price {
        ModelPrice::Flat(p) => p / TOKENS_PER_PRICE_UNIT * TOKENS_PER_MINUTE,
        ModelPrice::Split { input, output } => {
            input / TOKENS_PER_PRICE_UNIT * INPUT_TOKENS_PER_MINUTE
                + output / TOKENS_PER_PRICE_UNIT * OUTPUT_TOKENS_PER_MINUTE
        }
    }
}

/// Transcriber prices are already per minute
pub fn transcriber_cost(price: ModelPrice) -> f64 {
    price.per_unit()
}

/// Synthesizer cost per minute for a per-character price
pub fn synthesizer_cost(price: ModelPrice) -> f64 {
    price.per_unit() * assumptions::CHARACTERS_PER_MINUTE
}

/// Cost estimation over a price source
///
/// Implementations must be pure: identical inputs give bit-identical output,
/// and unknown providers or models contribute 0 instead of failing.
pub trait CostCalculator: Send + Sync {
    /// Price entry for a model, `None` when not listed
    fn model_price(&self, category: ProviderCategory, selection: &ModelSelection)
        -> Option<ModelPrice>;

    /// Flat platform fee per minute
    fn platform_fee(&self) -> f64;

    /// Cost breakdown for a selection
    fn estimate(&self, selection: &Selection) -> CostBreakdown {
        let price = |category: ProviderCategory, s: &Option<ModelSelection>| {
            let s = s.as_ref()?;
            let found = self.model_price(category, s);
            if found.is_none() {
                tracing::debug!(
                    category = category.as_str(),
                    provider = %s.provider,
                    model = %s.model,
                    "No catalog price, counting as zero"
                );
            }
            found
        };
        CostBreakdown::from_components(
            price(ProviderCategory::Llm, &selection.llm)
                .map(llm_cost)
                .unwrap_or(0.0),
            price(ProviderCategory::Transcriber, &selection.transcriber)
                .map(transcriber_cost)
                .unwrap_or(0.0),
            price(ProviderCategory::Synthesizer, &selection.synthesizer)
                .map(synthesizer_cost)
                .unwrap_or(0.0),
            self.platform_fee(),
        )
    }
}

impl CostCalculator for ProviderCatalog {
    fn model_price(
        &self,
        category: ProviderCategory,
        selection: &ModelSelection,
    ) -> Option<ModelPrice> {
        self.price(category, &selection.provider, &selection.model)
    }

    fn platform_fee(&self) -> f64 {
        self.platform_price().unwrap_or(0.0)
    }
}

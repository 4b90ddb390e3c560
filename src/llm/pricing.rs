use serde::Serialize;

const TOKENS_PER_UNIT: f64 = 1_000_000.0;

/// Price used for models the table doesn't know, per million tokens
pub const DEFAULT_INPUT_PRICE: f64 = 1.00;
pub const DEFAULT_OUTPUT_PRICE: f64 = 5.00;

/// Per-million-token prices of one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingEntry {
    pub name: String,
    pub input_short: f64,
    pub input_long: f64,
    pub output_short: f64,
    pub output_long: f64,
    /// Input size above which long-context prices apply; 0 disables tiering
    pub long_context_threshold: u64,
}

impl PricingEntry {
    pub fn flat(name: &str, input: f64, output: f64) -> Self {
        Self::tiered(name, (input, input), (output, output), 0)
    }

    pub fn tiered(name: &str, input: (f64, f64), output: (f64, f64), threshold: u64) -> Self {
        Self {
            name: name.to_string(),
            input_short: input.0,
            input_long: input.1,
            output_short: output.0,
            output_long: output.1,
            long_context_threshold: threshold,
        }
    }

    pub fn is_long_context(&self, input_tokens: u64) -> bool {
        self.long_context_threshold > 0 && input_tokens > self.long_context_threshold
    }
}

/// Model id → prices
#[derive(Debug, Clone)]
pub struct PricingTable {
    entries: Vec<(String, PricingEntry)>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new(vec![
            // Gemini 3 (preview)
            ("gemini-3-pro-preview", PricingEntry::flat("Gemini 3 Pro", 4.00, 12.00)),
            ("gemini-3-flash-preview", PricingEntry::flat("Gemini 3 Flash", 0.50, 3.00)),
            // Gemini 2.5
            (
                "gemini-2.5-pro",
                PricingEntry::tiered("Gemini 2.5 Pro", (1.25, 2.50), (10.00, 15.00), 200_000),
            ),
            ("gemini-2.5-flash", PricingEntry::flat("Gemini 2.5 Flash", 0.30, 2.50)),
            ("gemini-2.5-flash-lite", PricingEntry::flat("Gemini 2.5 Flash-Lite", 0.10, 0.40)),
            // Gemini 2.0
            ("gemini-2.0-flash", PricingEntry::flat("Gemini 2.0 Flash", 0.15, 0.60)),
            ("gemini-2.0-flash-lite", PricingEntry::flat("Gemini 2.0 Flash-Lite", 0.075, 0.30)),
            // Gemini 1.5 (legacy)
            ("gemini-1.5-pro", PricingEntry::flat("Gemini 1.5 Pro", 1.25, 5.00)),
            ("gemini-1.5-flash", PricingEntry::flat("Gemini 1.5 Flash", 0.075, 0.30)),
        ])
    }
}

impl PricingTable {
    pub fn new<K: Into<String>>(entries: Vec<(K, PricingEntry)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        }
    }

    /// Prices for `model`
    ///
    /// Exact id first, then the longest known id contained in `model`
    /// (case-insensitive), then the default prices under the model's own name.
    pub fn lookup(&self, model: &str) -> PricingEntry {
        if let Some((_, entry)) = self.entries.iter().find(|(key, _)| key == model) {
            return entry.clone();
        }

        let model_lower = model.to_lowercase();
        let partial = self
            .entries
            .iter()
            .filter(|(key, _)| model_lower.contains(&key.to_lowercase()))
            .max_by_key(|(key, _)| key.len());

        match partial {
            Some((_, entry)) => entry.clone(),
            None => PricingEntry::flat(model, DEFAULT_INPUT_PRICE, DEFAULT_OUTPUT_PRICE),
        }
    }
}

/// Token counts and their cost for one call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    /// Display name of the priced model
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Reasoning tokens, billed at the output rate
    pub thinking_tokens: u64,
    pub total_tokens: u64,
    /// Local estimate made before the call
    pub estimated_input_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub thinking_cost: f64,
    pub total_cost: f64,
    pub long_context: bool,
}

impl UsageReport {
    /// The same report carrying the pre-call input estimate
    pub fn with_estimated_input(self, estimated_input_tokens: u64) -> Self {
        Self {
            estimated_input_tokens,
            ..self
        }
    }
}

/// Rough token count: three bytes of UTF-8 per token
///
/// Code, English and CJK text all tokenize differently, so this only serves
/// as an estimate; the provider's counts are authoritative.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 3) as u64
}

/// Turns token counts into cost for one model
#[derive(Debug, Clone)]
pub struct CostCalculator {
    pricing: PricingEntry,
}

impl CostCalculator {
    pub fn new(table: &PricingTable, model: &str) -> Self {
        Self {
            pricing: table.lookup(model),
        }
    }

    pub fn calculate(&self, input_tokens: u64, output_tokens: u64, thinking_tokens: u64) -> UsageReport {
        let long_context = self.pricing.is_long_context(input_tokens);
        let (input_price, output_price) = if long_context {
            (self.pricing.input_long, self.pricing.output_long)
        } else {
            (self.pricing.input_short, self.pricing.output_short)
        };

        let input_cost = input_tokens as f64 / TOKENS_PER_UNIT * input_price;
        let output_cost = output_tokens as f64 / TOKENS_PER_UNIT * output_price;
        let thinking_cost = thinking_tokens as f64 / TOKENS_PER_UNIT * output_price;

        UsageReport {
            model: self.pricing.name.clone(),
            input_tokens,
            output_tokens,
            thinking_tokens,
            total_tokens: input_tokens + output_tokens + thinking_tokens,
            estimated_input_tokens: 0,
            input_cost,
            output_cost,
            thinking_cost,
            total_cost: input_cost + output_cost + thinking_cost,
            long_context,
        }
    }
}

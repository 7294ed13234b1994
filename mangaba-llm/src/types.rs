use serde::{Deserialize, Serialize};

/// Normalized result of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Empty when the vendor produced no text (e.g. content filtered).
    pub text: String,
    /// Vendor payload as received. Diagnostics only.
    pub raw: serde_json::Value,
}

impl LlmResponse {
    pub fn new(text: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            raw,
        }
    }
}

/// Construction-time options for an adapter. Unset fields fall back to per-vendor defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOptions {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub top_k: Option<u32>,
    /// Endpoint override, e.g. a proxy or a self-hosted gateway.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Per-call overrides. A set field wins over the adapter's stored default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl GenerateOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Defaults an adapter stores at construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GenerationDefaults {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

/// Settings for one vendor call after overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EffectiveSettings {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl GenerationDefaults {
    /// Fill unset options from the vendor's fallback values.
    pub fn from_options(
        options: &ProviderOptions,
        fallback_temperature: Option<f64>,
        fallback_max_output_tokens: Option<u32>,
    ) -> Self {
        Self {
            temperature: options.temperature.or(fallback_temperature),
            max_output_tokens: options.max_output_tokens.or(fallback_max_output_tokens),
            system_prompt: options
                .system_prompt
                .clone()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn merge(&self, overrides: &GenerateOptions) -> EffectiveSettings {
        EffectiveSettings {
            temperature: overrides.temperature.or(self.temperature),
            max_output_tokens: overrides.max_output_tokens.or(self.max_output_tokens),
            system_prompt: overrides
                .system_prompt
                .clone()
                .or_else(|| self.system_prompt.clone())
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

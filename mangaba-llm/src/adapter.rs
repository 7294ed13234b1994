use crate::error::Result;
use crate::types::{GenerateOptions, LlmResponse, ProviderOptions};
use async_trait::async_trait;
use secrecy::SecretString;

/// Uniform generation contract over one vendor API.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Canonical provider name.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// One vendor call with `overrides` merged over the stored defaults. Never retries.
    async fn generate(&self, prompt: &str, overrides: &GenerateOptions) -> Result<LlmResponse>;
}

/// Everything an adapter constructor receives besides the transport.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub api_key: SecretString,
    pub model: String,
    pub options: ProviderOptions,
}

impl AdapterSettings {
    pub fn new(api_key: &str, model: &str, options: ProviderOptions) -> Self {
        Self {
            api_key: SecretString::from(api_key.to_string()),
            model: model.to_string(),
            options,
        }
    }

    pub(crate) fn base_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.options
            .base_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(default)
    }
}

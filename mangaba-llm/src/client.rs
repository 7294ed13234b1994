use crate::adapter::{AdapterSettings, ProviderAdapter};
use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::registry::ProviderRegistry;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{GenerateOptions, LlmResponse, ProviderOptions};
use std::sync::Arc;

/// Provider-agnostic façade over one constructed adapter.
///
/// Holds no conversation state; every call is independent. The bundled adapters are `Sync`,
/// but callers should treat one client as single-flight unless they know the vendor tolerates
/// concurrent requests on one key, and build one client per worker otherwise.
pub struct LlmClient {
    provider_name: &'static str,
    adapter: Box<dyn ProviderAdapter>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider_name)
            .field("model", &self.adapter.model())
            .finish()
    }
}

impl LlmClient {
    /// Build against the bundled registry and a reqwest transport.
    #[tracing::instrument(level = "debug", skip(api_key, options))]
    pub fn new(
        provider: &str,
        api_key: &str,
        model: &str,
        options: ProviderOptions,
    ) -> Result<Self> {
        validate(provider, api_key, model)?;
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::build(ProviderRegistry::global(), provider, api_key, model, options, transport)
    }

    pub fn with_transport(
        provider: &str,
        api_key: &str,
        model: &str,
        options: ProviderOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        Self::build(ProviderRegistry::global(), provider, api_key, model, options, transport)
    }

    pub fn with_registry(
        registry: &ProviderRegistry,
        provider: &str,
        api_key: &str,
        model: &str,
        options: ProviderOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        Self::build(registry, provider, api_key, model, options, transport)
    }

    /// Build from a resolved snapshot; the snapshot's generation settings become the defaults.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.provider().as_str(),
            config.expose_api_key(),
            config.model(),
            config.provider_options(),
        )
    }

    pub fn from_config_with_transport(
        config: &LlmConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        Self::with_transport(
            config.provider().as_str(),
            config.expose_api_key(),
            config.model(),
            config.provider_options(),
            transport,
        )
    }

    fn build(
        registry: &ProviderRegistry,
        provider: &str,
        api_key: &str,
        model: &str,
        options: ProviderOptions,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        validate(provider, api_key, model)?;
        let entry = registry.resolve(provider)?;
        let adapter = (entry.construct)(AdapterSettings::new(api_key, model, options), transport)?;
        tracing::debug!(provider = entry.name, model, "llm client ready");
        Ok(Self {
            provider_name: entry.name,
            adapter,
        })
    }

    /// Canonical name of the resolved provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    pub fn model(&self) -> &str {
        self.adapter.model()
    }

    /// One vendor call. No retry, no internal timeout: wrap the future to impose a deadline.
    #[tracing::instrument(level = "info", skip_all, fields(provider = self.provider_name))]
    pub async fn generate(&self, prompt: &str, overrides: &GenerateOptions) -> Result<LlmResponse> {
        self.adapter.generate(prompt, overrides).await
    }

    pub async fn generate_text(&self, prompt: &str, overrides: &GenerateOptions) -> Result<String> {
        Ok(self.generate(prompt, overrides).await?.text)
    }
}

fn validate(provider: &str, api_key: &str, model: &str) -> Result<()> {
    if provider.trim().is_empty() {
        return Err(LlmError::Validation("provider name is required".to_string()));
    }
    if api_key.trim().is_empty() {
        return Err(LlmError::Validation(
            "an API key is required to initialize the provider".to_string(),
        ));
    }
    if model.trim().is_empty() {
        return Err(LlmError::Validation("model name is required".to_string()));
    }
    Ok(())
}

/// Factory used by callers that don't need to pick a transport.
pub fn create_llm_client(
    provider: &str,
    api_key: &str,
    model: &str,
    options: ProviderOptions,
) -> Result<LlmClient> {
    LlmClient::new(provider, api_key, model, options)
}

/// Every accepted provider spelling: canonical names and aliases.
pub fn supported_providers() -> Vec<&'static str> {
    ProviderRegistry::global().supported_names()
}

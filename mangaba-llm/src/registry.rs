//! Name -> adapter constructor table.

use crate::adapter::{AdapterSettings, ProviderAdapter};
use crate::error::{LlmError, Result};
use crate::provider::{Provider, normalize_provider_name};
use crate::transport::HttpTransport;
use std::sync::{Arc, LazyLock};

pub type AdapterConstructor =
    fn(AdapterSettings, Arc<dyn HttpTransport>) -> Result<Box<dyn ProviderAdapter>>;

#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    pub construct: AdapterConstructor,
}

impl ProviderEntry {
    /// `normalized` must already be trimmed, lowercased and hyphenated.
    pub fn matches(&self, normalized: &str) -> bool {
        self.name == normalized || self.aliases.iter().any(|a| *a == normalized)
    }

    fn spellings(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

static BUILTIN: LazyLock<ProviderRegistry> = LazyLock::new(ProviderRegistry::builtin);

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The four bundled vendors.
    pub fn builtin() -> Self {
        let entry = |provider: Provider, construct: AdapterConstructor| ProviderEntry {
            name: provider.as_str(),
            aliases: provider.aliases(),
            construct,
        };
        Self {
            entries: vec![
                entry(Provider::Google, construct_google),
                entry(Provider::OpenAI, construct_openai),
                entry(Provider::Anthropic, construct_anthropic),
                entry(Provider::HuggingFace, construct_huggingface),
            ],
        }
    }

    /// Shared read-only instance of [`ProviderRegistry::builtin`].
    pub fn global() -> &'static ProviderRegistry {
        &BUILTIN
    }

    /// Add a vendor. Fails if its name or any alias is already claimed.
    pub fn register(&mut self, entry: ProviderEntry) -> Result<()> {
        for spelling in entry.spellings() {
            if let Some(owner) = self.entries.iter().find(|e| e.matches(spelling)) {
                return Err(LlmError::Configuration(format!(
                    "provider spelling '{spelling}' is already registered by '{}'",
                    owner.name
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&ProviderEntry> {
        let normalized = normalize_provider_name(name);
        self.entries
            .iter()
            .find(|e| e.matches(&normalized))
            .ok_or_else(|| LlmError::UnsupportedProvider {
                requested: name.to_string(),
                valid: self.canonical_names(),
            })
    }

    pub fn canonical_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }

    /// Every accepted spelling, sorted and de-duplicated.
    pub fn supported_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.entries.iter().flat_map(|e| e.spellings()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(feature = "google")]
fn construct_google(
    settings: AdapterSettings,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Ok(Box::new(crate::google::GoogleAdapter::new(settings, transport)))
}

#[cfg(feature = "openai")]
fn construct_openai(
    settings: AdapterSettings,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Ok(Box::new(crate::openai::OpenAiAdapter::new(settings, transport)))
}

#[cfg(feature = "anthropic")]
fn construct_anthropic(
    settings: AdapterSettings,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Ok(Box::new(crate::anthropic::AnthropicAdapter::new(
        settings, transport,
    )))
}

#[cfg(feature = "huggingface")]
fn construct_huggingface(
    settings: AdapterSettings,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Ok(Box::new(crate::huggingface::HuggingFaceAdapter::new(
        settings, transport,
    )))
}

#[cfg(not(all(
    feature = "google",
    feature = "openai",
    feature = "anthropic",
    feature = "huggingface"
)))]
fn compiled_out(provider: Provider) -> LlmError {
    LlmError::ProviderUnavailable {
        provider: provider.as_str().to_string(),
        dependency: format!(
            "mangaba-llm built without the `{}` feature",
            provider.as_str()
        ),
    }
}

#[cfg(not(feature = "google"))]
fn construct_google(
    _: AdapterSettings,
    _: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Err(compiled_out(Provider::Google))
}

#[cfg(not(feature = "openai"))]
fn construct_openai(
    _: AdapterSettings,
    _: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Err(compiled_out(Provider::OpenAI))
}

#[cfg(not(feature = "anthropic"))]
fn construct_anthropic(
    _: AdapterSettings,
    _: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Err(compiled_out(Provider::Anthropic))
}

#[cfg(not(feature = "huggingface"))]
fn construct_huggingface(
    _: AdapterSettings,
    _: Arc<dyn HttpTransport>,
) -> Result<Box<dyn ProviderAdapter>> {
    Err(compiled_out(Provider::HuggingFace))
}

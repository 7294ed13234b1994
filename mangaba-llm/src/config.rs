//! Environment-driven configuration.
//!
//! [`LlmConfig::resolve`] turns one read of a key/value source into an immutable snapshot.
//! Resolution is pure: nothing is cached, so re-resolve if the source changes.

use crate::error::{LlmError, Result};
use crate::provider::Provider;
use crate::types::ProviderOptions;
use secrecy::{ExposeSecret, SecretString};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const PROVIDER_KEYS: &[&str] = &["LLM_PROVIDER", "AI_PROVIDER", "PROVIDER"];
pub const MODEL_KEYS: &[&str] = &["MODEL_NAME", "MODEL"];
pub const TEMPERATURE_KEYS: &[&str] = &["MODEL_TEMPERATURE", "TEMPERATURE"];
pub const MAX_OUTPUT_TOKENS_KEYS: &[&str] = &["MAX_OUTPUT_TOKENS", "MAX_TOKENS"];
pub const FALLBACK_API_KEY: &str = "API_KEY";
pub const SYSTEM_PROMPT_KEY: &str = "SYSTEM_PROMPT";
pub const LOG_LEVEL_KEY: &str = "LOG_LEVEL";

pub const DEFAULT_PROVIDER: &str = "google";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// A key/value source the resolver reads from.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// First candidate whose value is set and not blank, with the key that supplied it.
pub fn first_present<'k, S: EnvSource + ?Sized>(
    source: &S,
    candidates: &[&'k str],
) -> Option<(&'k str, String)> {
    candidates.iter().find_map(|key| {
        source
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| (*key, v))
    })
}

pub fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::Google => DEFAULT_MODEL,
        Provider::OpenAI => "gpt-4o-mini",
        Provider::Anthropic => "claude-3-haiku-20240307",
        Provider::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.2",
    }
}

/// Provider-specific API key variables, in lookup order.
pub fn api_key_candidates(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Google => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
        Provider::OpenAI => &["OPENAI_API_KEY"],
        Provider::Anthropic => &["ANTHROPIC_API_KEY"],
        Provider::HuggingFace => &[
            "HUGGINGFACE_API_KEY",
            "HUGGINGFACE_TOKEN",
            "HF_TOKEN",
            "HUGGINGFACEHUB_API_TOKEN",
        ],
    }
}

/// Immutable configuration snapshot.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    provider: Provider,
    model: String,
    api_key: SecretString,
    temperature: f64,
    max_output_tokens: u32,
    system_prompt: Option<String>,
    log_level: String,
}

static PROCESS_CONFIG: OnceLock<LlmConfig> = OnceLock::new();

impl LlmConfig {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn resolve<S: EnvSource + ?Sized>(source: &S) -> Result<Self> {
        let (provider_key, raw_provider) = first_present(source, PROVIDER_KEYS)
            .map(|(k, v)| (Some(k), v))
            .unwrap_or((None, DEFAULT_PROVIDER.to_string()));
        let provider =
            Provider::lookup(&raw_provider).ok_or_else(|| LlmError::UnsupportedProvider {
                requested: raw_provider.clone(),
                valid: Provider::canonical_names(),
            })?;
        tracing::debug!(?provider_key, %provider, "resolved provider");

        let model = match first_present(source, MODEL_KEYS) {
            Some((key, model)) => {
                tracing::debug!(model_key = key, %model, "resolved model");
                model
            }
            None => default_model(provider).to_string(),
        };

        let api_key = first_present(source, api_key_candidates(provider))
            .or_else(|| first_present(source, &[FALLBACK_API_KEY]))
            .map(|(key, value)| {
                tracing::debug!(api_key_source = key, "resolved api key");
                SecretString::from(value)
            })
            .ok_or_else(|| {
                LlmError::Configuration(format!(
                    "no API key found for provider '{provider}'; set one of {} or {FALLBACK_API_KEY}",
                    api_key_candidates(provider).join(", ")
                ))
            })?;

        let temperature = parse_number(source, TEMPERATURE_KEYS, DEFAULT_TEMPERATURE)?;
        let max_output_tokens =
            parse_number(source, MAX_OUTPUT_TOKENS_KEYS, DEFAULT_MAX_OUTPUT_TOKENS)?;

        let system_prompt = first_present(source, &[SYSTEM_PROMPT_KEY]).map(|(_, v)| v);
        let log_level = first_present(source, &[LOG_LEVEL_KEY])
            .map(|(_, v)| v)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            provider,
            model,
            api_key,
            temperature,
            max_output_tokens,
            system_prompt,
            log_level,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::resolve(&ProcessEnv)
    }

    /// Process-wide snapshot, resolved from the process environment on first successful call.
    ///
    /// Later calls return the same snapshot even if the environment has changed since.
    pub fn process() -> Result<&'static LlmConfig> {
        if let Some(cfg) = PROCESS_CONFIG.get() {
            return Ok(cfg);
        }
        let cfg = Self::from_env()?;
        Ok(PROCESS_CONFIG.get_or_init(|| cfg))
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Adapter defaults carried by this snapshot.
    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            temperature: Some(self.temperature),
            max_output_tokens: Some(self.max_output_tokens),
            system_prompt: self.system_prompt.clone(),
            ..ProviderOptions::default()
        }
    }

    pub(crate) fn expose_api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl fmt::Display for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LlmConfig(provider={}, model={}, log_level={})",
            self.provider, self.model, self.log_level
        )
    }
}

fn parse_number<S, T>(source: &S, keys: &[&str], default: T) -> Result<T>
where
    S: EnvSource + ?Sized,
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some((key, raw)) = first_present(source, keys) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .map_err(|e| LlmError::Configuration(format!("{key}={raw:?} is not a valid number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_present_respects_order_and_skips_blank() {
        let source = env(&[("MODEL_NAME", "  "), ("MODEL", "gpt-4o")]);
        assert_eq!(
            first_present(&source, MODEL_KEYS),
            Some(("MODEL", "gpt-4o".to_string()))
        );

        let source = env(&[("MODEL_NAME", "a"), ("MODEL", "b")]);
        assert_eq!(
            first_present(&source, MODEL_KEYS),
            Some(("MODEL_NAME", "a".to_string()))
        );

        assert_eq!(first_present(&env(&[]), MODEL_KEYS), None);
    }

    #[test]
    fn alias_provider_with_explicit_model() {
        let cfg = LlmConfig::resolve(&env(&[
            ("PROVIDER", "gpt"),
            ("MODEL", "gpt-4o-mini"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .expect("config resolves");
        assert_eq!(cfg.provider(), Provider::OpenAI);
        assert_eq!(cfg.model(), "gpt-4o-mini");
        assert_eq!(cfg.api_key().expose_secret(), "sk-test");
        assert_eq!(cfg.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(cfg.max_output_tokens(), DEFAULT_MAX_OUTPUT_TOKENS);
        assert_eq!(cfg.system_prompt(), None);
        assert_eq!(cfg.log_level(), "INFO");
    }

    #[test]
    fn provider_precedence_follows_variable_order() {
        let cfg = LlmConfig::resolve(&env(&[
            ("LLM_PROVIDER", "claude"),
            ("AI_PROVIDER", "hf"),
            ("PROVIDER", "gpt"),
            ("API_KEY", "k"),
        ]))
        .expect("config resolves");
        assert_eq!(cfg.provider(), Provider::Anthropic);
        assert_eq!(cfg.model(), "claude-3-haiku-20240307");
    }

    #[test]
    fn provider_spelling_matches_registry_lookup() {
        for raw in [" Google_AI ", "GEMINI", "Hugging_Face", "ChatGPT"] {
            let cfg = LlmConfig::resolve(&env(&[("LLM_PROVIDER", raw), ("API_KEY", "k")]))
                .expect("config resolves");
            assert_eq!(Some(cfg.provider()), Provider::lookup(raw), "{raw}");
        }
    }

    #[test]
    fn defaults_to_google_and_fails_without_key() {
        let err = LlmConfig::resolve(&env(&[])).expect_err("no key anywhere");
        match err {
            LlmError::Configuration(msg) => {
                assert!(msg.contains("'google'"), "{msg}");
                assert!(msg.contains("GOOGLE_API_KEY"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_key_is_not_accepted() {
        let err = LlmConfig::resolve(&env(&[("GOOGLE_API_KEY", ""), ("API_KEY", "   ")]))
            .expect_err("blank keys");
        assert!(matches!(err, LlmError::Configuration(_)));
    }

    #[test]
    fn key_for_other_provider_does_not_count() {
        let err = LlmConfig::resolve(&env(&[
            ("LLM_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .expect_err("wrong provider key");
        assert!(matches!(err, LlmError::Configuration(_)));
    }

    #[test]
    fn huggingface_key_candidates_in_order() {
        let cfg = LlmConfig::resolve(&env(&[
            ("LLM_PROVIDER", "HF"),
            ("HF_TOKEN", "hf_third"),
            ("HUGGINGFACEHUB_API_TOKEN", "hf_fourth"),
            ("API_KEY", "generic"),
        ]))
        .expect("config resolves");
        assert_eq!(cfg.provider(), Provider::HuggingFace);
        assert_eq!(cfg.api_key().expose_secret(), "hf_third");
        assert_eq!(cfg.model(), "mistralai/Mistral-7B-Instruct-v0.2");
    }

    #[test]
    fn generic_fallback_key_is_used_last() {
        let cfg = LlmConfig::resolve(&env(&[("API_KEY", "generic")])).expect("config resolves");
        assert_eq!(cfg.provider(), Provider::Google);
        assert_eq!(cfg.api_key().expose_secret(), "generic");
        assert_eq!(cfg.model(), DEFAULT_MODEL);

        let cfg = LlmConfig::resolve(&env(&[("GEMINI_API_KEY", "gem"), ("API_KEY", "generic")]))
            .expect("config resolves");
        assert_eq!(cfg.api_key().expose_secret(), "gem");
    }

    #[test]
    fn unsupported_provider_is_rejected() {
        let err = LlmConfig::resolve(&env(&[("LLM_PROVIDER", "mistral"), ("API_KEY", "k")]))
            .expect_err("unsupported");
        match err {
            LlmError::UnsupportedProvider { requested, valid } => {
                assert_eq!(requested, "mistral");
                assert_eq!(valid.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_settings_are_parsed() {
        let cfg = LlmConfig::resolve(&env(&[
            ("API_KEY", "k"),
            ("TEMPERATURE", "0.1"),
            ("MODEL_TEMPERATURE", "0.3"),
            ("MAX_TOKENS", "256"),
            ("SYSTEM_PROMPT", "You are terse."),
            ("LOG_LEVEL", "debug"),
        ]))
        .expect("config resolves");
        assert_eq!(cfg.temperature(), 0.3);
        assert_eq!(cfg.max_output_tokens(), 256);
        assert_eq!(cfg.system_prompt(), Some("You are terse."));
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn non_numeric_settings_fail() {
        let err = LlmConfig::resolve(&env(&[("API_KEY", "k"), ("TEMPERATURE", "warm")]))
            .expect_err("bad temperature");
        match err {
            LlmError::Configuration(msg) => assert!(msg.contains("TEMPERATURE"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = LlmConfig::resolve(&env(&[("API_KEY", "k"), ("MAX_OUTPUT_TOKENS", "1.5")]))
            .expect_err("bad max tokens");
        assert!(matches!(err, LlmError::Configuration(_)));
    }

    #[test]
    fn display_and_debug_never_show_the_key() {
        let cfg = LlmConfig::resolve(&env(&[
            ("OPENAI_API_KEY", "sk-secret"),
            ("PROVIDER", "openai"),
        ]))
        .expect("config resolves");
        let shown = cfg.to_string();
        assert_eq!(
            shown,
            "LlmConfig(provider=openai, model=gpt-4o-mini, log_level=INFO)"
        );
        assert!(!format!("{cfg:?}").contains("sk-secret"));
    }

    #[test]
    fn snapshot_carries_adapter_defaults() {
        let cfg = LlmConfig::resolve(&env(&[("API_KEY", "k"), ("SYSTEM_PROMPT", "hi")]))
            .expect("config resolves");
        let options = cfg.provider_options();
        assert_eq!(options.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(options.max_output_tokens, Some(DEFAULT_MAX_OUTPUT_TOKENS));
        assert_eq!(options.system_prompt.as_deref(), Some("hi"));
        assert_eq!(options.base_url, None);
    }
}

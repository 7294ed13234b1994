//! Provider-agnostic LLM client for Mangaba.
//!
//! Resolves environment configuration into one snapshot ([`LlmConfig`]) and dispatches
//! single-prompt generation to Google Gemini, OpenAI, Anthropic or Hugging Face through
//! [`LlmClient`]. Pure HTTP client; conversation state belongs to the caller.

mod adapter;
#[cfg(feature = "anthropic")]
mod anthropic;
mod client;
mod config;
mod error;
#[cfg(feature = "google")]
mod google;
#[cfg(feature = "huggingface")]
mod huggingface;
#[cfg(feature = "openai")]
mod openai;
mod provider;
mod registry;
mod transport;
mod types;

pub use adapter::{AdapterSettings, ProviderAdapter};
#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicAdapter;
pub use client::{LlmClient, create_llm_client, supported_providers};
pub use config::{
    EnvSource, LlmConfig, ProcessEnv, api_key_candidates, default_model, first_present,
};
pub use error::{GenerationFailure, LlmError, Result};
#[cfg(feature = "google")]
pub use google::GoogleAdapter;
#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceAdapter;
#[cfg(feature = "openai")]
pub use openai::OpenAiAdapter;
pub use provider::{Provider, canonicalize, normalize_provider_name};
pub use registry::{AdapterConstructor, ProviderEntry, ProviderRegistry};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use types::{GenerateOptions, LlmResponse, ProviderOptions};

use crate::adapter::{AdapterSettings, ProviderAdapter};
use crate::error::{GenerationFailure, LlmError, Result};
use crate::transport::{HttpRequest, HttpTransport, join_url, send_json};
use crate::types::{GenerateOptions, GenerationDefaults, LlmResponse};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const NAME: &str = "anthropic";

// `max_tokens` is mandatory on the Messages API, so there is always a value to send.
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicAdapter {
    transport: Arc<dyn HttpTransport>,
    api_key: SecretString,
    model: String,
    url: String,
    top_p: Option<f64>,
    top_k: Option<u32>,
    defaults: GenerationDefaults,
}

impl AnthropicAdapter {
    pub fn new(settings: AdapterSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let url = join_url(settings.base_url(ANTHROPIC_API_BASE), ANTHROPIC_MESSAGES_PATH);
        Self {
            transport,
            defaults: GenerationDefaults::from_options(
                &settings.options,
                Some(0.7),
                Some(DEFAULT_MAX_TOKENS),
            ),
            top_p: settings.options.top_p,
            top_k: settings.options.top_k,
            api_key: settings.api_key,
            model: settings.model,
            url,
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str, overrides: &GenerateOptions) -> Result<LlmResponse> {
        let settings = self.defaults.merge(overrides);
        let req = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: settings.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: settings.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            system: settings.system_prompt,
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![AnthropicContentBlock::Text {
                    text: prompt.to_string(),
                }],
            }],
        };

        let raw = send_json(
            self.transport.as_ref(),
            NAME,
            HttpRequest {
                url: self.url.clone(),
                headers: vec![
                    ("x-api-key", self.api_key.expose_secret().to_string()),
                    ("anthropic-version", ANTHROPIC_VERSION.to_string()),
                ],
                body: serde_json::to_value(&req).map_err(|e| {
                    LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
                })?,
            },
        )
        .await?;

        let parsed: AnthropicResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
        })?;
        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } if !text.is_empty() => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            tracing::warn!(stop_reason = ?parsed.stop_reason, "anthropic returned no text");
        }
        Ok(LlmResponse::new(text, raw))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

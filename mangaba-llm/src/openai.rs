use crate::adapter::{AdapterSettings, ProviderAdapter};
use crate::error::{GenerationFailure, LlmError, Result};
use crate::transport::{HttpRequest, HttpTransport, join_url, send_json};
use crate::types::{GenerateOptions, GenerationDefaults, LlmResponse};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const OPENAI_API_BASE: &str = "https://api.openai.com";
const OPENAI_CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const NAME: &str = "openai";

pub struct OpenAiAdapter {
    transport: Arc<dyn HttpTransport>,
    api_key: SecretString,
    model: String,
    url: String,
    top_p: Option<f64>,
    defaults: GenerationDefaults,
}

impl OpenAiAdapter {
    pub fn new(settings: AdapterSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let url = join_url(
            settings.base_url(OPENAI_API_BASE),
            OPENAI_CHAT_COMPLETIONS_PATH,
        );
        Self {
            transport,
            defaults: GenerationDefaults::from_options(&settings.options, Some(0.7), Some(1024)),
            top_p: settings.options.top_p,
            api_key: settings.api_key,
            model: settings.model,
            url,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str, overrides: &GenerateOptions) -> Result<LlmResponse> {
        let settings = self.defaults.merge(overrides);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = settings.system_prompt {
            messages.push(OpenAiMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(OpenAiMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let req = OpenAiChatRequest {
            model: self.model.clone(),
            messages,
            temperature: settings.temperature,
            max_tokens: settings.max_output_tokens,
            top_p: self.top_p,
        };

        let raw = send_json(
            self.transport.as_ref(),
            NAME,
            HttpRequest {
                url: self.url.clone(),
                headers: vec![(
                    "authorization",
                    format!("Bearer {}", self.api_key.expose_secret()),
                )],
                body: serde_json::to_value(&req).map_err(|e| {
                    LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
                })?,
            },
        )
        .await?;

        let parsed: OpenAiChatResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
        })?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            LlmError::generation(
                NAME,
                GenerationFailure::ResponseFormat,
                "openai response missing choices",
            )
        })?;

        Ok(LlmResponse::new(
            choice.message.content.unwrap_or_default(),
            raw,
        ))
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

//! Google Gemini (Generative Language API) adapter.

use crate::adapter::{AdapterSettings, ProviderAdapter};
use crate::error::{GenerationFailure, LlmError, Result};
use crate::transport::{HttpRequest, HttpTransport, join_url, send_json};
use crate::types::{GenerateOptions, GenerationDefaults, LlmResponse};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const NAME: &str = "google";

pub struct GoogleAdapter {
    transport: Arc<dyn HttpTransport>,
    api_key: SecretString,
    model: String,
    url: String,
    top_p: Option<f64>,
    top_k: Option<u32>,
    // Only explicitly configured values are sent; Gemini applies its own defaults otherwise.
    defaults: GenerationDefaults,
}

impl GoogleAdapter {
    pub fn new(settings: AdapterSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let model_path = settings
            .model
            .strip_prefix("models/")
            .unwrap_or(&settings.model);
        let url = join_url(
            settings.base_url(GEMINI_API_BASE),
            &format!("/v1beta/models/{model_path}:generateContent"),
        );
        Self {
            transport,
            defaults: GenerationDefaults::from_options(&settings.options, None, None),
            top_p: settings.options.top_p,
            top_k: settings.options.top_k,
            api_key: settings.api_key,
            model: settings.model,
            url,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str, overrides: &GenerateOptions) -> Result<LlmResponse> {
        let settings = self.defaults.merge(overrides);

        let generation_config = GeminiGenerationConfig {
            temperature: settings.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: settings.max_output_tokens,
        };
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            system_instruction: settings.system_prompt.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(text) }],
            }),
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        };

        let raw = send_json(
            self.transport.as_ref(),
            NAME,
            HttpRequest {
                url: self.url.clone(),
                headers: vec![("x-goog-api-key", self.api_key.expose_secret().to_string())],
                body: serde_json::to_value(&req).map_err(|e| {
                    LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
                })?,
            },
        )
        .await?;

        let parsed: GeminiResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
        })?;

        // A blocked prompt comes back with no candidates and a `promptFeedback` block.
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            tracing::warn!(
                block_reason = ?parsed.prompt_feedback.and_then(|f| f.block_reason),
                "gemini returned no text"
            );
        }
        Ok(LlmResponse::new(text, raw))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GeminiGenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_output_tokens.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use crate::types::ProviderOptions;
    use serde_json::json;

    fn adapter(t: &Arc<RecordingTransport>, options: ProviderOptions) -> GoogleAdapter {
        GoogleAdapter::new(
            AdapterSettings::new("AIza-test", "gemini-2.5-flash", options),
            t.clone(),
        )
    }

    fn candidate(parts: serde_json::Value) -> serde_json::Value {
        json!({
            "candidates": [{"content": {"role": "model", "parts": parts}, "finishReason": "STOP"}]
        })
    }

    #[tokio::test]
    async fn request_uses_generation_config_and_system_instruction() {
        let t = Arc::new(RecordingTransport::replying(
            200,
            candidate(json!([{"text": "Ol"}, {"text": "á"}])),
        ));
        let a = adapter(
            &t,
            ProviderOptions::default()
                .with_temperature(0.5)
                .with_max_output_tokens(300)
                .with_system_prompt("answer in Portuguese"),
        );
        let resp = a
            .generate("hello", &GenerateOptions::default())
            .await
            .expect("generate");
        assert_eq!(resp.text, "Olá");

        assert_eq!(
            t.requests()[0].url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(t.header("x-goog-api-key").as_deref(), Some("AIza-test"));
        assert_eq!(
            t.last_body(),
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "systemInstruction": {"parts": [{"text": "answer in Portuguese"}]},
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 300}
            })
        );
    }

    #[tokio::test]
    async fn unconfigured_settings_are_omitted() {
        let t = Arc::new(RecordingTransport::replying(200, candidate(json!([{"text": "x"}]))));
        adapter(&t, ProviderOptions::default())
            .generate("hello", &GenerateOptions::default())
            .await
            .expect("generate");
        let body = t.last_body();
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());

        t.push(200, candidate(json!([{"text": "y"}])));
        adapter(&t, ProviderOptions::default())
            .generate("hello", &GenerateOptions::default().with_max_output_tokens(5))
            .await
            .expect("generate");
        assert_eq!(
            t.last_body()["generationConfig"],
            json!({"maxOutputTokens": 5})
        );
    }

    #[tokio::test]
    async fn blocked_prompt_yields_empty_text() {
        let t = Arc::new(RecordingTransport::replying(
            200,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        ));
        let resp = adapter(&t, ProviderOptions::default())
            .generate("hello", &GenerateOptions::default())
            .await
            .expect("generate");
        assert_eq!(resp.text, "");
        assert_eq!(resp.raw["promptFeedback"]["blockReason"], "SAFETY");
    }

    #[tokio::test]
    async fn bad_key_is_an_auth_error() {
        let t = Arc::new(RecordingTransport::replying(
            403,
            json!({"error": {"code": 403, "status": "PERMISSION_DENIED"}}),
        ));
        let err = adapter(&t, ProviderOptions::default())
            .generate("hello", &GenerateOptions::default())
            .await
            .expect_err("403");
        assert_eq!(err.generation_failure(), Some(GenerationFailure::Auth));
    }

    #[test]
    fn models_prefix_is_not_doubled() {
        let t = Arc::new(RecordingTransport::default());
        let a = GoogleAdapter::new(
            AdapterSettings::new("k", "models/gemini-pro", ProviderOptions::default()),
            t,
        );
        assert!(a.url.ends_with("/v1beta/models/gemini-pro:generateContent"));
        assert_eq!(a.model(), "models/gemini-pro");
    }
}

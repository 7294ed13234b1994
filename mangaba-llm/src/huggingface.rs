//! Hugging Face Inference API adapter (text-generation task).
//!
//! The task takes a single raw prompt and has no system role, so a configured system prompt is
//! not sent. It is also not merged into the user prompt.

use crate::adapter::{AdapterSettings, ProviderAdapter};
use crate::error::{GenerationFailure, LlmError, Result};
use crate::transport::{HttpRequest, HttpTransport, join_url, send_json};
use crate::types::{GenerateOptions, GenerationDefaults, LlmResponse};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co";
const NAME: &str = "huggingface";

pub struct HuggingFaceAdapter {
    transport: Arc<dyn HttpTransport>,
    api_key: SecretString,
    model: String,
    url: String,
    top_p: Option<f64>,
    top_k: Option<u32>,
    defaults: GenerationDefaults,
}

impl HuggingFaceAdapter {
    pub fn new(settings: AdapterSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let url = join_url(
            settings.base_url(HF_INFERENCE_BASE),
            &format!("/models/{}", settings.model),
        );
        Self {
            transport,
            defaults: GenerationDefaults::from_options(&settings.options, Some(0.7), Some(512)),
            top_p: settings.options.top_p,
            top_k: settings.options.top_k,
            api_key: settings.api_key,
            model: settings.model,
            url,
        }
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str, overrides: &GenerateOptions) -> Result<LlmResponse> {
        let settings = self.defaults.merge(overrides);
        if settings.system_prompt.is_some() {
            tracing::debug!("text-generation has no system role; system prompt not sent");
        }

        let req = HfTextGenerationRequest {
            inputs: prompt.to_string(),
            parameters: HfParameters {
                max_new_tokens: settings.max_output_tokens,
                temperature: settings.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
                return_full_text: false,
            },
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

        // A loaded-but-failing model can still answer 200 with an error object.
        if let Some(error) = raw.get("error") {
            let message = error.as_str().map_or_else(|| error.to_string(), str::to_string);
            return Err(LlmError::generation(
                NAME,
                GenerationFailure::ResponseFormat,
                format!("huggingface returned an error body: {message}"),
            ));
        }

        let parsed: HfTextGenerationResponse =
            serde_json::from_value(raw.clone()).map_err(|e| {
                LlmError::generation(NAME, GenerationFailure::ResponseFormat, e.to_string())
            })?;
        Ok(LlmResponse::new(parsed.into_text(), raw))
    }
}

#[derive(Debug, Serialize)]
struct HfTextGenerationRequest {
    inputs: String,
    parameters: HfParameters,
}

#[derive(Debug, Serialize)]
struct HfParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct HfGenerated {
    generated_text: String,
}

/// The endpoint answers with a list, a single object, or occasionally a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfTextGenerationResponse {
    Text(String),
    List(Vec<HfGenerated>),
    Single(HfGenerated),
}

impl HfTextGenerationResponse {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::List(items) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .unwrap_or_default(),
            Self::Single(g) => g.generated_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use crate::types::ProviderOptions;
    use serde_json::json;

    fn adapter(t: &Arc<RecordingTransport>, options: ProviderOptions) -> HuggingFaceAdapter {
        HuggingFaceAdapter::new(
            AdapterSettings::new(
                "hf_test",
                "mistralai/Mistral-7B-Instruct-v0.2",
                options,
            ),
            t.clone(),
        )
    }

    #[tokio::test]
    async fn system_prompt_is_dropped_not_merged() {
        let t = Arc::new(RecordingTransport::replying(
            200,
            json!([{"generated_text": "4"}]),
        ));
        let a = adapter(&t, ProviderOptions::default().with_system_prompt("be a pirate"));
        let resp = a
            .generate("2+2=", &GenerateOptions::default())
            .await
            .expect("generate");
        assert_eq!(resp.text, "4");

        assert_eq!(
            t.requests()[0].url,
            "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2"
        );
        assert_eq!(t.header("authorization").as_deref(), Some("Bearer hf_test"));
        assert_eq!(
            t.last_body(),
            json!({
                "inputs": "2+2=",
                "parameters": {
                    "max_new_tokens": 512,
                    "temperature": 0.7,
                    "return_full_text": false
                }
            })
        );
    }

    #[tokio::test]
    async fn single_object_and_bare_string_payloads() {
        let t = Arc::new(RecordingTransport::replying(
            200,
            json!({"generated_text": "hello"}),
        ));
        t.push(200, json!("plain"));
        t.push(200, json!([]));
        let a = adapter(&t, ProviderOptions::default());

        for expected in ["hello", "plain", ""] {
            let resp = a
                .generate("x", &GenerateOptions::default())
                .await
                .expect("generate");
            assert_eq!(resp.text, expected);
        }
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_format_error() {
        let t = Arc::new(RecordingTransport::replying(200, json!(42)));
        let err = adapter(&t, ProviderOptions::default())
            .generate("x", &GenerateOptions::default())
            .await
            .expect_err("number payload");
        assert_eq!(
            err.generation_failure(),
            Some(GenerationFailure::ResponseFormat)
        );
    }

    #[tokio::test]
    async fn error_object_with_ok_status_is_a_format_error() {
        let t = Arc::new(RecordingTransport::replying(
            200,
            json!({"error": "Model too busy"}),
        ));
        let err = adapter(&t, ProviderOptions::default())
            .generate("x", &GenerateOptions::default())
            .await
            .expect_err("error body");
        assert_eq!(
            err.generation_failure(),
            Some(GenerationFailure::ResponseFormat)
        );
        assert!(err.to_string().contains("Model too busy"), "{err}");
    }

    #[tokio::test]
    async fn object_without_generated_text_is_a_format_error() {
        let t = Arc::new(RecordingTransport::replying(200, json!({"warnings": []})));
        t.push(200, json!([{"score": 0.9}]));
        let a = adapter(&t, ProviderOptions::default());
        for _ in 0..2 {
            let err = a
                .generate("x", &GenerateOptions::default())
                .await
                .expect_err("no generated_text");
            assert_eq!(
                err.generation_failure(),
                Some(GenerationFailure::ResponseFormat)
            );
        }
    }

    #[tokio::test]
    async fn model_loading_is_a_status_error() {
        let t = Arc::new(RecordingTransport::replying(
            503,
            json!({"error": "Model is currently loading", "estimated_time": 20.0}),
        ));
        let err = adapter(&t, ProviderOptions::default())
            .generate("x", &GenerateOptions::default())
            .await
            .expect_err("503");
        assert_eq!(err.generation_failure(), Some(GenerationFailure::Status));
        assert!(err.to_string().contains("currently loading"));
    }
}

use anyhow::Context;
use clap::Args;
use mangaba_llm::{GenerateOptions, LlmClient, LlmConfig, Provider};
use std::time::Duration;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Prompt text.
    pub prompt: String,
    /// Override the configured temperature for this call.
    #[arg(long)]
    pub temperature: Option<f64>,
    /// Override the configured output token limit for this call.
    #[arg(long)]
    pub max_output_tokens: Option<u32>,
    /// Override the configured system prompt for this call.
    #[arg(long)]
    pub system_prompt: Option<String>,
    /// Abandon the call after this many seconds.
    #[arg(long, env = "MANGABA_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl AskArgs {
    fn overrides(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            system_prompt: self.system_prompt.clone(),
        }
    }
}

#[tracing::instrument(level = "info", skip_all, fields(provider = %config.provider()))]
pub async fn ask(config: LlmConfig, args: AskArgs) -> anyhow::Result<()> {
    let client = LlmClient::from_config(&config)?;
    let overrides = args.overrides();
    let call = client.generate_text(&args.prompt, &overrides);

    let text = match args.timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .with_context(|| format!("{} did not answer within {secs}s", client.provider_name()))??,
        None => call.await?,
    };

    if text.is_empty() {
        tracing::warn!(model = client.model(), "provider returned no text");
    }
    println!("{text}");
    Ok(())
}

pub fn providers() {
    for line in provider_lines() {
        println!("{line}");
    }
}

fn provider_lines() -> Vec<String> {
    Provider::ALL
        .iter()
        .map(|p| {
            let aliases = p.aliases();
            if aliases.is_empty() {
                p.as_str().to_string()
            } else {
                format!("{} (aliases: {})", p.as_str(), aliases.join(", "))
            }
        })
        .collect()
}

pub fn show_config(config: mangaba_llm::Result<LlmConfig>) -> anyhow::Result<()> {
    let config = config.context("configuration could not be resolved")?;
    println!("{config}");
    println!("temperature={}", config.temperature());
    println!("max_output_tokens={}", config.max_output_tokens());
    println!(
        "system_prompt={}",
        if config.system_prompt().is_some() {
            "set"
        } else {
            "unset"
        }
    );
    Ok(())
}

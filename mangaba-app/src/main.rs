//! Mangaba command-line entry point.
//!
//! Resolves configuration once from the environment (after loading `.env`), builds one
//! `mangaba_llm::LlmClient`, and answers a single prompt per invocation.

mod commands;

use clap::{Parser, Subcommand};
use mangaba_llm::LlmConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "mangaba", version, about = "Mangaba provider-agnostic LLM client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one prompt to the configured provider and print the reply.
    Ask(commands::AskArgs),
    /// List supported providers and their aliases.
    Providers,
    /// Show the resolved configuration (API key redacted).
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Resolution errors are reported after tracing is up, except for `config` which prints them.
    let config = LlmConfig::from_env();
    let log_level = config
        .as_ref()
        .map(|c| c.log_level().to_string())
        .unwrap_or_else(|_| "INFO".to_string());
    init_tracing(&log_level)?;
    install_panic_hook();
    tracing::debug!(dotenv = ?dotenv, "environment loaded");

    match cli.command {
        Command::Ask(args) => commands::ask(config?, args).await,
        Command::Providers => {
            commands::providers();
            Ok(())
        }
        Command::Config => commands::show_config(config),
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let requested_level = filter_level(log_level);
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => {
            let level = requested_level.unwrap_or("info");
            EnvFilter::new(format!("warn,mangaba={level},mangaba_llm={level}"))
        }
    };
    let log_format = std::env::var("MANGABA_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    // Logs go to stderr so stdout carries only the model's reply.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);

    match log_format.as_str() {
        "json" => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
        "pretty" => builder.with_file(true).with_line_number(true).pretty().init(),
        "compact" => builder.compact().init(),
        other => {
            return Err(anyhow::anyhow!(
                "unsupported MANGABA_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    if requested_level.is_none() {
        tracing::warn!(
            log_level = %log_level,
            "unrecognized LOG_LEVEL; expected trace, debug, info, warning, error, critical or off; using info"
        );
    }
    tracing::debug!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

/// Map a `LOG_LEVEL` value (including Python-style names) onto a tracing level.
///
/// `None` means the value is not a level name; the caller falls back to `info`.
fn filter_level(log_level: &str) -> Option<&'static str> {
    match log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        "off" => Some("off"),
        _ => None,
    }
}

/// Report panics through tracing (so they show up in json logs) before the default hook runs.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let at = info
            .location()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::error!(
            target: "mangaba",
            at = %at,
            reason = %panic_reason(info.payload()),
            thread = std::thread::current().name().unwrap_or("<unnamed>"),
            "mangaba panicked"
        );
        previous(info);
    }));
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>")
}

//! Canonical provider names and the alias table.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    OpenAI,
    Anthropic,
    HuggingFace,
}

/// Raw spelling (already normalized) -> canonical provider.
const ALIASES: &[(&str, Provider)] = &[
    ("gemini", Provider::Google),
    ("google-ai", Provider::Google),
    ("googleai", Provider::Google),
    ("gpt", Provider::OpenAI),
    ("chatgpt", Provider::OpenAI),
    ("claude", Provider::Anthropic),
    ("hf", Provider::HuggingFace),
    ("hugging-face", Provider::HuggingFace),
];

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Google,
        Provider::OpenAI,
        Provider::Anthropic,
        Provider::HuggingFace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::HuggingFace => "huggingface",
        }
    }

    pub fn aliases(self) -> Vec<&'static str> {
        ALIASES
            .iter()
            .filter(|(_, p)| *p == self)
            .map(|(alias, _)| *alias)
            .collect()
    }

    /// Sorted canonical names, as listed in error messages.
    pub fn canonical_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Normalize and look up a raw spelling. `None` when it names no known provider.
    pub fn lookup(raw: &str) -> Option<Self> {
        let normalized = normalize_provider_name(raw);
        let canonical = canonicalize(&normalized);
        Self::ALL.into_iter().find(|p| p.as_str() == canonical)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s).ok_or_else(|| LlmError::UnsupportedProvider {
            requested: s.to_string(),
            valid: Self::canonical_names(),
        })
    }
}

/// Trim, lowercase and map `_` to `-`.
pub fn normalize_provider_name(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('_', "-")
}

/// Apply the alias table to an already-normalized name. Unknown names pass through unchanged.
pub fn canonicalize(normalized: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, p)| p.as_str())
        .unwrap_or(normalized)
}

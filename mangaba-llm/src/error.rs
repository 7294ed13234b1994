use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported provider {requested:?}; valid providers: {}", .valid.join(", "))]
    UnsupportedProvider {
        requested: String,
        valid: Vec<&'static str>,
    },

    #[error("provider {provider} unavailable: missing dependency {dependency}")]
    ProviderUnavailable {
        provider: String,
        dependency: String,
    },

    #[error("{provider} generation failed ({kind}): {message}")]
    Generation {
        provider: String,
        kind: GenerationFailure,
        message: String,
    },

    #[error("invalid input: {0}")]
    Validation(String),
}

/// What went wrong during a vendor call. All kinds surface as [`LlmError::Generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationFailure {
    Transport,
    Auth,
    RateLimit,
    Status,
    ResponseFormat,
}

impl GenerationFailure {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            _ => Self::Status,
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::RateLimit => "rate limit",
            Self::Status => "status",
            Self::ResponseFormat => "response format",
        };
        f.write_str(s)
    }
}

impl LlmError {
    pub(crate) fn generation(
        provider: &str,
        kind: GenerationFailure,
        message: impl Into<String>,
    ) -> Self {
        Self::Generation {
            provider: provider.to_string(),
            kind,
            message: message.into(),
        }
    }

    /// The failure kind when this is a generation error.
    pub fn generation_failure(&self) -> Option<GenerationFailure> {
        match self {
            Self::Generation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

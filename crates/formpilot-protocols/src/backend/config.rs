//! Generation configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Upper bound on new tokens for every decoding strategy, except where the
/// backend's own service manages length.
pub const MAX_NEW_TOKENS: usize = 32;

/// Which backend variant serves generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Ollama,
    Local,
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "local" | "huggingface" | "onnx" => Ok(Self::Local),
            other => Err(BackendError::InvalidConfig(format!("unknown backend '{}'", other))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => f.write_str("ollama"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Algorithm used to pick the next token(s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodingStrategy {
    #[default]
    Greedy,
    Beam,
    TopK,
    TopP,
    Custom,
}

impl DecodingStrategy {
    pub const ALL: [DecodingStrategy; 5] = [
        Self::Greedy,
        Self::Beam,
        Self::TopK,
        Self::TopP,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::Beam => "beam",
            Self::TopK => "top_k",
            Self::TopP => "top_p",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for DecodingStrategy {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| {
                BackendError::InvalidConfig(format!("unknown decoding strategy '{}'", s.trim()))
            })
    }
}

impl fmt::Display for DecodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters consulted by the strategies that need them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            beam_size: default_beam_size(),
            top_k: default_top_k(),
            top_p: default_top_p(),
        }
    }
}

fn default_beam_size() -> usize {
    4
}

fn default_top_k() -> usize {
    50
}

fn default_top_p() -> f32 {
    0.9
}

/// Immutable generation settings, snapshotted once per command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub backend: BackendKind,
    pub model_name: String,
    pub strategy: DecodingStrategy,
    pub params: DecodingParams,
    /// Deliver the answer through `stream_generate`.
    #[serde(default)]
    pub stream: bool,
}

impl GenerationConfig {
    pub fn new(backend: BackendKind, model_name: impl Into<String>) -> Self {
        Self {
            backend,
            model_name: model_name.into(),
            strategy: DecodingStrategy::default(),
            params: DecodingParams::default(),
            stream: false,
        }
    }

    pub fn with_strategy(mut self, strategy: DecodingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_params(mut self, params: DecodingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(BackendKind::Ollama, "mistral")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

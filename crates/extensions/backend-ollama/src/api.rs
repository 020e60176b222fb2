//! Ollama REST API types.

use serde::{Deserialize, Serialize};

use formpilot_protocols::{DecodingStrategy, GenerationConfig};

/// Temperature used alongside top-k and top-p sampling.
const SAMPLING_TEMPERATURE: f32 = 0.7;
const QUESTION_TEMPERATURE: f32 = 1.5;
const STATEMENT_TEMPERATURE: f32 = 0.9;

/// `POST /api/generate` body.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Sampling options understood by Ollama.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl GenerateOptions {
    /// Map a decoding strategy onto Ollama options.
    ///
    /// Beam search has no Ollama equivalent, so the server defaults apply.
    pub fn for_strategy(config: &GenerationConfig, label_is_question: bool) -> Option<Self> {
        match config.strategy {
            DecodingStrategy::Greedy => Some(Self {
                temperature: Some(0.0),
                ..Self::default()
            }),
            DecodingStrategy::Beam => None,
            DecodingStrategy::TopK => Some(Self {
                temperature: Some(SAMPLING_TEMPERATURE),
                top_k: Some(config.params.top_k),
                top_p: None,
            }),
            DecodingStrategy::TopP => Some(Self {
                temperature: Some(SAMPLING_TEMPERATURE),
                top_k: None,
                top_p: Some(config.params.top_p),
            }),
            DecodingStrategy::Custom => Some(Self {
                temperature: Some(if label_is_question {
                    QUESTION_TEMPERATURE
                } else {
                    STATEMENT_TEMPERATURE
                }),
                ..Self::default()
            }),
        }
    }
}

/// One NDJSON line of a generate response.
#[derive(Debug, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /api/pull` body.
#[derive(Debug, Serialize)]
pub struct PullRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct PullResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Whether an Ollama error message reports a missing model.
pub fn is_model_missing(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("not found") && (message.contains("model") || message.contains("pull"))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;

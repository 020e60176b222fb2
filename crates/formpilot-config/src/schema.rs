//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

use formpilot_protocols::{
    BackendKind, DecodingParams, DecodingStrategy, GenerationConfig,
};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the applicant's free-text context file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_file: Option<String>,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub local: LocalModelConfig,

    #[serde(default)]
    pub prompt: PromptConfig,
}

impl Config {
    /// Snapshot of the generation settings for one command.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::new(self.generation.backend, self.generation.model.clone())
            .with_strategy(self.generation.decoding_strategy)
            .with_params(DecodingParams {
                beam_size: self.generation.beam_size,
                top_k: self.generation.top_k,
                top_p: self.generation.top_p,
            })
            .with_stream(self.generation.stream)
    }
}

/// Browser connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome DevTools remote-debugging endpoint.
    #[serde(default = "default_browser_endpoint")]
    pub endpoint: String,

    /// Browser family, informational only.
    #[serde(default = "default_browser_kind")]
    pub kind: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_browser_endpoint(),
            kind: default_browser_kind(),
        }
    }
}

fn default_browser_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_browser_kind() -> String {
    "chrome".to_string()
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub decoding_strategy: DecodingStrategy,

    #[serde(default = "default_beam_size")]
    pub beam_size: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default)]
    pub stream: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let params = DecodingParams::default();
        Self {
            backend: BackendKind::default(),
            model: default_model(),
            decoding_strategy: DecodingStrategy::default(),
            beam_size: params.beam_size,
            top_k: params.top_k,
            top_p: params.top_p,
            stream: false,
        }
    }
}

fn default_model() -> String {
    "mistral".to_string()
}

fn default_beam_size() -> usize {
    DecodingParams::default().beam_size
}

fn default_top_k() -> usize {
    DecodingParams::default().top_k
}

fn default_top_p() -> f32 {
    DecodingParams::default().top_p
}

/// Ollama server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_timeout")]
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            timeout_seconds: default_ollama_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434/api".to_string()
}

fn default_ollama_timeout() -> u64 {
    120
}

/// In-process model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_path: Option<String>,

    #[serde(default = "default_eos_token")]
    pub eos_token: String,

    /// Fixed sampling seed for reproducible answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            eos_token: default_eos_token(),
            seed: None,
        }
    }
}

fn default_eos_token() -> String {
    "</s>".to_string()
}

/// Prompt construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Include the surrounding form markup in the prompt.
    #[serde(default = "default_true")]
    pub include_page_markup: bool,

    #[serde(default = "default_max_markup_chars")]
    pub max_markup_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_page_markup: true,
            max_markup_chars: default_max_markup_chars(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_markup_chars() -> usize {
    6000
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

//! Configuration validation.

use formpilot_protocols::{BackendKind, DecodingStrategy};

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_generation(config, &mut result);
        Self::validate_backend(config, &mut result);
        Self::validate_prompt(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.browser.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.endpoint",
                "endpoint must start with http:// or https://",
            ));
        }
    }

    fn validate_generation(config: &Config, result: &mut ValidationResult) {
        let generation = &config.generation;

        if generation.model.trim().is_empty() && generation.backend == BackendKind::Ollama {
            result.add_error(ValidationError::new(
                "generation.model",
                "Model name cannot be empty",
            ));
        }

        if generation.beam_size == 0 {
            result.add_error(ValidationError::new(
                "generation.beam_size",
                "beam_size must be greater than 0",
            ));
        }

        if generation.top_k == 0 {
            result.add_error(ValidationError::new(
                "generation.top_k",
                "top_k must be greater than 0",
            ));
        }

        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            result.add_error(ValidationError::new(
                "generation.top_p",
                "top_p must be in (0, 1]",
            ));
        }

        if generation.backend == BackendKind::Ollama
            && generation.decoding_strategy == DecodingStrategy::Beam
        {
            result.add_warning(ValidationWarning::new(
                "generation.decoding_strategy",
                "Ollama has no beam search; requests are sent with server defaults",
            ));
        }
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        match config.generation.backend {
            BackendKind::Ollama => {
                let url = &config.ollama.base_url;
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    result.add_error(ValidationError::new(
                        "ollama.base_url",
                        "base_url must start with http:// or https://",
                    ));
                }
                if config.ollama.timeout_seconds == 0 {
                    result.add_error(ValidationError::new(
                        "ollama.timeout_seconds",
                        "timeout_seconds must be greater than 0",
                    ));
                }
            }
            BackendKind::Local => {
                if config.local.model_path.is_none() {
                    result.add_warning(ValidationWarning::new(
                        "local.model_path",
                        "Local model path not set, the local backend cannot load a model",
                    ));
                }
                if config.local.tokenizer_path.is_none() {
                    result.add_warning(ValidationWarning::new(
                        "local.tokenizer_path",
                        "Tokenizer path not set, will look next to the model",
                    ));
                }
            }
        }
    }

    fn validate_prompt(config: &Config, result: &mut ValidationResult) {
        if config.prompt.max_markup_chars > 50_000 {
            result.add_warning(ValidationWarning::new(
                "prompt.max_markup_chars",
                "max_markup_chars is very high (>50000), prompts may exceed the model context",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

//! Ollama backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

use formpilot_protocols::{
    BackendError, ChunkListener, GenerationConfig, GenerationRequest, ModelBackend,
};

use crate::api::{
    ErrorBody, GenerateChunk, GenerateOptions, GenerateRequest, PullRequest, PullResponse,
    is_model_missing,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/api";

/// Returned in place of an answer when the server cannot be reached.
pub const OLLAMA_ERROR: &str = "Error querying Ollama";

/// Answers from an Ollama server over its REST API.
///
/// Transport failures degrade to [`OLLAMA_ERROR`] instead of an error, so
/// a dead server shows up in the field rather than aborting the command.
pub struct OllamaBackend {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    /// `base_url` is the API root, e.g. `http://localhost:11434/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        on_chunk: ChunkListener<'_>,
    ) -> Result<String, BackendError> {
        if request.cancellation.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        // Holds everything already handed to `on_chunk`, even when the
        // stream fails part way.
        let mut text = String::new();
        let first = self
            .try_generate(request, config, &mut text, &mut *on_chunk)
            .await;
        let result = match first {
            Err(BackendError::ModelNotFound(model)) if text.is_empty() => {
                info!("Model {} not found on server, pulling", model);
                match self.pull(&model).await {
                    Ok(()) => {
                        self.try_generate(request, config, &mut text, on_chunk)
                            .await
                    }
                    Err(e) => Err(e),
                }
            }
            other => other,
        };

        match result {
            Ok(()) => Ok(text),
            Err(BackendError::Cancelled) => Err(BackendError::Cancelled),
            Err(e) if !text.is_empty() => {
                warn!(
                    "Ollama stream broke after {} bytes, keeping partial answer: {}",
                    text.len(),
                    e
                );
                Ok(text)
            }
            Err(e) => degrade(e),
        }
    }

    async fn try_generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        text: &mut String,
        on_chunk: ChunkListener<'_>,
    ) -> Result<(), BackendError> {
        let body = GenerateRequest {
            model: &config.model_name,
            prompt: &request.prompt,
            stream: true,
            options: GenerateOptions::for_strategy(config, request.field_is_question()),
        };
        debug!(
            "POST {} model={} strategy={}",
            self.endpoint("generate"),
            config.model_name,
            config.strategy
        );

        let response = self
            .client
            .post(self.endpoint("generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let response = check_status(response, &config.model_name).await?;

        let mut stream = Box::pin(response.bytes_stream());
        let mut pending = Vec::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = request.cancellation.cancelled() => return Err(BackendError::Cancelled),
                next = stream.next() => next,
            };
            let Some(bytes) = next else { break };
            let bytes = bytes.map_err(|e| BackendError::StreamError(e.to_string()))?;
            pending.extend_from_slice(&bytes);

            // Lines may be split across network chunks.
            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                if handle_line(&line, &config.model_name, text, on_chunk)? {
                    return Ok(());
                }
            }
        }

        if !pending.is_empty() {
            handle_line(&pending, &config.model_name, text, on_chunk)?;
        }
        Ok(())
    }

    /// Ask the server to download `model`, waiting for completion.
    async fn pull(&self, model: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint("pull"))
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError { status, message });
        }

        let body: PullResponse = response
            .json()
            .await
            .map_err(|e| BackendError::StreamError(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(BackendError::ModelNotFound(format!("{}: {}", model, error)));
        }
        info!(
            "Pulled model {} ({})",
            model,
            body.status.as_deref().unwrap_or("done")
        );
        Ok(())
    }
}

/// Parse one NDJSON line, appending its text. Returns true on the final line.
fn handle_line(
    line: &[u8],
    model: &str,
    text: &mut String,
    on_chunk: ChunkListener<'_>,
) -> Result<bool, BackendError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }

    let chunk: GenerateChunk =
        serde_json::from_str(line).map_err(|e| BackendError::StreamError(e.to_string()))?;
    if let Some(error) = chunk.error {
        if is_model_missing(&error) {
            return Err(BackendError::ModelNotFound(model.to_string()));
        }
        return Err(BackendError::StreamError(error));
    }
    if !chunk.response.is_empty() {
        text.push_str(&chunk.response);
        on_chunk(&chunk.response);
    }
    Ok(chunk.done)
}

async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, BackendError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    if status == 404 || is_model_missing(&message) {
        return Err(BackendError::ModelNotFound(model.to_string()));
    }
    Err(BackendError::ApiError { status, message })
}

/// Turn transport and missing-model failures into the sentinel answer.
fn degrade(error: BackendError) -> Result<String, BackendError> {
    if error.is_transport() || matches!(error, BackendError::ModelNotFound(_)) {
        warn!("Error querying Ollama: {}", error);
        Ok(OLLAMA_ERROR.to_string())
    } else {
        Err(error)
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
    ) -> Result<String, BackendError> {
        self.run(request, config, &mut |_: &str| {}).await
    }

    async fn stream_generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        on_chunk: ChunkListener<'_>,
    ) -> Result<String, BackendError> {
        self.run(request, config, on_chunk).await
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;

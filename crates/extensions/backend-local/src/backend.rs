//! In-process model backend.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tracing::debug;

use formpilot_protocols::{
    BackendError, ChunkListener, GenerationConfig, GenerationRequest, ModelBackend,
};

use crate::decoding::DecodingPlan;
use crate::model::{CausalLm, TextCodec};

/// Runs a causal language model in-process.
///
/// Decoding is CPU bound and runs on the blocking pool; decoded text flows
/// back over a channel so streaming listeners see it token by token.
pub struct LocalBackend {
    model: Arc<Mutex<Box<dyn CausalLm>>>,
    codec: Arc<dyn TextCodec>,
    seed: Option<u64>,
}

impl LocalBackend {
    pub fn new(model: Box<dyn CausalLm>, codec: Arc<dyn TextCodec>) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            codec,
            seed: None,
        }
    }

    /// Fix the sampling seed, making sampled answers reproducible.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Load an ONNX model and its `tokenizer.json`.
    #[cfg(feature = "onnx")]
    pub fn from_files(
        model_path: &std::path::Path,
        tokenizer_path: &std::path::Path,
        eos_token: &str,
    ) -> Result<Self, BackendError> {
        let codec = crate::onnx::TokenizerCodec::from_file(tokenizer_path)?;
        let eos = codec.token_id(eos_token)?;
        let model = crate::onnx::OnnxCausalLm::from_file(model_path, eos)?;
        tracing::info!(
            "Loaded local model {} (eos token {:?} = {})",
            model_path.display(),
            eos_token,
            eos
        );
        Ok(Self::new(Box::new(model), Arc::new(codec)))
    }

    /// Without ONNX support there is nothing to load.
    #[cfg(not(feature = "onnx"))]
    pub fn from_files(
        model_path: &std::path::Path,
        _tokenizer_path: &std::path::Path,
        _eos_token: &str,
    ) -> Result<Self, BackendError> {
        Err(BackendError::ModelLoad(format!(
            "cannot load {}: built without the `onnx` feature",
            model_path.display()
        )))
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

        let plan = DecodingPlan::from_config(config, request.field_is_question())?;
        let prompt = self.codec.encode(&request.prompt)?;
        debug!("Decoding {:?} from {} prompt tokens", plan, prompt.len());

        let model = self.model.clone();
        let codec = self.codec.clone();
        let token = request.cancellation.clone();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let worker = tokio::task::spawn_blocking(move || {
            let mut model = model.lock();
            let mut detokenizer = Detokenizer::new(codec.as_ref());
            let mut failure = None;
            let generated = plan.decode(
                &mut **model,
                &prompt,
                &mut rng,
                &|| token.is_cancelled(),
                &mut |id| match detokenizer.push(id) {
                    Ok(Some(chunk)) => {
                        let _ = tx.send(chunk);
                    }
                    Ok(None) => {}
                    Err(e) => failure = Some(e),
                },
            )?;
            if let Some(e) = failure {
                return Err(e);
            }
            if let Some(rest) = detokenizer.finish()? {
                let _ = tx.send(rest);
            }
            debug!("Generated {} tokens", generated.len());
            Ok::<(), BackendError>(())
        });

        let mut text = String::new();
        while let Some(chunk) = rx.recv().await {
            text.push_str(&chunk);
            on_chunk(&chunk);
        }

        worker
            .await
            .map_err(|e| BackendError::Inference(format!("decoding task failed: {}", e)))??;
        Ok(text)
    }
}

/// Turns a growing token sequence into text deltas.
///
/// Decoding token by token can split multi-byte characters, so the whole
/// sequence is decoded each time and only a clean extension is emitted.
struct Detokenizer<'a> {
    codec: &'a dyn TextCodec,
    ids: Vec<u32>,
    emitted: String,
}

impl<'a> Detokenizer<'a> {
    fn new(codec: &'a dyn TextCodec) -> Self {
        Self {
            codec,
            ids: Vec::new(),
            emitted: String::new(),
        }
    }

    fn push(&mut self, id: u32) -> Result<Option<String>, BackendError> {
        self.ids.push(id);
        let text = self.codec.decode(&self.ids)?;
        if text.ends_with('\u{FFFD}') {
            return Ok(None);
        }
        Ok(self.delta(text))
    }

    fn finish(&mut self) -> Result<Option<String>, BackendError> {
        let text = self.codec.decode(&self.ids)?;
        Ok(self.delta(text))
    }

    fn delta(&mut self, text: String) -> Option<String> {
        let rest = text.strip_prefix(self.emitted.as_str())?;
        if rest.is_empty() {
            return None;
        }
        let rest = rest.to_string();
        self.emitted = text;
        Some(rest)
    }
}

#[async_trait]
impl ModelBackend for LocalBackend {
    fn id(&self) -> &str {
        "local"
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

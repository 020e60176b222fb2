//! ONNX Runtime model and HuggingFace tokenizer.
//!
//! The model must be a decoder-only export without past key values: it
//! takes `input_ids` (plus optional `attention_mask` and `position_ids`)
//! and returns logits shaped `[batch, sequence, vocab]` as its first output.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array, Axis};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputs};
use ort::value::{DynTensor, Tensor};
use tokenizers::Tokenizer;
use tracing::debug;

use formpilot_protocols::BackendError;

use crate::model::{CausalLm, TextCodec};

const INPUT_IDS: &str = "input_ids";
const ATTENTION_MASK: &str = "attention_mask";
const POSITION_IDS: &str = "position_ids";

pub struct OnnxCausalLm {
    session: Session,
    eos: u32,
}

impl OnnxCausalLm {
    pub fn from_file(path: &Path, eos: u32) -> Result<Self, BackendError> {
        let session = Session::builder()
            .map_err(|e| BackendError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| BackendError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| {
                BackendError::ModelLoad(format!("Failed to load {}: {}", path.display(), e))
            })?;

        for input in &session.inputs {
            if ![INPUT_IDS, ATTENTION_MASK, POSITION_IDS].contains(&input.name.as_str()) {
                return Err(BackendError::ModelLoad(format!(
                    "unsupported model input '{}': export the model without past key values",
                    input.name
                )));
            }
        }
        if !session.inputs.iter().any(|i| i.name == INPUT_IDS) {
            return Err(BackendError::ModelLoad(format!(
                "model has no '{}' input",
                INPUT_IDS
            )));
        }

        Ok(Self { session, eos })
    }
}

fn tensor(values: Vec<i64>) -> Result<DynTensor, BackendError> {
    let len = values.len();
    let array = Array::from_shape_vec((1, len), values)
        .map_err(|e| BackendError::Inference(format!("shape error: {}", e)))?;
    Ok(Tensor::from_array(array.into_dyn())
        .map_err(|e| BackendError::Inference(e.to_string()))?
        .upcast())
}

impl CausalLm for OnnxCausalLm {
    fn next_token_logits(&mut self, tokens: &[u32]) -> Result<Vec<f32>, BackendError> {
        let len = tokens.len();
        if len == 0 {
            return Err(BackendError::Inference("empty token sequence".to_string()));
        }

        let mut available: HashMap<&str, Vec<i64>> = HashMap::new();
        available.insert(INPUT_IDS, tokens.iter().map(|t| i64::from(*t)).collect());
        available.insert(ATTENTION_MASK, vec![1; len]);
        available.insert(POSITION_IDS, (0..len as i64).collect());

        let mut feed: HashMap<String, DynTensor> = HashMap::new();
        for input in &self.session.inputs {
            if let Some(values) = available.remove(input.name.as_str()) {
                feed.insert(input.name.clone(), tensor(values)?);
            }
        }

        let outputs = self
            .session
            .run(SessionInputs::from(feed))
            .map_err(|e| BackendError::Inference(format!("forward pass failed: {}", e)))?;
        if outputs.len() == 0 {
            return Err(BackendError::Inference("model returned no outputs".to_string()));
        }

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| BackendError::Inference(format!("bad logits: {}", e)))?;
        if logits.ndim() != 3 || logits.shape()[1] != len {
            return Err(BackendError::Inference(format!(
                "expected logits [1, {}, vocab], got {:?}",
                len,
                logits.shape()
            )));
        }

        let last = logits.index_axis(Axis(0), 0);
        let last = last.index_axis(Axis(0), len - 1);
        Ok(last.iter().copied().collect())
    }

    fn eos_token_id(&self) -> u32 {
        self.eos
    }
}

/// `tokenizer.json` based codec.
pub struct TokenizerCodec {
    tokenizer: Tokenizer,
}

impl TokenizerCodec {
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            BackendError::Tokenizer(format!("Failed to load {}: {}", path.display(), e))
        })?;
        debug!("Loaded tokenizer with {} tokens", tokenizer.get_vocab_size(true));
        Ok(Self { tokenizer })
    }

    /// Id of a special token such as `</s>`.
    pub fn token_id(&self, token: &str) -> Result<u32, BackendError> {
        self.tokenizer
            .token_to_id(token)
            .ok_or_else(|| BackendError::Tokenizer(format!("unknown token {:?}", token)))
    }
}

impl TextCodec for TokenizerCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>, BackendError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| BackendError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, BackendError> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| BackendError::Tokenizer(e.to_string()))
    }
}

//! Model and tokenizer seams.

use formpilot_protocols::BackendError;

/// An autoregressive language model.
pub trait CausalLm: Send {
    /// Logits over the vocabulary for the token following `tokens`.
    fn next_token_logits(&mut self, tokens: &[u32]) -> Result<Vec<f32>, BackendError>;

    /// Token that ends a sequence.
    fn eos_token_id(&self) -> u32;
}

/// Conversion between text and token ids.
pub trait TextCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>, BackendError>;

    /// Decode ids to text, skipping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String, BackendError>;
}

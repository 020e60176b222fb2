//! Local inference backend for FormPilot.
//!
//! Runs a causal language model in-process and decodes with the strategy
//! chosen in the generation config. The model and tokenizer sit behind the
//! [`CausalLm`] and [`TextCodec`] traits; the `onnx` feature provides
//! implementations backed by ONNX Runtime and HuggingFace tokenizers.

mod backend;
mod decoding;
mod model;
#[cfg(feature = "onnx")]
mod onnx;
#[cfg(test)]
mod testing;

pub use backend::LocalBackend;
pub use decoding::{DecodingPlan, NO_REPEAT_NGRAM_SIZE};
pub use model::{CausalLm, TextCodec};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxCausalLm, TokenizerCodec};

//! Model backend trait definition.

use async_trait::async_trait;

use super::{GenerationConfig, GenerationRequest};
use crate::error::BackendError;

/// Receives streamed chunks, in order.
pub type ChunkListener<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Text completion capability.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Returns the backend ID.
    fn id(&self) -> &str;

    /// Generate a complete answer.
    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
    ) -> Result<String, BackendError>;

    /// Generate an answer, handing each chunk to `on_chunk` as it arrives.
    ///
    /// The returned text is the concatenation of all chunks.
    async fn stream_generate(
        &self,
        request: &GenerationRequest,
        config: &GenerationConfig,
        on_chunk: ChunkListener<'_>,
    ) -> Result<String, BackendError> {
        let text = self.generate(request, config).await?;
        if !text.is_empty() {
            on_chunk(&text);
        }
        Ok(text)
    }
}

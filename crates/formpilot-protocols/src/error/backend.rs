//! Model backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("Generation cancelled")]
    Cancelled,
}

impl BackendError {
    /// Whether the error is a transport failure (connection, HTTP status,
    /// broken stream), as opposed to a failure of the model itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BackendError::Network(_) | BackendError::ApiError { .. } | BackendError::StreamError(_)
        )
    }
}

//! Generation request types.

use tokio_util::sync::CancellationToken;

/// Request for one answer.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Full prompt text.
    pub prompt: String,

    /// Resolved label of the field being answered.
    pub field_label: String,

    /// Fired when the user interrupts. Honored between streamed chunks and
    /// between decoded tokens.
    pub cancellation: CancellationToken,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, field_label: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            field_label: field_label.into(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Whether the field label reads as a question.
    pub fn field_is_question(&self) -> bool {
        is_question(&self.field_label)
    }
}

/// A label is a question when it ends with `?` once trailing asterisks
/// (required-field markers) and whitespace are removed.
pub fn is_question(label: &str) -> bool {
    label
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
        .ends_with('?')
}

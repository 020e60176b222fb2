//! Questions answered so far in the current application.

/// A label and the answer committed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Ordered record of the fields filled in the current application.
///
/// Fed back into every prompt so later answers stay consistent with earlier
/// ones. Reset when the user starts a new application.
#[derive(Debug, Clone, Default)]
pub struct ApplicationContext {
    entries: Vec<QaPair>,
}

impl ApplicationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.entries.push(QaPair {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> &[QaPair] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

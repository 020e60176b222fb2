//! Per-label answer history with previous/next navigation.

use std::collections::HashMap;

/// Where a navigation request lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Nothing recorded for the label.
    NoHistory,
    /// Already at the first answer; nothing to do.
    Unchanged { index: usize },
    /// Show the answer at `index`.
    Select { index: usize, answer: String },
    /// No later answer exists (or the shown value matches none); a fresh one
    /// must be generated.
    Regenerate,
}

/// Every answer ever generated per label, in generation order.
///
/// Keyed by label text only, so two fields sharing a label share a history.
/// Entries are never removed; a new application keeps the history.
#[derive(Debug, Clone, Default)]
pub struct AnswerHistory {
    answers: HashMap<String, Vec<String>>,
}

impl AnswerHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer. Returns its index within the label's history.
    pub fn append(&mut self, label: &str, answer: impl Into<String>) -> usize {
        let entries = self.answers.entry(label.to_string()).or_default();
        entries.push(answer.into());
        entries.len() - 1
    }

    pub fn answers(&self, label: &str) -> &[String] {
        self.answers.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, label: &str) -> usize {
        self.answers(label).len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.values().all(Vec::is_empty)
    }

    /// Index of the first recorded answer equal to `displayed`.
    pub fn current_index(&self, label: &str, displayed: &str) -> Option<usize> {
        self.answers(label).iter().position(|a| a == displayed)
    }

    /// Step back one answer. An unmatched displayed value goes to the first.
    pub fn previous(&self, label: &str, displayed: &str) -> Navigation {
        let answers = self.answers(label);
        if answers.is_empty() {
            return Navigation::NoHistory;
        }
        match self.current_index(label, displayed) {
            Some(0) => Navigation::Unchanged { index: 0 },
            Some(i) => Navigation::Select {
                index: i - 1,
                answer: answers[i - 1].clone(),
            },
            None => Navigation::Select {
                index: 0,
                answer: answers[0].clone(),
            },
        }
    }

    /// Step forward one answer, or ask for a fresh one at the end.
    pub fn next(&self, label: &str, displayed: &str) -> Navigation {
        let answers = self.answers(label);
        if answers.is_empty() {
            return Navigation::NoHistory;
        }
        match self.current_index(label, displayed) {
            Some(i) if i + 1 < answers.len() => Navigation::Select {
                index: i + 1,
                answer: answers[i + 1].clone(),
            },
            _ => Navigation::Regenerate,
        }
    }
}

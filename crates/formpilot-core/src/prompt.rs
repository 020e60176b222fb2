//! Prompt assembly.

use std::fmt::Write;

use formpilot_protocols::{FieldIdentifier, FieldModality};

use crate::context::ApplicationContext;

/// What the prompt says about the field being answered.
#[derive(Debug, Clone)]
pub struct FieldPrompt {
    pub modality: FieldModality,
    pub identifier: FieldIdentifier,
    pub label: String,
    /// Option texts for selects, radio values or labels for radio groups.
    pub choices: Vec<String>,
}

impl FieldPrompt {
    pub fn new(modality: FieldModality, identifier: FieldIdentifier, label: impl Into<String>) -> Self {
        Self {
            modality,
            identifier,
            label: label.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = choices;
        self
    }
}

/// Builds the text sent to the model for one field.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    include_page_markup: bool,
    max_markup_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            include_page_markup: true,
            max_markup_chars: 6000,
        }
    }
}

impl PromptBuilder {
    pub fn new(include_page_markup: bool, max_markup_chars: usize) -> Self {
        Self {
            include_page_markup,
            max_markup_chars,
        }
    }

    pub fn includes_markup(&self) -> bool {
        self.include_page_markup
    }

    /// Assemble the prompt: user context, earlier answers, surrounding
    /// markup, the assistant framing, then the closing instruction naming
    /// the field.
    pub fn build(
        &self,
        context: &str,
        history: &ApplicationContext,
        field: &FieldPrompt,
        markup: Option<&str>,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str("Context about the applicant:\n");
        prompt.push_str(context.trim());
        prompt.push_str("\n\n");

        if !history.is_empty() {
            prompt.push_str("Questions already answered in this application:\n");
            for pair in history.entries() {
                let _ = writeln!(prompt, "Q: {}", pair.question);
                let _ = writeln!(prompt, "A: {}", pair.answer);
            }
            prompt.push('\n');
        }

        if self.include_page_markup {
            if let Some(markup) = markup.map(str::trim).filter(|m| !m.is_empty()) {
                prompt.push_str("Form markup:\n");
                prompt.push_str(truncate_chars(markup, self.max_markup_chars));
                prompt.push_str("\n\n");
            }
        }

        prompt.push_str(
            "You are an assistant to the applicant described above, filling in a job \
             application form on their behalf. Answer truthfully using the context \
             and stay consistent with the answers already given.\n\n",
        );

        let _ = writeln!(
            prompt,
            "Provide the value for the {} field {} labelled \"{}\".",
            field.modality, field.identifier, field.label
        );
        if let Some(line) = choice_line(field) {
            prompt.push_str(&line);
            prompt.push('\n');
        }
        prompt.push_str(
            "Your entire response will be inserted verbatim as the value of this field. \
             Reply with the value only: no explanations, no quotes, no markdown.",
        );

        prompt
    }
}

fn choice_line(field: &FieldPrompt) -> Option<String> {
    match field.modality {
        FieldModality::Checkbox => Some("Answer with yes or no.".to_string()),
        FieldModality::Select | FieldModality::RadioGroup if !field.choices.is_empty() => Some(
            format!("Answer with exactly one of: {}.", field.choices.join(", ")),
        ),
        _ => None,
    }
}

/// At most `max` characters of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;

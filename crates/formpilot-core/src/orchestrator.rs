//! Autofill orchestration.
//!
//! One field: resolve label → build prompt → generate → apply → record.
//! Whole form: scan the page, then run the single-field pipeline for every
//! surviving field in document order. A failure on one field is logged and
//! reported; it never aborts the rest of the pass.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use formpilot_protocols::{
    BackendError, FieldIdentifier, FieldModality, GenerationConfig, GenerationRequest, ModelBackend,
    PageAccessor,
};

use crate::applier::{AppliedValue, FieldValueApplier};
use crate::context::ApplicationContext;
use crate::error::FillError;
use crate::field::{ResolvedField, describe_element};
use crate::history::{AnswerHistory, Navigation};
use crate::label::{LabelResolver, LabelSource};
use crate::prompt::{FieldPrompt, PromptBuilder};
use crate::scanner::{FormScanner, SkippedField};

/// Receives streamed answer chunks.
pub type ChunkSink = Box<dyn FnMut(&str) + Send>;

/// One field that was filled.
#[derive(Debug, Clone)]
pub struct FillReport {
    pub label: String,
    pub identifier: FieldIdentifier,
    pub answer: String,
    pub applied: AppliedValue,
}

/// One field whose pipeline failed.
#[derive(Debug, Clone)]
pub struct FailedField {
    pub label: String,
    pub identifier: FieldIdentifier,
    pub error: String,
}

/// Outcome of a whole-form pass.
#[derive(Debug, Default)]
pub struct FillAllReport {
    pub filled: Vec<FillReport>,
    pub skipped: Vec<SkippedField>,
    pub failed: Vec<FailedField>,
    /// The pass stopped early because of an interrupt.
    pub cancelled: bool,
}

/// Result of a previous/next command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Nothing recorded for the focused field's label.
    NoHistory,
    /// Already at the first answer.
    Unchanged { index: usize },
    /// Switched to a stored answer.
    Moved { index: usize, answer: String },
    /// Generated and appended a fresh answer.
    Regenerated { index: usize, answer: String },
}

enum Direction {
    Previous,
    Next,
}

/// Coordinates scanning, labelling, prompting, generation and application.
pub struct AutofillOrchestrator {
    page: Arc<dyn PageAccessor>,
    backend: Arc<dyn ModelBackend>,
    generation: GenerationConfig,
    context: String,
    application: ApplicationContext,
    history: AnswerHistory,
    /// Last answer applied per label. Discrete fields cannot report it back.
    shown: HashMap<String, String>,
    scanner: FormScanner,
    labels: LabelResolver,
    prompts: PromptBuilder,
    applier: FieldValueApplier,
    cancellation: CancellationToken,
    chunk_sink: Option<ChunkSink>,
}

impl AutofillOrchestrator {
    pub fn new(
        page: Arc<dyn PageAccessor>,
        backend: Arc<dyn ModelBackend>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            page,
            backend,
            generation,
            context: String::new(),
            application: ApplicationContext::new(),
            history: AnswerHistory::new(),
            shown: HashMap::new(),
            scanner: FormScanner::new(),
            labels: LabelResolver::new(),
            prompts: PromptBuilder::default(),
            applier: FieldValueApplier::new(),
            cancellation: CancellationToken::new(),
            chunk_sink: None,
        }
    }

    /// Free-text description of the applicant.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Token handed to every generation request.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Receive chunks when streaming is enabled.
    pub fn with_chunk_sink(mut self, sink: ChunkSink) -> Self {
        self.chunk_sink = Some(sink);
        self
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Replace generation settings. Takes effect from the next command.
    pub fn set_generation_config(&mut self, config: GenerationConfig) {
        info!(
            "Generation settings: backend={} model={} strategy={}",
            config.backend, config.model_name, config.strategy
        );
        self.generation = config;
    }

    /// Swap the backend when the user switches backend kind.
    pub fn set_backend(&mut self, backend: Arc<dyn ModelBackend>) {
        self.backend = backend;
    }

    pub fn application_context(&self) -> &ApplicationContext {
        &self.application
    }

    pub fn history(&self) -> &AnswerHistory {
        &self.history
    }

    /// Forget the answers of the current application. History is kept.
    pub fn new_application(&mut self) {
        info!("Starting new application ({} answers cleared)", self.application.len());
        self.application.clear();
    }

    /// Fill the field that currently has focus.
    pub async fn fill_one_field(&mut self) -> Result<FillReport, FillError> {
        let field = self.focused_field().await?;
        self.fill_field(field).await
    }

    /// Fill every visible, enabled field on the page.
    ///
    /// Fails only when the page markup cannot be read at all.
    pub async fn fill_all_fields(&mut self) -> Result<FillAllReport, FillError> {
        let markup = self.page.body_markup().await?;
        let descriptors = self.scanner.scan(&markup);
        info!("Found {} candidate fields", descriptors.len());

        let located = self.scanner.locate(self.page.as_ref(), descriptors).await;
        let mut report = FillAllReport {
            skipped: located.skipped,
            ..FillAllReport::default()
        };

        for candidate in located.fields {
            if self.cancellation.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let label = self.labels.resolve(candidate.element.as_ref()).await;
            let identifier = candidate.descriptor.identifier.clone();
            let field = ResolvedField::new(candidate.descriptor, label.clone(), candidate.element);

            match self.fill_field(field).await {
                Ok(filled) => report.filled.push(filled),
                Err(FillError::Backend(BackendError::Cancelled)) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    warn!("Failed to fill {:?} ({}): {}", label, identifier, e);
                    report.failed.push(FailedField {
                        label,
                        identifier,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Fill pass done: {} filled, {} skipped, {} failed",
            report.filled.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Show the previous stored answer for the focused field.
    pub async fn previous_answer(&mut self) -> Result<NavigationOutcome, FillError> {
        self.change_answer(Direction::Previous).await
    }

    /// Show the next stored answer, generating a fresh one past the end.
    pub async fn next_answer(&mut self) -> Result<NavigationOutcome, FillError> {
        self.change_answer(Direction::Next).await
    }

    async fn change_answer(&mut self, direction: Direction) -> Result<NavigationOutcome, FillError> {
        let field = self.focused_field().await?;
        let displayed = match field.modality() {
            FieldModality::Text | FieldModality::Textarea => field.element.value().await?,
            FieldModality::Select | FieldModality::Checkbox | FieldModality::RadioGroup => {
                self.shown.get(&field.label).cloned().unwrap_or_default()
            }
        };

        let navigation = match direction {
            Direction::Previous => self.history.previous(&field.label, &displayed),
            Direction::Next => self.history.next(&field.label, &displayed),
        };

        match navigation {
            Navigation::NoHistory => {
                info!("No history for field {:?}", field.label);
                Ok(NavigationOutcome::NoHistory)
            }
            Navigation::Unchanged { index } => Ok(NavigationOutcome::Unchanged { index }),
            Navigation::Select { index, answer } => {
                self.applier.apply(self.page.as_ref(), &field, &answer).await?;
                self.shown.insert(field.label.clone(), answer.clone());
                info!("Answer {} for {:?}", index + 1, field.label);
                Ok(NavigationOutcome::Moved { index, answer })
            }
            Navigation::Regenerate => {
                let (answer, _) = self.answer_field(&field).await?;
                let index = self.history.append(&field.label, answer.clone());
                info!("Generated answer {} for {:?}", index + 1, field.label);
                Ok(NavigationOutcome::Regenerated { index, answer })
            }
        }
    }

    async fn focused_field(&self) -> Result<ResolvedField, FillError> {
        let element = self
            .page
            .active_element()
            .await?
            .ok_or(FillError::NoActiveField)?;
        let descriptor = describe_element(element.as_ref()).await?;
        let label = self.labels.resolve(element.as_ref()).await;
        Ok(ResolvedField::new(descriptor, label, element))
    }

    /// Run the pipeline for one field and record the result.
    async fn fill_field(&mut self, field: ResolvedField) -> Result<FillReport, FillError> {
        let (answer, applied) = self.answer_field(&field).await?;

        self.application.push(field.label.clone(), answer.clone());
        self.history.append(&field.label, answer.clone());
        info!("Filled {:?} with {:?}", field.label, answer);

        Ok(FillReport {
            label: field.label,
            identifier: field.descriptor.identifier,
            answer,
            applied,
        })
    }

    /// Prompt, generate and apply without recording.
    async fn answer_field(&mut self, field: &ResolvedField) -> Result<(String, AppliedValue), FillError> {
        let choices = self.choices(field).await;
        let markup = self.surrounding_markup(field).await;
        let meta = FieldPrompt::new(
            field.modality(),
            field.descriptor.identifier.clone(),
            field.label.clone(),
        )
        .with_choices(choices);
        let prompt = self
            .prompts
            .build(&self.context, &self.application, &meta, markup.as_deref());

        let answer = self.generate(&field.label, prompt).await?;
        let applied = self.applier.apply(self.page.as_ref(), field, &answer).await?;
        self.shown.insert(field.label.clone(), answer.clone());
        Ok((answer, applied))
    }

    async fn generate(&mut self, label: &str, prompt: String) -> Result<String, FillError> {
        let request =
            GenerationRequest::new(prompt, label).with_cancellation(self.cancellation.clone());
        let config = &self.generation;
        debug!(
            "Generating for {:?} with {} ({})",
            label,
            self.backend.id(),
            config.strategy
        );

        let answer = if config.stream {
            let sink = &mut self.chunk_sink;
            let mut forward = |chunk: &str| {
                if let Some(sink) = sink.as_mut() {
                    sink(chunk);
                }
            };
            self.backend
                .stream_generate(&request, config, &mut forward)
                .await?
        } else {
            self.backend.generate(&request, config).await?
        };
        Ok(answer)
    }

    /// Choices offered to the model for discrete fields.
    async fn choices(&self, field: &ResolvedField) -> Vec<String> {
        match field.modality() {
            FieldModality::Select => field.element.options().await.unwrap_or_else(|e| {
                debug!("Could not read options for {:?}: {}", field.label, e);
                Vec::new()
            }),
            FieldModality::RadioGroup => {
                let Some(group) = field.radio_group() else {
                    return Vec::new();
                };
                let radios = match self.page.find_by_name(group).await {
                    Ok(radios) => radios,
                    Err(e) => {
                        debug!("Could not read radio group {}: {}", group, e);
                        return Vec::new();
                    }
                };
                let mut choices = Vec::new();
                for radio in radios {
                    let is_radio = radio
                        .attribute("type")
                        .await
                        .ok()
                        .flatten()
                        .is_some_and(|t| t.eq_ignore_ascii_case("radio"));
                    if !is_radio {
                        continue;
                    }
                    let label = self.labels.resolve_with_source(radio.as_ref()).await;
                    // A name or fallback label says nothing about the option.
                    let choice = match label.source {
                        LabelSource::Name | LabelSource::Fallback => {
                            radio.attribute("value").await.ok().flatten().unwrap_or_default()
                        }
                        _ => label.text,
                    };
                    if !choice.is_empty() {
                        choices.push(choice);
                    }
                }
                choices
            }
            _ => Vec::new(),
        }
    }

    /// Markup of the enclosing form, else the page body.
    async fn surrounding_markup(&self, field: &ResolvedField) -> Option<String> {
        if !self.prompts.includes_markup() {
            return None;
        }
        match field.element.ancestor_form().await {
            Ok(Some(form)) => match form.outer_markup().await {
                Ok(markup) => return Some(markup),
                Err(e) => debug!("Could not read form markup: {}", e),
            },
            Ok(None) => {}
            Err(e) => debug!("Could not find enclosing form: {}", e),
        }
        self.page.body_markup().await.ok()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

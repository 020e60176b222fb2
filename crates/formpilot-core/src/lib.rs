//! # FormPilot Core
//!
//! The field-resolution and answer-generation engine.
//!
//! ## Components
//!
//! - [`FormScanner`] - Finds candidate fields in page markup
//! - [`LabelResolver`] - Finds a human-readable label for a field
//! - [`PromptBuilder`] - Assembles the model prompt
//! - [`FieldValueApplier`] - Commits a generated answer to a field
//! - [`AnswerHistory`] - Per-label answers with previous/next navigation
//! - [`AutofillOrchestrator`] - Runs scan, label, prompt, generate, apply
//!   and record for one field or the whole form
//!
//! The engine is single-threaded and command driven: the orchestrator takes
//! `&mut self` and runs one command to completion before the next.

pub mod applier;
pub mod context;
pub mod edit_distance;
pub mod error;
pub mod field;
pub mod history;
pub mod label;
pub mod orchestrator;
pub mod prompt;
pub mod scanner;

#[cfg(test)]
mod testing;

pub use applier::{AppliedValue, FieldValueApplier};
pub use context::{ApplicationContext, QaPair};
pub use error::{ApplyError, FillError};
pub use field::{ResolvedField, describe_element};
pub use history::{AnswerHistory, Navigation};
pub use label::{LabelResolver, LabelSource, ResolvedLabel, UNKNOWN_FIELD};
pub use orchestrator::{
    AutofillOrchestrator, ChunkSink, FailedField, FillAllReport, FillReport, NavigationOutcome,
};
pub use prompt::{FieldPrompt, PromptBuilder};
pub use scanner::{FormScanner, LocatedField, ScanOutcome, SkipReason, SkippedField};

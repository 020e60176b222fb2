//! # FormPilot Protocols
//!
//! Capability definitions (traits) and shared data types for the FormPilot
//! autofill engine. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`PageAccessor`] - Access to the live page in the browser tab
//! - [`PageElement`] - A handle to one element of that page
//! - [`ModelBackend`] - Text completion by a language model

pub mod backend;
pub mod error;
pub mod page;
pub mod types;

pub use backend::{
    BackendKind, ChunkListener, DecodingParams, DecodingStrategy, GenerationConfig,
    GenerationRequest, ModelBackend, MAX_NEW_TOKENS, is_question,
};
pub use error::{BackendError, PageError};
pub use page::{ElementHandle, PageAccessor, PageElement, Relation};
pub use types::*;

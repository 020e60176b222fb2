//! Ollama model backend for FormPilot.

mod api;
mod backend;

pub use backend::{DEFAULT_BASE_URL, OLLAMA_ERROR, OllamaBackend};

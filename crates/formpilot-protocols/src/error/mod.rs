//! Error types for the FormPilot protocol layer.

mod backend;
mod page;

pub use backend::*;
pub use page::*;

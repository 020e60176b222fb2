//! # FormPilot Config
//!
//! Persisted configuration for FormPilot: the applicant context file, the
//! browser endpoint and the generation settings.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};

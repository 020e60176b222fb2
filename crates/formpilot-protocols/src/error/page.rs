//! Page access errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element is stale or detached: {0}")]
    StaleElement(String),

    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

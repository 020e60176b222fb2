//! CDP error types.

use thiserror::Error;

use formpilot_protocols::PageError;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error reported by the browser for a command.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(String),

    /// No page target to attach to.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Exception thrown by evaluated JavaScript.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            // Remote object ids die with navigation.
            CdpError::Protocol { ref message, .. } if message.contains("Could not find object") => {
                PageError::StaleElement(message.clone())
            }
            CdpError::JavaScript(message) => PageError::Script(message),
            CdpError::Timeout(message) => PageError::Timeout(message),
            other => PageError::Session(other.to_string()),
        }
    }
}

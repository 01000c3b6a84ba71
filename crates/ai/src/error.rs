//! AI task-generation errors.

/// Result type for AI calls.
pub type Result<T> = std::result::Result<T, AiError>;

/// Errors from the task generator.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No API key configured
    #[error("no API key configured (set {0})")]
    MissingApiKey(String),

    /// The request never got a response
    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the API key
    #[error("AI service rejected the API key (HTTP {0})")]
    Unauthorized(u16),

    /// Any other non-success status
    #[error("AI service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The response could not be turned into tasks
    #[error("could not parse AI response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}

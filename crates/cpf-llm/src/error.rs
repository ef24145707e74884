//! Error types for cpf-llm

use thiserror::Error;

/// Errors raised by a text-generation backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key was configured
    #[error("no API key found; set {0} in the environment or .env")]
    MissingApiKey(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request exceeded the client timeout
    #[error("request timed out")]
    Timeout,

    /// The API answered with a non-2xx status
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The response carried no generated text
    #[error("response contained no choices")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::MalformedResponse(err.to_string())
    }
}

/// Result type for text generation.
pub type LlmResult<T> = std::result::Result<T, LlmError>;

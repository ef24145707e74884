//! Error types for cpf-evidence

use thiserror::Error;

/// Errors that can occur while fetching a single reference page.
///
/// These never escape evidence assembly: a failed page simply contributes no
/// evidence record.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Server answered with a non-2xx status
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Request exceeded its timeout
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Connection, DNS or protocol failure
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// Response body could not be read as text
    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },
}

impl FetchError {
    /// The URL this failure relates to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Client(_) => None,
            FetchError::Status { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Network { url, .. }
            | FetchError::Body { url, .. } => Some(url),
        }
    }
}

/// Errors raised when a reference catalog violates its invariants.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// The mandatory fallback category is absent
    #[error("catalog is missing the mandatory `{0}` category")]
    MissingGeneralInfo(String),

    /// The fallback category exists but lists no URLs
    #[error("catalog category `{0}` must list at least one URL")]
    EmptyGeneralInfo(String),

    /// Two categories share a name
    #[error("catalog category `{0}` is declared more than once")]
    DuplicateCategory(String),

    /// A URL entry is blank
    #[error("catalog category `{0}` contains a blank URL")]
    BlankUrl(String),
}

/// Result type for page fetching.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

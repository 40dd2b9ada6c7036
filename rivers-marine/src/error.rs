use thiserror::Error;

/// Errors surfaced by content sources and the modules built on them
///
/// Absence of content is never an error: fetches return `Ok(None)` and the
/// resolver returns `Ok(None)` for not-found. These variants cover upstream
/// failures, which propagate to the caller unretried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The content source answered with a non-success status
    #[error("Content API request failed ({status}) at {endpoint}: {message}")]
    Upstream {
        status: u16,
        endpoint: String,
        message: String,
    },
    /// The request never produced a response
    #[error("Content source unreachable: {0}")]
    Transport(String),
    /// A response body could not be decoded into the expected shape
    #[error("Failed to decode content: {0}")]
    Decode(String),
    /// The content source is misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
    /// A locale code outside the supported set
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),
}

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

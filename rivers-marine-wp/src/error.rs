use rivers_marine::ContentError;
use thiserror::Error;

/// Errors from the WordPress REST client
#[derive(Debug, Error)]
pub enum WpError {
    /// The API answered with a non-success status
    #[error("WordPress API request failed ({status}) at {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },
    /// The request could not be sent or the connection failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The response body did not match the expected shape
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    /// Missing or invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for WordPress client operations
pub type WpResult<T> = Result<T, WpError>;

impl From<WpError> for ContentError {
    fn from(error: WpError) -> Self {
        match error {
            WpError::Api {
                status,
                endpoint,
                message,
            } => ContentError::Upstream {
                status,
                endpoint,
                message,
            },
            WpError::Network(e) => ContentError::Transport(e.to_string()),
            WpError::Decode { endpoint, message } => {
                ContentError::Decode(format!("{}: {}", endpoint, message))
            }
            WpError::Config(message) => ContentError::Config(message),
        }
    }
}

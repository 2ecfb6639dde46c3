use thiserror::Error;

/// Errors raised at the host document boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// A frame's document belongs to another origin
    #[error("Frame is not accessible: {0}")]
    FrameInaccessible(String),

    /// The document has no body to observe or append to
    #[error("Document has no body")]
    MissingBody,

    /// A host call failed
    #[error("Host DOM operation failed: {0}")]
    Host(String),
}

/// Errors that can occur when talking to the correction service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The configured endpoint is not a valid URL
    #[error("Invalid correction endpoint: {0}")]
    InvalidEndpoint(String),

    /// The service could not be reached at all
    #[error("Correction service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with a non-success status
    #[error("Correction service returned status {0}")]
    Status(u16),

    /// The response body was not the expected JSON
    #[error("Malformed correction response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ServiceError::MalformedResponse(error.to_string())
        } else if let Some(status) = error.status() {
            ServiceError::Status(status.as_u16())
        } else {
            ServiceError::Unreachable(error.to_string())
        }
    }
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

/// The common error type used by this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetouchError {
    /// A host document operation failed
    #[error(transparent)]
    Dom(#[from] DomError),

    /// The correction service call failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Configuration was invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An affordance or preview could not be built
    #[error("Failed to present correction UI: {0}")]
    Presentation(String),
}

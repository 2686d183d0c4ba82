//! Error types.
//!
//! [`EngineError`] covers everything that can abort a streaming phase. [`ToolError`]
//! is contained by the executor and never leaves it as an `Err`. [`ConfigError`]
//! is only produced at startup.

use thiserror::Error;

/// Crate result alias over [`EngineError`]
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures of the provider side of a response (either streaming phase).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport-level failure talking to the provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered, but with an error status or error payload
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// A stream chunk could not be decoded
    #[error("failed to decode provider stream: {0}")]
    Decode(String),

    /// No progress within the configured bound
    #[error("provider stream timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl EngineError {
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::provider(status.as_u16(), err.to_string()),
            None => Self::Http(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Engine-level tool execution failures.
///
/// A negative business answer (for example a taken time slot) is *not* a
/// `ToolError`; it is a successful result whose payload says so.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("malformed arguments: {0}")]
    MalformedArguments(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_messages() {
        assert_eq!(
            ToolError::UnknownTool("fly".into()).to_string(),
            "unknown tool: fly"
        );
        let err = ToolError::InvalidArguments {
            tool: "get_weather".into(),
            reason: "missing field `city`".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid arguments for get_weather: missing field `city`"
        );
    }

    #[test]
    fn test_provider_error_message() {
        let err = EngineError::provider(429, "rate limited");
        assert_eq!(err.to_string(), "provider error (429): rate limited");
    }
}

//! Error types for the SonarQube provider.

use thiserror::Error;

/// Errors that can occur while driving a resource lifecycle operation.
///
/// Every failure is fatal to the invoking operation: the provider performs
/// no retries and no partial-success handling.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The server answered with an unexpected HTTP status.
    ///
    /// The error message is the raw response body, verbatim. SonarQube puts
    /// its diagnostics in the body, so no structured parsing is attempted.
    #[error("{body}")]
    Remote {
        /// The HTTP status the server answered with.
        status: reqwest::StatusCode,
        /// The response body, read as text.
        body: String,
    },

    /// The request could not be constructed or executed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a success status but an undecodable body.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested resource was not found on the server.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The provider is missing or carrying unusable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is not served by this provider.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A state or configuration value failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server base URL could not be parsed or extended.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The operation is not offered for the requested resource type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// For [`ProviderError::Remote`] this is the remote response body,
    /// verbatim. Variants wrapping foreign errors return a placeholder;
    /// use `Display` for those.
    pub fn message(&self) -> &str {
        match self {
            Self::Remote { body, .. } => body,
            Self::Transport(_err) => "transport error (see Debug output)",
            Self::Decode(_err) => "decode error (see Debug output)",
            Self::NotFound(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Validation(msg) => msg,
            Self::InvalidUrl(_err) => "invalid URL (see Debug output)",
            Self::Unimplemented(msg) => msg,
        }
    }

    /// Whether this error is a remote rejection (unexpected HTTP status).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_is_body_verbatim() {
        let err = ProviderError::Remote {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "project key already exists".to_string(),
        };
        assert_eq!(format!("{}", err), "project key already exists");
        assert_eq!(err.message(), "project key already exists");
        assert!(err.is_remote());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("demo-key".to_string());
        assert_eq!(format!("{}", err), "Resource not found: demo-key");

        let err = ProviderError::UnknownResource("sonarqube_group".to_string());
        assert_eq!(
            format!("{}", err),
            "Unknown resource type: sonarqube_group"
        );

        let err = ProviderError::Configuration("missing url".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing url");
    }

    #[test]
    fn test_decode_error_from_serde() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ProviderError::from(source);
        assert!(matches!(err, ProviderError::Decode(_)));
        assert!(format!("{}", err).starts_with("Decode error"));
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Validation("missing required attribute 'name'".to_string());
        assert_eq!(err.message(), "missing required attribute 'name'");
    }
}

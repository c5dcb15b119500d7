//! Error types and failure classification for provider calls.
//!
//! This module provides:
//! - [`ApiError`]: The failure half of every [`RequestResult`]
//! - [`FailureKind`]: The tag callers branch on

mod kind;

pub use kind::FailureKind;

use serde_json::Value;
use thiserror::Error;

/// Outcome of one provider call: the decoded JSON body, or exactly one failure.
pub type RequestResult = Result<Value, ApiError>;

/// Errors that can occur while calling a provider.
///
/// Every variant carries a human-readable message that is safe to show in
/// the admin UI. Credentials never appear in these messages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, timeout).
    #[error("Network error contacting {provider}: {message}")]
    Transport { provider: String, message: String },

    /// The provider answered with a non-2xx status.
    #[error("{provider} returned HTTP {status}: {message}")]
    HttpStatus {
        provider: String,
        status: u16,
        message: String,
    },

    /// The endpoint name is unknown or a required parameter was missing.
    #[error("Invalid endpoint '{endpoint}' for {provider}")]
    InvalidEndpoint { provider: String, endpoint: String },

    /// The response body could not be decoded as JSON.
    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// Well-formed response carrying a provider-declared error.
    #[error("{message}")]
    Provider { provider: String, message: String },

    /// The provider does not offer this operation.
    #[error("{operation} is not supported by {provider}")]
    Unsupported { provider: String, operation: String },

    /// The operation is declared but this client does not implement it yet.
    #[error("{operation} is not implemented for {provider} yet")]
    NotImplemented { provider: String, operation: String },

    /// No credential configured and no demo data available.
    #[error("{provider} credentials are not configured")]
    MissingCredentials { provider: String },
}

impl ApiError {
    /// Returns the failure tag for this error.
    ///
    /// An unresolvable endpoint is reported as a decode failure: the call
    /// could not be turned into a well-formed request.
    ///
    /// # Examples
    ///
    /// ```
    /// use tradepress_providers::errors::{ApiError, FailureKind};
    ///
    /// let error = ApiError::Provider {
    ///     provider: "fmp".to_string(),
    ///     message: "Invalid API key".to_string(),
    /// };
    /// assert_eq!(error.kind(), FailureKind::Provider);
    /// assert_eq!(error.message(), "Invalid API key");
    /// ```
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::InvalidEndpoint { .. } | Self::Decode { .. } => FailureKind::Decode,
            Self::Provider { .. } => FailureKind::Provider,
            Self::Unsupported { .. } => FailureKind::Unsupported,
            Self::NotImplemented { .. } => FailureKind::NotImplemented,
            Self::MissingCredentials { .. } => FailureKind::Configuration,
        }
    }

    /// Message suitable for direct display.
    ///
    /// Provider failures return the provider's text verbatim; every other
    /// variant returns its formatted description.
    pub fn message(&self) -> String {
        match self {
            Self::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status for `HttpStatus` failures.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Identifier of the provider that produced the failure.
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::HttpStatus { provider, .. }
            | Self::InvalidEndpoint { provider, .. }
            | Self::Decode { provider, .. }
            | Self::Provider { provider, .. }
            | Self::Unsupported { provider, .. }
            | Self::NotImplemented { provider, .. }
            | Self::MissingCredentials { provider } => provider,
        }
    }

    pub(crate) fn unsupported(provider: &str, operation: &str) -> Self {
        Self::Unsupported {
            provider: provider.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn not_implemented(provider: &str, operation: &str) -> Self {
        Self::NotImplemented {
            provider: provider.to_string(),
            operation: operation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_is_decode_failure() {
        let error = ApiError::InvalidEndpoint {
            provider: "ibkr".to_string(),
            endpoint: "nope".to_string(),
        };
        assert_eq!(error.kind(), FailureKind::Decode);
        assert_eq!(error.http_status(), None);
    }

    #[test]
    fn test_http_status_carries_code() {
        let error = ApiError::HttpStatus {
            provider: "github".to_string(),
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(error.kind(), FailureKind::HttpStatus);
        assert_eq!(error.http_status(), Some(404));
        assert_eq!(error.message(), "github returned HTTP 404: Not Found");
    }

    #[test]
    fn test_provider_message_is_verbatim() {
        let error = ApiError::Provider {
            provider: "marketstack".to_string(),
            message: "bad request".to_string(),
        };
        assert_eq!(error.kind(), FailureKind::Provider);
        assert_eq!(error.message(), "bad request");
        assert_eq!(error.provider(), "marketstack");
    }

    #[test]
    fn test_placeholder_and_unsupported_are_distinct() {
        let placeholder = ApiError::not_implemented("alltick", "get_quote");
        let unsupported = ApiError::unsupported("etoro", "get_historical_data");

        assert_eq!(placeholder.kind(), FailureKind::NotImplemented);
        assert_eq!(unsupported.kind(), FailureKind::Unsupported);
        assert_eq!(
            format!("{}", unsupported),
            "get_historical_data is not supported by etoro"
        );
    }

    #[test]
    fn test_missing_credentials_is_configuration() {
        let error = ApiError::MissingCredentials {
            provider: "fmp".to_string(),
        };
        assert_eq!(error.kind(), FailureKind::Configuration);
        assert_eq!(error.kind().as_str(), "configuration_error");
    }
}

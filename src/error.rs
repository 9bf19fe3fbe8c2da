//! Errors surfaced by [`HostedModel`](crate::HostedModel) operations.

use thiserror::Error;

use crate::http::{RetryError, TransportError};

/// Result alias used across the public API.
pub type Result<T, E = HostedModelError> = std::result::Result<T, E>;

/// Every failure a hosted model operation can report.
///
/// The set is closed: each HTTP failure is mapped onto exactly one variant and
/// nothing is retried at this level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostedModelError {
    /// A constructor or operation argument was malformed. Raised before any
    /// network activity.
    #[error("The required argument \"{0}\" is invalid.")]
    InvalidArgument(String),

    /// The base URL does not point at a versioned hosted model endpoint.
    #[error(
        "The URL you've provided is not valid. Your hosted model URL must be in the format https://my-model.hosted-models.runwayml.cloud/v1."
    )]
    InvalidUrl,

    /// HTTP 401: the model is private and the token is missing or wrong.
    #[error("Permission denied, this model is private. Did you include the correct token?")]
    PermissionDenied,

    /// HTTP 404: wrong URL, or the model is not currently active.
    #[error("Model not found. Make sure the URL is correct and that the model is \"active\".")]
    NotFound,

    /// HTTP 500: the model failed while processing the input.
    #[error(
        "The model experienced an error while processing your input. Double-check the input parameters sent to HostedModel::query(); HostedModel::info() describes the parameters the model expects."
    )]
    Model,

    /// Any other non-2xx or non-JSON response.
    #[error("An unexpected error has occurred. Please try again later.")]
    Unexpected,

    /// The request never completed an HTTP exchange.
    #[error(
        "A network error has occurred{}. Please check your internet connection is working properly and try again.",
        format_code(.code)
    )]
    Network { code: Option<String> },
}

fn format_code(code: &Option<String>) -> String {
    match code {
        Some(code) => format!(": {}", code),
        None => String::new(),
    }
}

impl From<RetryError> for HostedModelError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::EmptyStatusSet => HostedModelError::InvalidArgument("retry_statuses".into()),
            RetryError::Transport(e) => e.into(),
        }
    }
}

impl From<TransportError> for HostedModelError {
    fn from(err: TransportError) -> Self {
        HostedModelError::Network {
            code: err.code().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_names_the_argument() {
        let err = HostedModelError::InvalidArgument("input".into());
        assert_eq!(err.to_string(), "The required argument \"input\" is invalid.");
    }

    #[test]
    fn test_network_error_display_with_code() {
        let err = HostedModelError::Network {
            code: Some("ECONNREFUSED".into()),
        };
        assert!(err.to_string().starts_with("A network error has occurred: ECONNREFUSED."));
    }

    #[test]
    fn test_network_error_display_without_code() {
        let err = HostedModelError::Network { code: None };
        assert!(err.to_string().starts_with("A network error has occurred. Please"));
    }

    #[test]
    fn test_model_error_points_at_info() {
        assert!(HostedModelError::Model.to_string().contains("info()"));
    }

    #[test]
    fn test_from_retry_error_transport_keeps_code() {
        let err: HostedModelError =
            RetryError::Transport(TransportError::new(Some("ETIMEDOUT"), "timed out")).into();
        assert_eq!(
            err,
            HostedModelError::Network {
                code: Some("ETIMEDOUT".into())
            }
        );
    }

    #[test]
    fn test_from_retry_error_empty_status_set() {
        let err: HostedModelError = RetryError::EmptyStatusSet.into();
        assert!(matches!(err, HostedModelError::InvalidArgument(name) if name == "retry_statuses"));
    }
}

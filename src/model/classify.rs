//! Turns a funnel response into a JSON payload or a typed error.

use log::{debug, warn};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{HostedModelError, Result};
use crate::http::Response;

/// A response is an error unless it is a 2xx carrying a JSON body.
pub(crate) fn is_error_response(response: &Response) -> bool {
    !response.is_json() || !response.status.is_success()
}

pub(crate) fn classify(response: Response) -> Result<Value> {
    if is_error_response(&response) {
        debug!(
            "Hosted model answered {} with content-type {:?}",
            response.status,
            response.content_type()
        );
        return Err(match response.status {
            StatusCode::UNAUTHORIZED => HostedModelError::PermissionDenied,
            StatusCode::NOT_FOUND => HostedModelError::NotFound,
            StatusCode::INTERNAL_SERVER_ERROR => HostedModelError::Model,
            _ => HostedModelError::Unexpected,
        });
    }

    response.json().map_err(|e| {
        warn!("Hosted model sent an undecodable JSON body: {}", e);
        HostedModelError::Unexpected
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_TYPE, HeaderValue};
    use serde_json::json;

    fn json_response(status: u16) -> Response {
        Response::json_body(StatusCode::from_u16(status).unwrap(), &json!({"error": "x"}))
    }

    #[test]
    fn test_success_returns_body() {
        let response = Response::json_body(StatusCode::OK, &json!({"generated_text": "hi"}));
        assert_eq!(classify(response).unwrap(), json!({"generated_text": "hi"}));
    }

    #[test]
    fn test_success_body_is_not_shape_checked() {
        let response = Response::json_body(StatusCode::CREATED, &json!([1, 2, 3]));
        assert_eq!(classify(response).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_named_statuses() {
        assert_eq!(classify(json_response(401)), Err(HostedModelError::PermissionDenied));
        assert_eq!(classify(json_response(404)), Err(HostedModelError::NotFound));
        assert_eq!(classify(json_response(500)), Err(HostedModelError::Model));
    }

    #[test]
    fn test_other_statuses_are_unexpected() {
        for status in [418, 400, 403, 503, 301] {
            assert_eq!(
                classify(json_response(status)),
                Err(HostedModelError::Unexpected),
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_ok_with_non_json_content_type_is_unexpected() {
        let response = Response::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .with_body("<html></html>");
        assert!(is_error_response(&response));
        assert_eq!(classify(response), Err(HostedModelError::Unexpected));
    }

    #[test]
    fn test_non_json_status_still_classified() {
        let response = Response::new(StatusCode::NOT_FOUND)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert_eq!(classify(response), Err(HostedModelError::NotFound));
    }

    #[test]
    fn test_missing_content_type_is_error() {
        let response = Response::new(StatusCode::OK).with_body("{}");
        assert_eq!(classify(response), Err(HostedModelError::Unexpected));
    }

    #[test]
    fn test_undecodable_json_is_unexpected() {
        let response = Response::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body("{not json");
        assert_eq!(classify(response), Err(HostedModelError::Unexpected));
    }
}

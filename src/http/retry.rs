//! Resend-on-status funnel that every hosted model request passes through.

use std::num::NonZeroUsize;

use log::{debug, warn};
use reqwest::StatusCode;
use thiserror::Error;

use super::transport::{Request, Response, Transport, TransportError};

/// Statuses resent by default: the gateway is still waking the model (502)
/// or the model is shedding load (429).
pub const DEFAULT_RETRY_STATUSES: [StatusCode; 2] =
    [StatusCode::BAD_GATEWAY, StatusCode::TOO_MANY_REQUESTS];

/// Which response statuses trigger an immediate resend, and how many attempts
/// are allowed in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    statuses: Vec<StatusCode>,
    max_attempts: Option<NonZeroUsize>,
}

impl RetryPolicy {
    /// Builds a policy from an ordered list of statuses. Duplicates are
    /// dropped, keeping the first occurrence.
    pub fn new(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        let mut unique: Vec<StatusCode> = Vec::new();
        for status in statuses {
            if !unique.contains(&status) {
                unique.push(status);
            }
        }
        Self {
            statuses: unique,
            max_attempts: None,
        }
    }

    /// Caps the total number of transport calls. `None` never gives up.
    pub fn with_max_attempts(mut self, max_attempts: Option<NonZeroUsize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn statuses(&self) -> &[StatusCode] {
        &self.statuses
    }

    pub fn max_attempts(&self) -> Option<NonZeroUsize> {
        self.max_attempts
    }

    pub fn should_retry(&self, status: StatusCode) -> bool {
        self.statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_STATUSES)
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("retryable statuses must include at least one status code")]
    EmptyStatusSet,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Sends `request`, resending it immediately for as long as the response
/// status is one of the policy's retryable statuses.
///
/// There is no delay between attempts. Without `max_attempts` the loop only
/// ends on a non-retryable status or a transport failure; with it, the last
/// response is returned unchanged once the cap is hit. Transport failures are
/// never retried.
#[tracing::instrument(skip(transport, policy, request), fields(url = %request.url))]
pub async fn send_with_retry<T>(
    transport: &T,
    policy: &RetryPolicy,
    request: &Request,
) -> Result<Response, RetryError>
where
    T: Transport + ?Sized,
{
    if policy.statuses.is_empty() {
        return Err(RetryError::EmptyStatusSet);
    }

    let mut attempt: usize = 0;
    loop {
        attempt += 1;
        let response = transport.send(request).await?;

        if !policy.should_retry(response.status) {
            debug!(
                "{} {}: status {} after {} attempt(s)",
                request.method, request.url, response.status, attempt
            );
            return Ok(response);
        }

        if let Some(max) = policy.max_attempts {
            if attempt >= max.get() {
                warn!(
                    "{} {}: still {} after {} attempts, giving up",
                    request.method, request.url, response.status, attempt
                );
                return Ok(response);
            }
        }

        warn!(
            "{} {}: attempt {} returned {}, resending...",
            request.method, request.url, attempt, response.status
        );
    }
}

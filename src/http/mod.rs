//! HTTP plumbing: the transport seam and the resend-on-status funnel.

mod retry;
mod transport;

pub use retry::{DEFAULT_RETRY_STATUSES, RetryError, RetryPolicy, send_with_retry};
pub use transport::{ReqwestTransport, Request, Response, Transport, TransportError};

#[cfg(test)]
pub use transport::MockTransport;

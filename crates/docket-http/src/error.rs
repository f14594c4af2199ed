//! Transport error type.

/// Failure to obtain a response from the remote service.
///
/// Non-2xx responses are not transport errors; they come back as a
/// [`Response`](crate::Response) and are classified by the service client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network failure, timeout or protocol error.
    #[error("{0}")]
    Http(#[from] ureq::Error),

    /// Transport could not be used (closed, or scripted failure in tests).
    #[error("{0}")]
    Unavailable(String),
}

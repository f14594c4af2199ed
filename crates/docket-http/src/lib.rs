//! Blocking HTTP plumbing shared by the docket service clients.
//!
//! - [`Transport`]: the seam every remote call goes through
//! - [`UreqTransport`]: production implementation backed by a ureq [`Agent`](ureq::Agent)
//! - [`ApiClient`]: base URL, basic auth and default headers for one service
//! - `MockTransport` (feature `mock`): scripted responses for tests

mod api;
mod error;
mod request;
mod transport;

#[cfg(any(test, feature = "mock"))]
mod mock;

pub use api::{ApiClient, basic_auth_header, encode_path_segment};
pub use error::TransportError;
pub use request::{Method, Request, Response};
pub use transport::{MAX_BODY_BYTES, Transport, UreqTransport};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

/// Upper bound on requests made by any one pagination loop.
pub const MAX_PAGES: usize = 1000;

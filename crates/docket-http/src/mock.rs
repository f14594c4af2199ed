//! Mock transport for testing service clients without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::TransportError;
use crate::request::{Method, Request, Response};
use crate::transport::Transport;

#[derive(Debug, Clone)]
enum Reply {
    Response(Response),
    Failure(String),
}

/// Scripted transport.
///
/// Replies are registered per method and URL path and consumed in order; the
/// last reply for a route is repeated once the queue is down to one entry.
/// Unrouted requests get a 404 with a JSON `message`.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use docket_http::{Method, MockTransport};
///
/// let mock = Arc::new(
///     MockTransport::new().with_json(Method::Get, "/rest/api/2/myself", r#"{"name":"bot"}"#),
/// );
/// // hand `Box::new(Arc::clone(&mock))` to a client, then inspect `mock.requests()`
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    /// Create a mock without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `200` reply with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_json(self, method: Method, path: &str, body: &str) -> Self {
        self.with_response(method, path, Response::new(200, body))
    }

    /// Queue an arbitrary reply.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_response(self, method: Method, path: &str, response: Response) -> Self {
        self.push(method, path, Reply::Response(response));
        self
    }

    /// Queue a transport-level failure.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, method: Method, path: &str, message: &str) -> Self {
        self.push(method, path, Reply::Failure(message.to_owned()));
        self
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
    }

    /// All requests sent so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent to one route.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .cloned()
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let key = (request.method, request.path().to_owned());
        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(message)) => Err(TransportError::Unavailable(message)),
            None => Ok(Response::new(
                404,
                format!(
                    r#"{{"message":"no mock route for {} {}"}}"#,
                    request.method.as_str(),
                    request.path()
                ),
            )),
        }
    }
}

//! Purpose: HTTP POST seam between the call client and the network.
//! Exports: `Transport`, `TransportResponse`, `HttpTransport`, `CONTENT_TYPE`.
//! Role: One request per call; swapped for in-process stubs in tests.
//! Invariants: Non-2xx statuses are returned as data; only connection failures are errors.
//! Invariants: No retries or timeouts here; callers that need them wrap the client.
use std::sync::Arc;

use url::Url;

use crate::core::error::{Error, ErrorKind};

pub const CONTENT_TYPE: &str = "text/xml;charset=UTF-8";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport: Send + Sync {
    fn post(&self, url: &Url, content_type: &str, body: &str) -> Result<TransportResponse, Error>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post(&self, url: &Url, content_type: &str, body: &str) -> Result<TransportResponse, Error> {
        (**self).post(url, content_type, body)
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &Url, content_type: &str, body: &str) -> Result<TransportResponse, Error> {
        let response = match self
            .agent
            .post(url.as_str())
            .set("Content-Type", content_type)
            .send_string(body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(err)) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("request failed")
                    .with_source(err));
            }
        };
        let status = response.status();
        let body = response.into_string().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read response body")
                .with_status(status)
                .with_source(err)
        })?;
        Ok(TransportResponse { status, body })
    }
}

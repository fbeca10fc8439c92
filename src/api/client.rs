//! Purpose: Drive one SOAP request/response cycle against the remote bulk-email service.
//! Exports: `SoapClient`.
//! Role: Call orchestrator: build, send, receive, parse, classify, return.
//! Invariants: Missing credentials fail before any I/O (including debug artifacts).
//! Invariants: Exactly one transport round trip per call; no retries at this layer.
//! Invariants: Debug-sink failures never change a call's outcome.
#![allow(clippy::result_large_err)]

use std::sync::Arc;

use super::config::ClientConfig;
use super::debug_sink::{ArtifactNames, DebugSink, DirDebugSink, NullDebugSink, persist_best_effort};
use super::response::{fault_string, unwrap_response};
use super::transport::{CONTENT_TYPE, HttpTransport, Transport};
use crate::core::envelope::{Credentials, build_envelope};
use crate::core::error::{Error, ErrorKind};
use crate::core::value::{DecodedValue, EncodableValue};

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct SoapClient {
    inner: Arc<SoapClientInner>,
}

struct SoapClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    debug_sink: Arc<dyn DebugSink>,
}

impl SoapClient {
    /// Uses `HttpTransport`, and a `DirDebugSink` when `config.debug_dir` is set.
    pub fn new(config: ClientConfig) -> Self {
        let debug_sink: Arc<dyn DebugSink> = match &config.debug_dir {
            Some(dir) => Arc::new(DirDebugSink::new(dir.clone())),
            None => Arc::new(NullDebugSink),
        };
        Self {
            inner: Arc::new(SoapClientInner {
                config,
                transport: Arc::new(HttpTransport::new()),
                debug_sink,
            }),
        }
    }

    pub fn with_transport(self, transport: impl Transport + 'static) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        self.rebuild(|inner| inner.transport = transport)
    }

    pub fn with_debug_sink(self, debug_sink: impl DebugSink + 'static) -> Self {
        let debug_sink: Arc<dyn DebugSink> = Arc::new(debug_sink);
        self.rebuild(|inner| inner.debug_sink = debug_sink)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Calls `method` with the configured default credentials.
    pub fn call(&self, method: &str, args: &[EncodableValue]) -> ApiResult<DecodedValue> {
        self.call_with_credentials(method, args, None)
    }

    /// Calls `method`; `credentials` overrides the configured defaults when given.
    pub fn call_with_credentials(
        &self,
        method: &str,
        args: &[EncodableValue],
        credentials: Option<&Credentials>,
    ) -> ApiResult<DecodedValue> {
        let config = &self.inner.config;
        let credentials = credentials
            .or(config.credentials.as_ref())
            .filter(|credentials| credentials.is_complete())
            .ok_or_else(|| {
                Error::new(ErrorKind::Precondition)
                    .with_message("missing credentials")
                    .with_method(method)
                    .with_hint("Provide a user and token, or set SOAPWIRE_USER and SOAPWIRE_TOKEN.")
            })?;

        let request = build_envelope(method, args, credentials, &config.map_methods);
        let artifacts = ArtifactNames::for_call(method);
        persist_best_effort(self.inner.debug_sink.as_ref(), &artifacts.request, &request);

        tracing::debug!(method, bytes = request.len(), "sending soap request");
        let response = self
            .inner
            .transport
            .post(&config.endpoint, CONTENT_TYPE, &request)
            .map_err(|err| err.with_method(method))?;
        persist_best_effort(
            self.inner.debug_sink.as_ref(),
            &artifacts.response,
            &response.body,
        );
        tracing::debug!(
            method,
            status = response.status,
            bytes = response.body.len(),
            "received soap response"
        );

        if !response.is_success() {
            let mut err = Error::new(ErrorKind::Transport)
                .with_message(format!("remote returned status {}", response.status))
                .with_method(method)
                .with_status(response.status)
                .with_preview(&response.body);
            if let Some(fault) = fault_string(&response.body) {
                err = err.with_hint(format!("soap fault: {fault}"));
            }
            return Err(err);
        }

        unwrap_response(&response.body).map_err(|err| err.with_method(method))
    }

    fn rebuild(mut self, update: impl FnOnce(&mut SoapClientInner)) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            update(inner);
            return self;
        }
        let mut inner = SoapClientInner {
            config: self.inner.config.clone(),
            transport: Arc::clone(&self.inner.transport),
            debug_sink: Arc::clone(&self.inner.debug_sink),
        };
        update(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }
}

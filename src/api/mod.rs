//! Purpose: Public call surface for the remote bulk-email SOAP service.
//! Exports: `SoapClient`, config, transport and debug-sink seams, response unwrapping.
//! Role: Orchestration boundary over the pure codec in `crate::core`.
//! Invariants: Everything a call needs is injected through `ClientConfig` and the seams.
//! Invariants: Codec types are re-exported here so callers need a single import path.

mod client;
mod config;
mod debug_sink;
mod response;
mod transport;

pub use crate::core::encode::MapEncodingPolicy;
pub use crate::core::envelope::Credentials;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::value::{DecodedValue, EncodableScalar, EncodableValue, Object, Record};
pub use client::SoapClient;
pub use config::{
    ClientConfig, ENV_DEBUG_DIR, ENV_ENDPOINT, ENV_MAP_METHODS, ENV_TOKEN, ENV_USER,
    credentials_from_env, credentials_from_lookup, parse_endpoint, parse_method_list,
};
pub use debug_sink::{ArtifactNames, DebugSink, DirDebugSink, NullDebugSink};
pub use response::{ResponseBody, is_error_payload, parse_response, unwrap_payload, unwrap_response};
pub use transport::{CONTENT_TYPE, HttpTransport, Transport, TransportResponse};

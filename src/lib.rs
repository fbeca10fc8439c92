//! Purpose: Library crate behind the `soapwire` CLI: SOAP codec plus call client.
//! Exports: `core` (value model, encoder, envelope, tag scanner, decoder, errors), `api` (client).
//! Role: Talks to an AXIS/xml-soap flavored bulk-email RPC endpoint without a DOM parser.
//! Invariants: The codec is pure and holds no state; concurrent use needs no locking.
//! Invariants: Network and debug-artifact side effects live only in `api`.
pub mod api;
pub mod core;

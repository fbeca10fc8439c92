//! Purpose: Turn raw response text into the business payload or a typed error.
//! Exports: `ResponseBody`, `parse_response`, `unwrap_response`, `unwrap_payload`, `is_error_payload`.
//! Role: Parse/Classify/Return stages of a call; shared by `SoapClient` and the CLI `decode`.
//! Invariants: `webserviceReturn` wins over `return`; missing both is a `Parse` error.
//! Invariants: `return` text is JSON (double-encoded payloads); invalid JSON is `MalformedPayload`.
//! Invariants: Success returns the `data` field when present, else the whole payload.
use serde_json::Value;

use crate::core::decode::decode;
use crate::core::error::{Error, ErrorKind};
use crate::core::escape::unescape;
use crate::core::scan::{find_open_tag, is_nil_tag, scan_balanced, split_element};
use crate::core::value::DecodedValue;

const WEBSERVICE_RETURN: &str = "webserviceReturn";
const RETURN: &str = "return";

/// Body located in a response, before classification.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// `webserviceReturn` was present and nil: a successful call with nothing to return.
    Empty,
    Decoded(DecodedValue),
}

enum Located<'a> {
    Nil,
    Content(&'a str),
}

pub fn parse_response(raw: &str) -> Result<ResponseBody, Error> {
    if let Some(located) = locate(raw, WEBSERVICE_RETURN) {
        return Ok(match located {
            Located::Nil => ResponseBody::Empty,
            Located::Content(inner) => ResponseBody::Decoded(decode(inner, 0)),
        });
    }

    if let Some(located) = locate(raw, RETURN) {
        let text = match located {
            Located::Nil => String::new(),
            Located::Content(inner) => unescape(inner.trim()),
        };
        if text.is_empty() {
            tracing::debug!("return element is empty; treating as no payload");
            return Ok(ResponseBody::Decoded(DecodedValue::Null));
        }
        let json: Value = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::MalformedPayload)
                .with_message("return text is not valid json")
                .with_preview(&text)
                .with_source(err)
        })?;
        return Ok(ResponseBody::Decoded(DecodedValue::from(json)));
    }

    let mut err = Error::new(ErrorKind::Parse)
        .with_message("response has neither webserviceReturn nor return")
        .with_preview(raw);
    if let Some(fault) = fault_string(raw) {
        err = err.with_hint(format!("soap fault: {fault}"));
    }
    Err(err)
}

/// Runs parse, classify, and data extraction over a raw response.
pub fn unwrap_response(raw: &str) -> Result<DecodedValue, Error> {
    match parse_response(raw)? {
        ResponseBody::Empty => Ok(DecodedValue::Null),
        ResponseBody::Decoded(payload) => unwrap_payload(payload),
    }
}

pub fn unwrap_payload(payload: DecodedValue) -> Result<DecodedValue, Error> {
    if is_error_payload(&payload) {
        let message = remote_error_message(&payload);
        tracing::debug!(message = %message, "remote reported an error");
        return Err(Error::new(ErrorKind::Remote).with_message(message));
    }
    match payload {
        DecodedValue::Object(mut map) if map.contains_key("data") => {
            Ok(map.remove("data").unwrap_or(DecodedValue::Null))
        }
        other => Ok(other),
    }
}

/// True when `error` is `true`/`"true"` or `response_code` equals `error` ignoring case.
pub fn is_error_payload(payload: &DecodedValue) -> bool {
    let flagged = match payload.get("error") {
        Some(DecodedValue::Bool(flag)) => *flag,
        Some(DecodedValue::Str(text)) => text == "true",
        _ => false,
    };
    flagged
        || payload
            .get("response_code")
            .and_then(DecodedValue::as_str)
            .is_some_and(|code| code.eq_ignore_ascii_case("error"))
}

fn remote_error_message(payload: &DecodedValue) -> String {
    match payload.get("msg") {
        Some(DecodedValue::Str(text)) => text.clone(),
        Some(other) => other.to_json().to_string(),
        None => payload.to_json().to_string(),
    }
}

fn locate<'a>(raw: &'a str, tag: &str) -> Option<Located<'a>> {
    let open = find_open_tag(raw, tag, 0)?;
    let open_text = &raw[open.start..open.end];
    if is_nil_tag(open_text) {
        return Some(Located::Nil);
    }
    if open.self_closing {
        return Some(Located::Content(""));
    }
    let element = &raw[open.start..];
    let span = scan_balanced(element, tag).into_iter().next()?;
    let (_, inner) = split_element(element, span);
    Some(Located::Content(inner))
}

/// Extracts the SOAP `faultstring` text, if any.
pub(crate) fn fault_string(raw: &str) -> Option<String> {
    match locate(raw, "faultstring")? {
        Located::Nil => None,
        Located::Content(inner) => Some(unescape(inner.trim())).filter(|text| !text.is_empty()),
    }
}

//! Purpose: Build the complete SOAP 1.1 request document for one remote method call.
//! Exports: `Credentials`, `build_envelope`, `NS_*` namespace URIs.
//! Role: Wraps the method name, encoded arguments, and auth header; output goes on the wire as-is.
//! Invariants: Output is a pure function of its inputs (no timestamps, no random ids).
//! Invariants: The `ns2` xml-soap alias is always declared, even when no map items are used.
//! Invariants: `construct_params` and `execution_mode` are always sent as nil placeholders.
use std::fmt::{self, Write};

use super::encode::{MapEncodingPolicy, encode_with};
use super::escape::escape;
use super::value::EncodableValue;

pub const NS_SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const NS_XSD: &str = "http://www.w3.org/2001/XMLSchema";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const NS_SOAP_ENC: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const NS_XML_SOAP: &str = "http://xml.apache.org/xml-soap";

/// Account identifier and token sent in the `app_auth` header.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }

    /// Both halves must be non-empty to be usable.
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.token.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

pub fn build_envelope(
    method: &str,
    args: &[EncodableValue],
    auth: &Credentials,
    policy: &MapEncodingPolicy,
) -> String {
    let map_records = policy.uses_map_encoding(method);
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = write!(
        doc,
        concat!(
            "<SOAP-ENV:Envelope",
            " xmlns:SOAP-ENV=\"{}\"",
            " xmlns:xsd=\"{}\"",
            " xmlns:xsi=\"{}\"",
            " xmlns:SOAP-ENC=\"{}\"",
            " xmlns:ns2=\"{}\"",
            " SOAP-ENV:encodingStyle=\"{}\">"
        ),
        NS_SOAP_ENV, NS_XSD, NS_XSI, NS_SOAP_ENC, NS_XML_SOAP, NS_SOAP_ENC
    );

    doc.push_str("<SOAP-ENV:Header><app_auth xsi:type=\"ns2:Map\">");
    push_auth_entry(&mut doc, "user", &auth.user);
    push_auth_entry(&mut doc, "token", &auth.token);
    doc.push_str("</app_auth></SOAP-ENV:Header>");

    doc.push_str("<SOAP-ENV:Body><webservice>");
    let _ = write!(
        doc,
        "<method xsi:type=\"xsd:string\">{}</method>",
        escape(method)
    );
    if args.is_empty() {
        doc.push_str("<data xsi:nil=\"true\"/>");
    } else {
        let _ = write!(
            doc,
            "<data SOAP-ENC:arrayType=\"xsd:anyType[{}]\" xsi:type=\"SOAP-ENC:Array\">",
            args.len()
        );
        for arg in args {
            doc.push_str(&encode_with(arg, map_records));
        }
        doc.push_str("</data>");
    }
    doc.push_str("<construct_params xsi:nil=\"true\"/><execution_mode xsi:nil=\"true\"/>");
    doc.push_str("</webservice></SOAP-ENV:Body></SOAP-ENV:Envelope>");
    doc
}

fn push_auth_entry(doc: &mut String, key: &str, value: &str) {
    let _ = write!(
        doc,
        concat!(
            "<item>",
            "<key xsi:type=\"xsd:string\">{}</key>",
            "<value xsi:type=\"xsd:string\">{}</value>",
            "</item>"
        ),
        key,
        escape(value)
    );
}

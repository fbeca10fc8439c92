//! Purpose: XML text escaping for outgoing values and entity decoding for incoming text.
//! Exports: `escape`, `unescape`.
//! Invariants: `escape` rewrites exactly `& < > " '`; everything else passes through.
//! Invariants: `unescape` never fails; text with an unknown or malformed entity is kept verbatim.
use std::borrow::Cow;

pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Decodes the five predefined entities plus decimal (`&#NN;`) and hex (`&#xHH;`) references.
pub fn unescape(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::trace!(error = %err, "keeping text with unresolved entity verbatim");
            text.to_string()
        }
    }
}

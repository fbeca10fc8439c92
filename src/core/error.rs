//! Purpose: Single error type shared by the codec, the call client, and the CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`, `preview`.
//! Role: Carries a stable kind plus optional call context (method, status, payload preview).
//! Invariants: Kinds map 1:1 onto exit codes; the mapping never changes once published.
//! Invariants: Previews are bounded so raw payloads never flood logs or stderr.
use std::error::Error as StdError;
use std::fmt;

/// Maximum number of characters kept by [`preview`].
pub const PREVIEW_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    /// Raised before any network I/O (e.g. missing credentials).
    Precondition,
    /// Remote endpoint answered with a non-2xx status.
    Transport,
    Io,
    /// Neither `webserviceReturn` nor `return` was found in the response.
    Parse,
    /// `return` text was expected to hold JSON but did not.
    MalformedPayload,
    /// The decoded payload flagged itself as an error.
    Remote,
    /// A typed accessor found a different value shape than requested.
    UnexpectedShape,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    method: Option<String>,
    status: Option<u16>,
    preview: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            method: None,
            status: None,
            preview: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a bounded preview of `raw` (see [`preview`]).
    pub fn with_preview(mut self, raw: &str) -> Self {
        self.preview = Some(preview(raw));
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(method) = &self.method {
            write!(f, " (method: {method})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Precondition => 3,
        ErrorKind::Transport => 4,
        ErrorKind::Io => 5,
        ErrorKind::Parse => 6,
        ErrorKind::MalformedPayload => 7,
        ErrorKind::Remote => 8,
        ErrorKind::UnexpectedShape => 9,
    }
}

/// Trims `raw` and keeps at most [`PREVIEW_CHARS`] characters, marking truncation with `...`.
pub fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, PREVIEW_CHARS, preview, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Precondition, 3),
            (ErrorKind::Transport, 4),
            (ErrorKind::Io, 5),
            (ErrorKind::Parse, 6),
            (ErrorKind::MalformedPayload, 7),
            (ErrorKind::Remote, 8),
            (ErrorKind::UnexpectedShape, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_call_context() {
        let err = Error::new(ErrorKind::Transport)
            .with_message("remote returned non-success status")
            .with_method("sendBatch")
            .with_status(502);
        assert_eq!(
            err.to_string(),
            "Transport: remote returned non-success status (method: sendBatch) (status: 502)"
        );
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let raw = "é".repeat(PREVIEW_CHARS + 10);
        let out = preview(&raw);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn preview_keeps_short_text_trimmed() {
        assert_eq!(preview("  <html>oops</html>\n"), "<html>oops</html>");
    }
}

//! Purpose: Best-effort persistence of exact request/response bodies for offline inspection.
//! Exports: `DebugSink`, `NullDebugSink`, `DirDebugSink`, `ArtifactNames`.
//! Role: Side channel of the call client; never part of a call's result or error.
//! Invariants: Sink failures (errors or panics) are logged at warn and discarded.
//! Invariants: Artifact names are unique per process (timestamp + sequence number).
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

pub trait DebugSink: Send + Sync {
    fn persist(&self, name: &str, contents: &str) -> io::Result<()>;
}

impl<T: DebugSink + ?Sized> DebugSink for Arc<T> {
    fn persist(&self, name: &str, contents: &str) -> io::Result<()> {
        (**self).persist(name, contents)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullDebugSink;

impl DebugSink for NullDebugSink {
    fn persist(&self, _name: &str, _contents: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each artifact as a file under `dir`, creating the directory on demand.
#[derive(Clone, Debug)]
pub struct DirDebugSink {
    dir: PathBuf,
}

impl DirDebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DebugSink for DirDebugSink {
    fn persist(&self, name: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(name), contents)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactNames {
    pub request: String,
    pub response: String,
}

impl ArtifactNames {
    pub fn for_call(method: &str) -> Self {
        let stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map(|text| text.replace(':', "-"))
            .unwrap_or_else(|_| "unknown-time".to_string());
        let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
        let base = format!("{}-{stamp}-{seq}", file_safe(method));
        Self {
            request: format!("{base}-request.xml"),
            response: format!("{base}-response.xml"),
        }
    }
}

/// Errors and panics inside the sink are logged and dropped.
pub(crate) fn persist_best_effort(sink: &dyn DebugSink, name: &str, contents: &str) {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.persist(name, contents))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(artifact = name, error = %err, "debug sink write failed; ignoring");
        }
        Err(_) => {
            tracing::warn!(artifact = name, "debug sink panicked; ignoring");
        }
    }
}

fn file_safe(method: &str) -> String {
    let cleaned: String = method
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "call".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtifactNames, DebugSink, DirDebugSink, file_safe, persist_best_effort};
    use std::io;

    struct FailingSink;

    impl DebugSink for FailingSink {
        fn persist(&self, _name: &str, _contents: &str) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn names_are_unique_and_file_safe() {
        let first = ArtifactNames::for_call("send/Batch");
        let second = ArtifactNames::for_call("send/Batch");
        assert_ne!(first, second);
        assert!(first.request.starts_with("send_Batch-"));
        assert!(first.request.ends_with("-request.xml"));
        assert!(first.response.ends_with("-response.xml"));
        assert!(!first.request.contains(':'));
    }

    #[test]
    fn empty_method_gets_a_placeholder() {
        assert_eq!(file_safe(""), "call");
    }

    #[test]
    fn dir_sink_creates_directory_and_writes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sink = DirDebugSink::new(temp.path().join("nested").join("debug"));
        sink.persist("a.xml", "<x/>").expect("persist");
        let written = std::fs::read_to_string(sink.dir().join("a.xml")).expect("read");
        assert_eq!(written, "<x/>");
    }

    struct PanickingSink;

    impl DebugSink for PanickingSink {
        fn persist(&self, _name: &str, _contents: &str) -> io::Result<()> {
            panic!("sink exploded");
        }
    }

    #[test]
    fn failures_are_swallowed() {
        persist_best_effort(&FailingSink, "a.xml", "<x/>");
    }

    #[test]
    fn panics_are_swallowed() {
        persist_best_effort(&PanickingSink, "a.xml", "<x/>");
    }
}

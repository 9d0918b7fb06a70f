use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::info;

/// Receives debug trace entries as they are appended.
pub trait TraceSink: Send + Sync {
    fn emit(&self, entry: &str);
}

/// Mirrors entries onto the `zoneinfo::trace` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, entry: &str) {
        info!(target: "zoneinfo::trace", "{}", entry);
    }
}

/// Ordered, append-only log of what an inspection run did.
#[derive(Clone, Default)]
pub struct DebugTrace {
    entries: Vec<String>,
    sink: Option<Arc<dyn TraceSink>>,
}

impl DebugTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trace that also hands every entry to `sink` at append time.
    pub fn mirrored(sink: Arc<dyn TraceSink>) -> Self {
        Self {
            entries: Vec::new(),
            sink: Some(sink),
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if let Some(sink) = &self.sink {
            sink.emit(&entry);
        }
        self.entries.push(entry);
    }

    pub fn warning(&mut self, message: impl fmt::Display) {
        self.push(format!("WARNING: {}", message));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Remove and return all entries, keeping the sink.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DebugTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugTrace")
            .field("entries", &self.entries)
            .field("mirrored", &self.sink.is_some())
            .finish()
    }
}

impl Serialize for DebugTrace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

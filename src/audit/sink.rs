//! Audit sinks.
//!
//! A sink only has to append; it never sees an event twice and never
//! mutates one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::audit::event::{AuditEvent, AuditStatus};

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> io::Result<()>;
}

/// Forwards events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, event: &AuditEvent) -> io::Result<()> {
        let details = serde_json::Value::Object(event.details.clone());
        match event.status {
            AuditStatus::Success => tracing::info!(
                target: "pin_gateway::audit",
                id = %event.id,
                action = %event.action,
                severity = ?event.severity,
                details = %details,
                "Audit event"
            ),
            AuditStatus::Failure => tracing::warn!(
                target: "pin_gateway::audit",
                id = %event.id,
                action = %event.action,
                severity = ?event.severity,
                details = %details,
                "Audit event"
            ),
        }
        Ok(())
    }
}

/// Keeps events in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn record(&self, event: &AuditEvent) -> io::Result<()> {
        self.events
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .push(event.clone());
        Ok(())
    }
}

/// Appends one JSON object per line, rotating by size.
///
/// Rotation renames `audit.log` → `audit.log.1` → … → `audit.log.<max_files>`,
/// dropping the oldest.
///
/// Writes are blocking `std::fs` calls made on the recording thread, one
/// short append per attempt. Recording is synchronous so the trail is
/// complete when an operation returns; wrap the sink yourself if that cost
/// matters on a busy runtime.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    max_bytes: u64,
    max_files: u32,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    /// Create the sink, making sure the parent directory exists.
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_files: u32) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            max_bytes,
            max_files,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotated(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&self) -> io::Result<()> {
        let oldest = self.rotated(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.max_files).rev() {
            let from = self.rotated(index);
            if from.exists() {
                fs::rename(&from, self.rotated(index + 1))?;
            }
        }
        if self.max_files > 0 {
            fs::rename(&self.path, self.rotated(1))
        } else {
            fs::remove_file(&self.path)
        }
    }
}

impl AuditSink for JsonLinesSink {
    fn record(&self, event: &AuditEvent) -> io::Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self
            .lock
            .lock()
            .map_err(|_| io::Error::other("audit file lock poisoned"))?;

        let current = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        if current > 0 && current + line.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let mut file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        file.flush()
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Representation of a file being organized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path to the file
    pub path: PathBuf,

    /// Lowercase compound extension with leading dot, empty if none
    pub extension: String,

    /// File size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub modified: SystemTime,

    /// Creation time, when the platform reports one
    pub created: Option<SystemTime>,
}

impl FileRecord {
    /// File name component of the path
    pub fn file_name(&self) -> &std::ffi::OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }
}

/// Result of processing a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    /// Source path of the file
    pub path: PathBuf,

    /// Whether the action succeeded
    pub success: bool,

    /// Human-readable description of what happened
    pub message: String,
}

impl ProcessingOutcome {
    pub fn succeeded(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            message: message.into(),
        }
    }
}

/// Messages of a finished run, each list in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeReport {
    pub success: Vec<String>,
    pub failed: Vec<String>,
}

impl OrganizeReport {
    /// File an outcome under the matching list
    pub fn record(&mut self, outcome: ProcessingOutcome) {
        if outcome.success {
            self.success.push(outcome.message);
        } else {
            self.failed.push(outcome.message);
        }
    }

    /// Total number of outcomes recorded
    pub fn len(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cooperative cancellation flag shared between the caller and workers
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that tasks which have not started yet are skipped
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

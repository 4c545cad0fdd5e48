use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::compute_cryptographic;
use crate::config::DetectionMethod;
use crate::error::{Error, Result};

/// Compute the de-duplication key of a file.
///
/// `Size` keys collide for distinct files of equal length and `Name` keys
/// collide for distinct files sharing a name; both are accepted trade-offs
/// of the cheaper methods.
pub fn identity_key(path: &Path, method: DetectionMethod) -> Result<String> {
    match method {
        DetectionMethod::Hash => Ok(compute_cryptographic(path)?.to_hex().to_string()),
        DetectionMethod::Size => {
            let metadata = std::fs::metadata(path).map_err(|source| Error::FileAccess {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(metadata.len().to_string())
        }
        DetectionMethod::Name => path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .ok_or_else(|| Error::FileAccess {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Path has no file name",
                ),
            }),
    }
}

/// First-seen path for every identity key of one organizer run
#[derive(Debug, Default)]
pub struct IdentityIndex {
    seen: Mutex<HashMap<String, PathBuf>>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for `path`.
    ///
    /// Returns `None` if the key was free and is now owned by `path`, or the
    /// path that claimed it first. Lookup and insert happen under one lock so
    /// exactly one caller wins each key.
    pub fn claim(&self, key: String, path: &Path) -> Option<PathBuf> {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(original) = seen.get(&key) {
            debug!(
                "Identity {} of {} already claimed by {}",
                key,
                path.display(),
                original.display()
            );
            return Some(original.clone());
        }

        seen.insert(key, path.to_path_buf());
        None
    }

    /// Number of distinct keys claimed so far
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

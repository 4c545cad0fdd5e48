use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Disposition;
use crate::error::{Error, Result};
use crate::logging::log_fs_modification;
use crate::safety::SafetyManager;

/// What was done with a duplicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateAction {
    /// Moved into the quarantine directory
    Moved(PathBuf),

    /// Removed from disk
    Deleted,

    /// Left in place
    Kept,
}

/// Dispose of `path`, a duplicate of `original`, according to `disposition`.
///
/// `original` is only used for logging and is never touched. Quarantine name
/// clashes follow the mover's backup-then-overwrite rule.
pub fn handle_duplicate(
    path: &Path,
    original: &Path,
    disposition: Disposition,
    quarantine_dir: &Path,
    safety: &SafetyManager,
) -> Result<DuplicateAction> {
    let action = match disposition {
        Disposition::Move => {
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::FileNotFound(path.to_path_buf()))?;
            let dst = quarantine_dir.join(file_name);
            safety.move_file(path, &dst).map_err(|e| {
                Error::file_operation(format!("Failed to handle duplicate {}", path.display()), e)
            })?;
            info!(
                "Moved duplicate {} (original {}) to {}",
                path.display(),
                original.display(),
                dst.display()
            );
            DuplicateAction::Moved(dst)
        }
        Disposition::Delete => {
            fs::remove_file(path).map_err(|e| {
                Error::file_operation(format!("Failed to handle duplicate {}", path.display()), e)
            })?;
            log_fs_modification(
                "delete",
                path,
                Some(&format!("duplicate of {}", original.display())),
            );
            DuplicateAction::Deleted
        }
        Disposition::Keep => {
            info!(
                "Keeping duplicate {} (original {})",
                path.display(),
                original.display()
            );
            DuplicateAction::Kept
        }
    };

    Ok(action)
}

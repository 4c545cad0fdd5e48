//! Crash-resilient file moves.
//!
//! A move into an occupied destination first copies the existing file to
//! `<destination>.bak`. The backup is removed once the move is verified and
//! put back if any step fails, so an interrupted move leaves either the old
//! destination file or a recoverable backup on disk.

use log::{debug, warn};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};

/// The filesystem primitive that relocates one file
pub trait Transfer: Send + Sync {
    fn transfer(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// Rename, or copy-then-delete across filesystems
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTransfer;

impl Transfer for FsTransfer {
    fn transfer(&self, src: &Path, dst: &Path) -> io::Result<()> {
        match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                debug!(
                    "Rename across devices not possible, copying {} to {}",
                    src.display(),
                    dst.display()
                );
                copy_then_remove(src, dst)
            }
            Err(e) => Err(e),
        }
    }
}

/// Copy, confirm the copy is complete, then remove the source
fn copy_then_remove(src: &Path, dst: &Path) -> io::Result<()> {
    let expected = fs::metadata(src)?.len();
    let copied = fs::copy(src, dst)?;
    ensure_complete_copy(src, dst, expected, copied)?;

    fs::remove_file(src)
}

/// Fail, and discard the partial `dst`, unless `expected` bytes landed
fn ensure_complete_copy(src: &Path, dst: &Path, expected: u64, copied: u64) -> io::Result<()> {
    let on_disk = fs::metadata(dst)?.len();
    if copied == expected && on_disk == expected {
        return Ok(());
    }

    if let Err(e) = fs::remove_file(dst) {
        warn!("Could not remove partial copy {}: {}", dst.display(), e);
    }

    Err(io::Error::new(
        io::ErrorKind::Other,
        format!(
            "Copy of {} is incomplete ({} of {} bytes)",
            src.display(),
            on_disk,
            expected
        ),
    ))
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV
    err.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_device(err: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

/// Path of the backup taken before overwriting `dst`
pub fn backup_path(dst: &Path) -> PathBuf {
    let mut name = OsString::from(dst.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Create a directory and its parents, succeeding if it already exists
pub fn ensure_dir_exists(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Performs safe moves through a [`Transfer`]
pub struct SafetyManager {
    transfer: Box<dyn Transfer>,
}

impl Default for SafetyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyManager {
    /// Create a SafetyManager backed by the real filesystem
    pub fn new() -> Self {
        Self::with_transfer(FsTransfer)
    }

    /// Create a SafetyManager that relocates files through `transfer`
    pub fn with_transfer(transfer: impl Transfer + 'static) -> Self {
        Self {
            transfer: Box::new(transfer),
        }
    }

    /// Move `src` to `dst`, backing up and restoring any existing `dst`.
    ///
    /// On failure the returned [`Error::FileOperation`] carries the cause and,
    /// when the backup could not be put back, the restore error as well.
    pub fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let backup = backup_path(dst);
        let mut backup_taken = false;

        match self.attempt_move(src, dst, &backup, &mut backup_taken) {
            Ok(()) => {
                if backup_taken {
                    if let Err(e) = fs::remove_file(&backup) {
                        // The move itself is complete
                        warn!("Could not remove backup {}: {}", backup.display(), e);
                    }
                }
                log_fs_modification("move", src, Some(&format!("to {}", dst.display())));
                Ok(())
            }
            Err(cause) => {
                log_file_error(src, "move", &cause);

                let restore_error = if backup_taken && backup.exists() {
                    match fs::rename(&backup, dst) {
                        Ok(()) => {
                            log_fs_modification("restore", dst, Some("from backup"));
                            None
                        }
                        Err(e) => {
                            log_file_error(&backup, "restore", &e);
                            Some(e)
                        }
                    }
                } else {
                    None
                };

                Err(Error::FileOperation {
                    context: format!(
                        "Failed to move file from {} to {}",
                        src.display(),
                        dst.display()
                    ),
                    source: Box::new(cause),
                    restore_error,
                })
            }
        }
    }

    fn attempt_move(
        &self,
        src: &Path,
        dst: &Path,
        backup: &Path,
        backup_taken: &mut bool,
    ) -> Result<()> {
        if let Some(parent) = dst.parent() {
            ensure_dir_exists(parent)?;
        }

        if dst.exists() {
            // Never overwrite a file that merely shares the backup name
            if backup.exists() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Backup path {} is already in use", backup.display()),
                )));
            }
            fs::copy(dst, backup)?;
            *backup_taken = true;
            debug!("Backed up {} to {}", dst.display(), backup.display());
        }

        self.transfer.transfer(src, dst)?;

        if !dst.exists() {
            return Err(Error::MoveVerification(dst.to_path_buf()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Reports success without touching the filesystem
    struct VanishingTransfer;

    impl Transfer for VanishingTransfer {
        fn transfer(&self, src: &Path, _dst: &Path) -> io::Result<()> {
            fs::remove_file(src)
        }
    }

    /// Always fails
    struct FailingTransfer;

    impl Transfer for FailingTransfer {
        fn transfer(&self, _src: &Path, _dst: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/a/b/report.pdf")),
            PathBuf::from("/a/b/report.pdf.bak")
        );
    }

    #[test]
    fn test_move_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("test_file.txt");
        fs::write(&src, "test content").unwrap();
        let dst = dir.path().join("dest").join("nested").join("moved.txt");

        SafetyManager::new().move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "test content");
    }

    #[test]
    fn test_move_over_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("test_file.txt");
        fs::write(&src, "test content").unwrap();
        let dst = dir.path().join("dest").join("test_file.txt");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, "original content").unwrap();

        SafetyManager::new().move_file(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "test content");
        assert!(!backup_path(&dst).exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_verification_failure() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "content").unwrap();
        let dst = dir.path().join("out").join("a.txt");

        let err = SafetyManager::with_transfer(VanishingTransfer)
            .move_file(&src, &dst)
            .unwrap_err();

        match err {
            Error::FileOperation { source, restore_error, .. } => {
                assert!(matches!(*source, Error::MoveVerification(_)));
                assert!(restore_error.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_move_restores_backup() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("new.txt");
        fs::write(&src, "new content").unwrap();
        let dst = dir.path().join("existing.txt");
        fs::write(&dst, "old content").unwrap();

        let err = SafetyManager::with_transfer(FailingTransfer)
            .move_file(&src, &dst)
            .unwrap_err();

        assert!(matches!(err, Error::FileOperation { .. }));
        assert!(err.to_string().contains("denied"));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "old content");
        assert_eq!(fs::read_to_string(&src).unwrap(), "new content");
        assert!(!backup_path(&dst).exists());
    }

    #[test]
    fn test_verification_failure_restores_overwritten_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("new.txt");
        fs::write(&src, "new content").unwrap();
        let dst = dir.path().join("existing.txt");
        fs::write(&dst, "old content").unwrap();

        /// Consumes both files and reports success
        struct Clobber;
        impl Transfer for Clobber {
            fn transfer(&self, src: &Path, dst: &Path) -> io::Result<()> {
                fs::remove_file(dst)?;
                fs::remove_file(src)
            }
        }

        let err = SafetyManager::with_transfer(Clobber)
            .move_file(&src, &dst)
            .unwrap_err();

        assert!(matches!(err, Error::FileOperation { .. }));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "old content");
        assert!(!backup_path(&dst).exists());
    }

    #[test]
    fn test_occupied_backup_path_blocks_move() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("new.txt");
        fs::write(&src, "new content").unwrap();
        let dst = dir.path().join("existing.txt");
        fs::write(&dst, "old content").unwrap();
        fs::write(backup_path(&dst), "user data").unwrap();

        let err = SafetyManager::new().move_file(&src, &dst).unwrap_err();

        assert!(matches!(err, Error::FileOperation { .. }));
        assert!(err.to_string().contains("already in use"));
        assert_eq!(fs::read_to_string(&src).unwrap(), "new content");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "old content");
        assert_eq!(fs::read_to_string(backup_path(&dst)).unwrap(), "user data");
    }

    #[test]
    fn test_failed_restore_reports_both_errors() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("new.txt");
        fs::write(&src, "new content").unwrap();
        let dst = dir.path().join("old.txt");
        fs::write(&dst, "old content").unwrap();

        /// Replaces `dst` with a non-empty directory, then fails
        struct DirectoryInTheWay;
        impl Transfer for DirectoryInTheWay {
            fn transfer(&self, _src: &Path, dst: &Path) -> io::Result<()> {
                fs::remove_file(dst)?;
                fs::create_dir(dst)?;
                fs::write(dst.join("inner"), "x")?;
                Err(io::Error::new(io::ErrorKind::Other, "transfer broke"))
            }
        }

        let err = SafetyManager::with_transfer(DirectoryInTheWay)
            .move_file(&src, &dst)
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("transfer broke"));
        assert!(text.contains("restoring backup also failed"));
        match err {
            Error::FileOperation { restore_error, .. } => assert!(restore_error.is_some()),
            other => panic!("unexpected error: {other}"),
        }
        // The backup survives for manual recovery
        assert_eq!(fs::read_to_string(backup_path(&dst)).unwrap(), "old content");
        assert_eq!(fs::read_to_string(&src).unwrap(), "new content");
    }

    #[test]
    fn test_incomplete_copy_is_discarded() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, vec![1u8; 10]).unwrap();
        fs::write(&dst, vec![1u8; 3]).unwrap();

        let err = ensure_complete_copy(&src, &dst, 10, 3).unwrap_err();

        assert!(err.to_string().contains("incomplete"));
        assert!(!dst.exists());
        assert!(src.exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = tempdir().unwrap();
        let err = SafetyManager::new()
            .move_file(&dir.path().join("missing"), &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, Error::FileOperation { .. }));
    }

    #[test]
    fn test_copy_then_remove() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, vec![7u8; 4096]).unwrap();

        copy_then_remove(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), vec![7u8; 4096]);
    }
}

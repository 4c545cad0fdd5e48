use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::FileRecord;

/// List the regular files directly inside `directory`.
///
/// Subdirectories (including category and quarantine folders) are skipped,
/// as are entries that vanish or cannot be inspected while listing.
pub fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(Error::FileNotFound(directory.to_path_buf()));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        } else {
            debug!("Not a regular file, skipping: {}", entry.path().display());
        }
    }

    files.sort();
    Ok(files)
}

impl FileRecord {
    /// Read the metadata needed to classify and place a file
    pub fn from_path(path: &Path) -> Result<Self> {
        let (size, modified, created) = get_file_metadata(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .file_name()
            .map(|name| compound_extension(&name.to_string_lossy()))
            .unwrap_or_default();

        Ok(FileRecord {
            path: path.to_path_buf(),
            extension,
            size,
            modified,
            created,
        })
    }
}

/// Lowercase extension of a file name, including every dotted segment.
///
/// Leading dots belong to the name, so `.bashrc` has no extension while
/// `Backup.TAR.GZ` yields `.tar.gz`.
pub fn compound_extension(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    let stem_start = lower.len() - lower.trim_start_matches('.').len();

    match lower[stem_start..].find('.') {
        Some(idx) => lower[stem_start + idx..].to_string(),
        None => String::new(),
    }
}

/// Get file metadata
fn get_file_metadata(
    path: &Path,
) -> io::Result<(u64, std::time::SystemTime, Option<std::time::SystemTime>)> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "Not a file"));
    }
    let size = metadata.len();
    let last_modified = metadata.modified()?;
    let created = metadata.created().ok();

    Ok((size, last_modified, created))
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"DUMMY FILE DATA").unwrap();
        file_path
    }

    #[test]
    fn test_compound_extension() {
        assert_eq!(compound_extension("report.pdf"), ".pdf");
        assert_eq!(compound_extension("Photo.JPG"), ".jpg");
        assert_eq!(compound_extension("backup.tar.gz"), ".tar.gz");
        assert_eq!(compound_extension("README"), "");
        assert_eq!(compound_extension(".bashrc"), "");
        assert_eq!(compound_extension(".config.json"), ".json");
        assert_eq!(compound_extension("trailing."), ".");
    }

    #[test]
    fn test_list_files_is_not_recursive() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("images");
        fs::create_dir(&subdir).unwrap();

        let expected = vec![
            create_test_file(dir.path(), "a.txt"),
            create_test_file(dir.path(), "b.jpg"),
        ];
        create_test_file(&subdir, "nested.jpg");

        let listed = list_files(dir.path()).unwrap();
        assert_eq!(listed, expected);
    }

    #[test]
    fn test_list_files_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(list_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_files_nonexistent_directory() {
        let result = list_files(Path::new("/path/that/does/not/exist"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_file_record_from_path() {
        let dir = tempdir().unwrap();
        let path = create_test_file(dir.path(), "Archive.Tar.Gz");

        let record = FileRecord::from_path(&path).unwrap();
        assert_eq!(record.path, path);
        assert_eq!(record.extension, ".tar.gz");
        assert_eq!(record.size, 15);
        assert_eq!(record.file_name(), "Archive.Tar.Gz");
    }

    #[test]
    fn test_file_record_missing_file() {
        let dir = tempdir().unwrap();
        let result = FileRecord::from_path(&dir.path().join("gone.txt"));
        assert!(matches!(result, Err(Error::FileAccess { .. })));
    }
}

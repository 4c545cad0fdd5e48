use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the file-organizer library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File could not be read while computing its identity or metadata
    #[error("Failed to access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination missing after a move reported success.
    ///
    /// The file is either still at its source or was lost between the move
    /// and the check; callers cannot assume either location.
    #[error("File move verification failed for {}", .0.display())]
    MoveVerification(PathBuf),

    /// A backup, move, restore or delete step failed.
    ///
    /// `restore_error` is set when putting the `.bak` file back also failed.
    #[error("{context}: {source}{}", restore_note(.restore_error))]
    FileOperation {
        context: String,
        #[source]
        source: Box<Error>,
        restore_error: Option<std::io::Error>,
    },

    /// Category or quarantine directories could not be created
    #[error("Failed to set up directory {}: {source}", .path.display())]
    OrganizerSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found error
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Wrap a lower-level failure with a description of the step that failed
    pub fn file_operation(context: impl Into<String>, source: impl Into<Error>) -> Self {
        Error::FileOperation {
            context: context.into(),
            source: Box::new(source.into()),
            restore_error: None,
        }
    }

    /// Whether this error aborts a whole run rather than a single file
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Error::OrganizerSetup { .. } | Error::Configuration(_) | Error::FileNotFound(_)
        )
    }
}

fn restore_note(restore_error: &Option<std::io::Error>) -> String {
    match restore_error {
        Some(e) => format!(" (restoring backup also failed: {})", e),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_file_operation_display_includes_cause() {
        let err = Error::file_operation(
            "Failed to move file from a to b",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.starts_with("Failed to move file from a to b"));
        assert!(text.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_file_operation_display_includes_restore_failure() {
        let err = Error::FileOperation {
            context: "Failed to move file from a to b".to_string(),
            source: Box::new(Error::MoveVerification(PathBuf::from("b"))),
            restore_error: Some(io::Error::new(io::ErrorKind::Other, "disk full")),
        };
        let text = err.to_string();
        assert!(text.contains("verification failed"));
        assert!(text.contains("restoring backup also failed: disk full"));
    }

    #[test]
    fn test_setup_classification() {
        let setup = Error::OrganizerSetup {
            path: PathBuf::from("/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(setup.is_setup());
        assert!(!Error::MoveVerification(PathBuf::from("/x")).is_setup());
    }
}

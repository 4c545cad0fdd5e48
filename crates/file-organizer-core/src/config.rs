use log::LevelFilter;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Default category table, in matching order
static DEFAULT_CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    vec![
        Category::new(
            "images",
            &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff", ".svg"],
        ),
        Category::new(
            "documents",
            &[".pdf", ".docx", ".txt", ".pptx", ".xlsx", ".odt", ".rtf", ".csv", ".ods"],
        ),
        Category::new("archives", &[".zip", ".tar.gz", ".rar", ".7z", ".bz2"]),
        Category::new("videos", &[".mp4", ".mov", ".mkv", ".avi", ".flv", ".wmv"]),
        Category::new("music", &[".mp3", ".wav", ".ogg", ".flac"]),
        Category::new("others", &[]),
    ]
});

/// A named destination bucket and the extensions that route into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    /// Lowercase extensions with leading dot, e.g. `.tar.gz`
    pub extensions: Vec<String>,
}

impl Category {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// How the identity key of a file is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Cryptographic digest of the file contents
    Hash,

    /// Byte length. Distinct files of equal size collide.
    Size,

    /// Lowercase file name
    Name,
}

/// What happens to a file whose identity key was already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Move into the quarantine directory
    Move,

    /// Remove the file
    Delete,

    /// Leave the file where it is
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePolicy {
    pub enabled: bool,
    pub detection_method: DetectionMethod,
    pub disposition: Disposition,

    /// Relative to the base directory
    pub quarantine_dir: PathBuf,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            detection_method: DetectionMethod::Hash,
            disposition: Disposition::Move,
            quarantine_dir: PathBuf::from("_duplicates"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// `YYYY-MM`
    Monthly,

    /// `YYYY-Qn`
    Quarterly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBucketing {
    pub enabled: bool,

    /// Use creation time instead of modification time
    pub use_creation_time: bool,

    pub granularity: Granularity,
}

impl Default for DateBucketing {
    fn default() -> Self {
        Self {
            enabled: false,
            use_creation_time: true,
            granularity: Granularity::Monthly,
        }
    }
}

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Configuration for an organizer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Directory whose immediate files are organized
    pub base_directory: PathBuf,

    /// Category table, matched in declaration order
    pub categories: Vec<Category>,

    /// Catch-all category used when no extension matches
    pub fallback_category: String,

    /// Duplicate detection and disposition
    pub duplicates: DuplicatePolicy,

    /// Optional date sub-folders under each category
    pub date_bucketing: DateBucketing,

    /// Number of concurrent file operations (0 = one per CPU)
    pub worker_count: usize,

    /// Log file written by the CLI
    pub log_file: PathBuf,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            categories: DEFAULT_CATEGORIES.clone(),
            fallback_category: "others".to_string(),
            duplicates: DuplicatePolicy::default(),
            date_bucketing: DateBucketing::default(),
            worker_count: 4,
            log_file: PathBuf::from("file_organizer.log"),
            log_level: LogLevel::Info,
        }
    }
}

/// The user's downloads directory, or `~/Downloads` when the platform has none
pub fn default_base_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

impl OrganizerConfig {
    /// Replace the base directory
    pub fn with_base_directory(mut self, base_directory: impl Into<PathBuf>) -> Self {
        self.base_directory = base_directory.into();
        self
    }

    /// Replace the worker count
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Worker count with the `0 = auto` convention resolved
    pub fn effective_workers(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_count
        }
    }

    /// Absolute quarantine directory, when duplicates are enabled
    pub fn quarantine_path(&self) -> Option<PathBuf> {
        self.duplicates
            .enabled
            .then(|| self.base_directory.join(&self.duplicates.quarantine_dir))
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: OrganizerConfig = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Configuration(
                "At least one category must be declared".to_string(),
            ));
        }

        let fallback = self
            .categories
            .iter()
            .find(|c| c.name == self.fallback_category)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "Fallback category '{}' is not declared",
                    self.fallback_category
                ))
            })?;

        if !fallback.extensions.is_empty() {
            return Err(Error::Configuration(format!(
                "Fallback category '{}' must not declare extensions",
                fallback.name
            )));
        }

        for category in &self.categories {
            if category.name.is_empty() || category.name.contains(['/', '\\']) {
                return Err(Error::Configuration(format!(
                    "Invalid category name '{}'",
                    category.name
                )));
            }

            for ext in &category.extensions {
                if !ext.starts_with('.') || ext.len() < 2 || *ext != ext.to_lowercase() {
                    return Err(Error::Configuration(format!(
                        "Extension '{}' in category '{}' must be lowercase and start with a dot",
                        ext, category.name
                    )));
                }
            }
        }

        if self.duplicates.enabled {
            let quarantine = &self.duplicates.quarantine_dir;
            let escapes = quarantine
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if quarantine.as_os_str().is_empty() || escapes {
                return Err(Error::Configuration(format!(
                    "Quarantine directory '{}' must be a relative path below the base directory",
                    quarantine.display()
                )));
            }

            if self
                .categories
                .iter()
                .any(|c| Path::new(&c.name) == quarantine.as_path())
            {
                return Err(Error::Configuration(format!(
                    "Quarantine directory '{}' clashes with a category",
                    quarantine.display()
                )));
            }
        }

        Ok(())
    }
}

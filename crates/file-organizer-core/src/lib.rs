//! Core functionality for organizing a directory of files.
//!
//! This library provides the components of an organizer run:
//! - File discovery and metadata extraction
//! - Identity keys and duplicate detection
//! - Category and date-based destination resolution
//! - Safe file moves with backup and restore

// -- External Dependencies --
use crossbeam::channel;
use indicatif::ProgressBar;
use log::{debug, error, info};

// -- Standard Library --
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod action;
pub mod classify;
pub mod config;
pub mod destination;
pub mod discovery;
pub mod logging;
pub mod processing;
pub mod safety;
pub mod types;

use action::handle_duplicate;
use processing::{identity_key, IdentityIndex};
use safety::{ensure_dir_exists, SafetyManager, Transfer};

/// Main entry point for organizing a directory
pub struct FileOrganizer {
    config: OrganizerConfig,
    quarantine_dir: Option<PathBuf>,
    index: IdentityIndex,
    safety_manager: SafetyManager,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl FileOrganizer {
    /// Validate `config` and create the category and quarantine directories.
    ///
    /// Any failure here is fatal to the run.
    pub fn new(config: OrganizerConfig) -> Result<Self> {
        config.validate()?;

        if !config.base_directory.is_dir() {
            return Err(Error::FileNotFound(config.base_directory.clone()));
        }

        let quarantine_dir = config.quarantine_path();
        setup_directories(&config, quarantine_dir.as_deref())?;

        Ok(Self {
            config,
            quarantine_dir,
            index: IdentityIndex::new(),
            safety_manager: SafetyManager::new(),
            cancel: CancellationToken::new(),
            progress: None,
        })
    }

    /// Relocate files through `transfer` instead of the real filesystem move
    pub fn with_transfer(mut self, transfer: impl Transfer + 'static) -> Self {
        self.safety_manager = SafetyManager::with_transfer(transfer);
        self
    }

    /// Skip files not yet started once `cancel` is tripped
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Advance `progress` once per finished file
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_directory
    }

    /// List the files of the base directory
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        discovery::list_files(&self.config.base_directory)
    }

    /// Organize every file directly inside the base directory.
    ///
    /// Per-file failures end up in `failed`; only listing errors are returned.
    pub fn organize(&self) -> Result<OrganizeReport> {
        let files = self.discover_files()?;
        let mut report = OrganizeReport::default();

        if files.is_empty() {
            info!("No files found to process");
            return Ok(report);
        }

        let workers = self.config.effective_workers();
        info!(
            "Organizing {} files in {} with {} workers",
            files.len(),
            self.base_dir().display(),
            workers
        );

        if let Some(progress) = &self.progress {
            progress.set_length(files.len() as u64);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("organizer-{}", i))
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build thread pool: {}", e)))?;

        let (tx, rx) = channel::unbounded();

        pool.scope(|scope| {
            for path in &files {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = self.run_task(path);
                    if let Some(progress) = &self.progress {
                        progress.inc(1);
                    }
                    // The receiver outlives the scope
                    let _ = tx.send(outcome);
                });
            }
        });
        drop(tx);

        // Channel order is completion order
        for outcome in rx {
            report.record(outcome);
        }

        if let Some(progress) = &self.progress {
            progress.finish_with_message("done");
        }

        info!(
            "Finished: {} succeeded, {} failed",
            report.success.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// One task of the pool; never unwinds into the pool
    fn run_task(&self, path: &Path) -> ProcessingOutcome {
        if self.cancel.is_cancelled() {
            logging::log_file_warning(path, "Run cancelled, file left in place");
            return ProcessingOutcome::failed(
                path,
                format!("Cancelled before processing {}", path.display()),
            );
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.process_file(path))) {
            Ok(outcome) => outcome,
            Err(panic_err) => {
                let message = extract_panic_info(panic_err);
                error!("Task for {} panicked: {}", path.display(), message);
                ProcessingOutcome::failed(
                    path,
                    format!("Error processing {}: {}", path.display(), message),
                )
            }
        }
    }

    /// Process a single file, converting any error into a failed outcome
    pub fn process_file(&self, path: &Path) -> ProcessingOutcome {
        if !path.is_file() {
            return ProcessingOutcome::failed(
                path,
                format!("Skipped {}: Not a file", path.display()),
            );
        }

        match self.try_process_file(path) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                ProcessingOutcome::failed(
                    path,
                    format!("Error processing {}: {}", path.display(), e),
                )
            }
        }
    }

    fn try_process_file(&self, path: &Path) -> Result<ProcessingOutcome> {
        let policy = &self.config.duplicates;

        if policy.enabled {
            let key = identity_key(path, policy.detection_method)?;
            if let Some(original) = self.index.claim(key, path) {
                let quarantine = self
                    .quarantine_dir
                    .as_deref()
                    .unwrap_or(&self.config.base_directory);
                let action = handle_duplicate(
                    path,
                    &original,
                    policy.disposition,
                    quarantine,
                    &self.safety_manager,
                )?;
                debug!("Duplicate {} handled: {:?}", path.display(), action);
                return Ok(ProcessingOutcome::succeeded(
                    path,
                    format!("Handled duplicate {}", path.display()),
                ));
            }
        }

        let record = FileRecord::from_path(path)?;
        let category = classify::classify(
            &record.extension,
            &self.config.categories,
            &self.config.fallback_category,
        );
        let dst = destination::destination_path(
            &self.config.base_directory,
            category,
            &self.config.date_bucketing,
            &record,
        );
        debug!("{} classified as {}", path.display(), category);

        self.safety_manager.move_file(path, &dst)?;

        Ok(ProcessingOutcome::succeeded(
            path,
            format!("Moved {} to {}", path.display(), dst.display()),
        ))
    }
}

/// Create the quarantine directory and one directory per category
fn setup_directories(config: &OrganizerConfig, quarantine_dir: Option<&Path>) -> Result<()> {
    let category_dirs = config
        .categories
        .iter()
        .map(|category| config.base_directory.join(&category.name));

    for dir in quarantine_dir.map(Path::to_path_buf).into_iter().chain(category_dirs) {
        ensure_dir_exists(&dir).map_err(|source| {
            error!("Failed to set up directory {}: {}", dir.display(), source);
            Error::OrganizerSetup {
                path: dir.clone(),
                source,
            }
        })?;
    }

    Ok(())
}

/// Extract panic info from panic value
fn extract_panic_info(panic_err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_err.downcast_ref::<&str>() {
        format!("Panic with message: {}", s)
    } else if let Some(s) = panic_err.downcast_ref::<String>() {
        format!("Panic with message: {}", s)
    } else {
        "Unknown panic occurred".to_string()
    }
}

/// Organize `base_dir` (or the default downloads directory) with the default
/// configuration and `workers` concurrent tasks
pub fn organize_files(base_dir: Option<&Path>, workers: usize) -> Result<OrganizeReport> {
    let mut config = OrganizerConfig::default().with_workers(workers);
    if let Some(dir) = base_dir {
        config = config.with_base_directory(dir);
    }
    organize_with_config(config)
}

/// Run one organizer pass with an explicit configuration
pub fn organize_with_config(config: OrganizerConfig) -> Result<OrganizeReport> {
    FileOrganizer::new(config)?.organize()
}

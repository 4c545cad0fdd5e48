use log::{error, info, warn, LevelFilter};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

// For file-based logging with rotation
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Environment variable overriding the configured level
pub const LOG_ENV_VAR: &str = "ORGANIZER_LOG";

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} - {l} - {m}{n}";

/// Initialize console and rotating file logging.
///
/// Falls back to `~/file_organizer.log` when `log_file` cannot be written.
/// Returns the log file actually in use.
pub fn init_logger(
    log_file: &Path,
    level: LevelFilter,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_file_path = writable_log_path(log_file);

    let archived_logs_pattern = format!("{}.{{}}", log_file_path.display());

    // Set up the rotating file appender - rotate at 10MB
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);

    // Keep 5 archived log files
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern, 5)
        .map_err(|e| format!("Failed to create log roller: {}", e))?;

    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&log_file_path, Box::new(compound_policy))
        .map_err(|e| format!("Failed to create log appender: {}", e))?;

    // Keep stdout free for the report
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let level = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(level);

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(
            Root::builder()
                .appender("file")
                .appender("console")
                .build(level),
        )
        .map_err(|e| format!("Failed to build log config: {}", e))?;

    log4rs::init_config(config).map_err(|e| format!("Failed to initialize log4rs: {}", e))?;

    info!("Logging to file: {}", log_file_path.display());
    Ok(log_file_path)
}

/// `log_file` if it can be appended to, otherwise a file in the home directory
fn writable_log_path(log_file: &Path) -> PathBuf {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!(
                "WARNING: Could not create log directory: {}. Falling back to default location.",
                e
            );
            return fallback_log_path();
        }
    }

    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(_) => log_file.to_path_buf(),
        Err(e) => {
            eprintln!(
                "WARNING: Could not write to log file: {}. Falling back to default location.",
                e
            );
            fallback_log_path()
        }
    }
}

fn fallback_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("file_organizer.log")
}

/// Log file operation that failed
pub fn log_file_error(path: &Path, operation: &str, error: &dyn std::error::Error) {
    error!(
        "File operation failed - Operation: {}, Path: {}, Error: {}",
        operation,
        path.display(),
        error
    );
}

/// Log a fallback taken while processing a file
pub fn log_file_warning(path: &Path, message: &str) {
    warn!("{} - Path: {}", message, path.display());
}

/// Log file system modification
pub fn log_fs_modification(operation: &str, path: &Path, details: Option<&str>) {
    let details_str = details.unwrap_or("");
    info!(
        "FS CHANGE - Operation: {}, Path: {}{}",
        operation,
        path.display(),
        if details_str.is_empty() {
            "".to_string()
        } else {
            format!(", Details: {}", details_str)
        }
    );
}

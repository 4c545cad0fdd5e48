use clap::{Parser, Subcommand};
use file_organizer_core::{logging, CancellationToken, FileOrganizer, LogLevel, OrganizerConfig};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "file-organizer")]
#[command(about = "Organize files in a directory based on file types and dates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort the files of a directory into category folders
    Organize {
        /// Directory to organize (default: ~/Downloads)
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Number of worker threads
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "file-organizer.json")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), anyhow::Error> {
    match cli.command {
        Commands::Organize {
            directory,
            workers,
            verbose,
            config,
            progress,
        } => {
            // Set up configuration
            let mut config = if let Some(config_path) = config {
                OrganizerConfig::from_file(&config_path)?
            } else {
                OrganizerConfig::default()
            };

            // Override config with command line arguments
            if let Some(directory) = directory {
                config.base_directory = directory;
            }
            config.worker_count = workers;
            if verbose {
                config.log_level = LogLevel::Debug;
            }

            init_logging(&config);

            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            if let Err(e) = ctrlc::set_handler(move || {
                eprintln!("Interrupt received, finishing files already in progress...");
                handler_token.cancel();
            }) {
                warn!("Could not install Ctrl-C handler: {}", e);
            }

            let mut organizer = FileOrganizer::new(config)?.with_cancellation(cancel);
            if progress {
                organizer = organizer.with_progress(progress_bar());
            }

            info!("Organizing {}", organizer.base_dir().display());
            let results = organizer.organize()?;

            if !results.success.is_empty() {
                println!("\nSuccessfully processed files:");
                for msg in &results.success {
                    println!("✓ {}", msg);
                }
            }

            if !results.failed.is_empty() {
                println!("\nFailed to process files:");
                for msg in &results.failed {
                    println!("✗ {}", msg);
                }
            }

            // Individual file failures do not affect the exit code
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = OrganizerConfig::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

/// File and console logging, or plain console logging if that fails
fn init_logging(config: &OrganizerConfig) {
    let level = config.log_level.into();

    if let Err(e) = logging::init_logger(&config.log_file, level) {
        eprintln!("WARNING: {}. Logging to the console only.", e);
        env_logger::Builder::new()
            .filter_level(level)
            .parse_env(logging::LOG_ENV_VAR)
            .init();
    }
}

fn progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    progress_bar
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use note_reel::{
    batch::{BatchInputs, BatchRunner},
    config::Config,
};

/// Exit code for a batch that finished but had failing folders
const PARTIAL_FAILURE_EXIT_CODE: u8 = 2;

#[derive(Parser)]
#[command(
    name = "note-reel",
    version,
    about = "Batch-assemble short videos from folders of notes",
    long_about = "For every subfolder of the parent directory, note-reel joins the folder's videos and images between an intro and an outro, centers the result over a background image and writes <folder>.mp4."
)]
struct Cli {
    /// Intro video (mp4, avi, mov)
    #[arg(short, long)]
    intro: Option<PathBuf>,

    /// Outro video (mp4, avi, mov)
    #[arg(short = 'O', long)]
    outro: Option<PathBuf>,

    /// Background image (png, jpg, jpeg)
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// Parent folder whose subfolders are the note folders
    #[arg(short, long)]
    parent: Option<PathBuf>,

    /// Seconds each image is shown
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..))]
    image_duration: Option<u32>,

    /// Directory for the output videos (defaults to the current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting note-reel v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    if let Some(duration) = cli.image_duration {
        config.assembly.image_duration = duration;
    }
    if let Some(dir) = cli.output_dir {
        config.output.directory = dir;
    }
    config.validate()?;

    let inputs = BatchInputs {
        intro: cli.intro,
        outro: cli.outro,
        background: cli.background,
        parent: cli.parent,
    };

    info!("Image duration: {}s", config.assembly.image_duration);
    info!("Output directory: {:?}", config.output.directory);

    let runner = BatchRunner::from_config(&config)?;
    let report = match runner.run(&inputs).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    for failure in &report.failed {
        warn!("   {:?}: {}", failure.folder, failure.error);
    }
    info!(
        "Done: {} written, {} skipped, {} failed",
        report.written.len(),
        report.skipped.len(),
        report.failed.len()
    );

    if report.has_failures() {
        return Ok(ExitCode::from(PARTIAL_FAILURE_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

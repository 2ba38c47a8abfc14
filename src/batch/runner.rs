use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::batch::folder::{AssemblyJob, AssemblySettings, FolderOutcome, FolderProcessor, SharedInputs};
use crate::config::Config;
use crate::error::{InputError, ReelError, Result, WriteError};
use crate::video::{Clip, ClipLoader, ClipWriter, EncodedVideo, FfmpegWriter};

/// Batch inputs as handed over by the caller; any of them may be missing
#[derive(Debug, Clone, Default)]
pub struct BatchInputs {
    pub intro: Option<PathBuf>,
    pub outro: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub parent: Option<PathBuf>,
}

/// Batch inputs that are present and exist on disk
#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    pub intro: PathBuf,
    pub outro: PathBuf,
    pub background: PathBuf,
    pub parent: PathBuf,
}

impl BatchInputs {
    /// Check that every input was given and exists.
    ///
    /// Inputs are checked in the order intro, outro, background, parent and
    /// the first problem is reported.
    pub fn validate(&self) -> Result<ResolvedInputs> {
        let intro = require(&self.intro, "intro video", false)?;
        let outro = require(&self.outro, "outro video", false)?;
        let background = require(&self.background, "background image", false)?;
        let parent = require(&self.parent, "parent folder", true)?;

        Ok(ResolvedInputs { intro, outro, background, parent })
    }
}

fn require(path: &Option<PathBuf>, what: &str, directory: bool) -> Result<PathBuf> {
    let path = match path {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => return Err(InputError::MissingInput { what: what.to_string() }.into()),
    };

    let exists = if directory { path.is_dir() } else { path.is_file() };
    if !exists {
        return Err(InputError::NotFound {
            what: what.to_string(),
            path: path.display().to_string(),
        }
        .into());
    }

    Ok(path.clone())
}

/// A folder whose job failed
#[derive(Debug)]
pub struct FolderFailure {
    pub folder: PathBuf,
    pub error: ReelError,
}

/// What happened to each folder in a run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<EncodedVideo>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FolderFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn folders_seen(&self) -> usize {
        self.written.len() + self.skipped.len() + self.failed.len()
    }
}

/// Immediate subdirectories of `parent`, sorted by name
pub fn note_folders<P: AsRef<Path>>(parent: P) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(parent.as_ref())? {
        let path = entry?.path();
        if path.is_dir() {
            folders.push(path);
        }
    }
    folders.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(folders)
}

/// Runs every note folder under a parent directory, one at a time.
///
/// A failing folder is logged and recorded; the remaining folders still run.
pub struct BatchRunner {
    processor: FolderProcessor,
}

impl BatchRunner {
    pub fn new(processor: FolderProcessor) -> Self {
        Self { processor }
    }

    /// Runner that encodes with ffmpeg, configured from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let writer: Arc<dyn ClipWriter> = Arc::new(FfmpegWriter::new(&config.tools));
        Self::with_writer(config, writer)
    }

    /// Runner with a custom writer. Fails if `config` does not validate.
    pub fn with_writer(config: &Config, writer: Arc<dyn ClipWriter>) -> Result<Self> {
        config.validate()?;
        let processor = FolderProcessor::new(
            ClipLoader::new(&config.tools),
            writer,
            AssemblySettings::from_config(config),
        );
        Ok(Self::new(processor))
    }

    pub fn settings(&self) -> &AssemblySettings {
        self.processor.settings()
    }

    /// Load the background image sized exactly to the canvas.
    ///
    /// A background that is not exactly canvas-sized is stretched to fit.
    pub fn load_background(&self, path: &Path) -> Result<Clip> {
        // Display length is stamped per job when compositing.
        let background = self.processor.loader().load_image(path, 1.0)?;
        let (canvas_w, canvas_h) = self.settings().canvas;
        if background.size() == (canvas_w, canvas_h) {
            return Ok(background);
        }

        info!(
            "Resizing background from {}x{} to {}x{}",
            background.width(),
            background.height(),
            canvas_w,
            canvas_h
        );
        background.resize_exact(canvas_w, canvas_h)
    }

    /// Load intro, outro and background once for the whole batch
    pub fn load_shared_inputs(&self, inputs: &ResolvedInputs) -> Result<SharedInputs> {
        let loader = self.processor.loader();
        let intro = loader.load_video(&inputs.intro)?;
        let outro = loader.load_video(&inputs.outro)?;
        let background = self.load_background(&inputs.background)?;

        info!(
            "Intro {:.2}s ({}x{}), outro {:.2}s ({}x{})",
            intro.duration(),
            intro.width(),
            intro.height(),
            outro.duration(),
            outro.width(),
            outro.height()
        );

        Ok(SharedInputs { intro, outro, background })
    }

    /// Validate inputs, load the shared clips and process every folder
    pub async fn run(&self, inputs: &BatchInputs) -> Result<BatchReport> {
        let resolved = inputs.validate()?;
        let shared = self.load_shared_inputs(&resolved)?;
        self.run_folders(&resolved.parent, &shared).await
    }

    /// Process every subfolder of `parent` against already-loaded inputs
    pub async fn run_folders(&self, parent: &Path, shared: &SharedInputs) -> Result<BatchReport> {
        let folders = note_folders(parent)?;
        info!("🎬 Found {} note folders in {:?}", folders.len(), parent);

        let output_dir = &self.settings().output_dir;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| WriteError::OutputFailed {
                path: output_dir.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut report = BatchReport::default();
        for folder in folders {
            let job = AssemblyJob { folder: &folder, shared };
            match self.processor.process(&job).await {
                Ok(FolderOutcome::Written(video)) => report.written.push(video),
                Ok(FolderOutcome::Skipped) => report.skipped.push(folder),
                Err(e) if e.is_job_scoped() => {
                    error!("Failed to process folder {}: {}", display_name(&folder), e);
                    report.failed.push(FolderFailure { folder, error: e });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Batch complete: {} written, {} skipped, {} failed",
            report.written.len(),
            report.skipped.len(),
            report.failed.len()
        );
        if report.has_failures() {
            warn!("Some folders failed; see the errors above");
        }

        Ok(report)
    }
}

fn display_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string())
}

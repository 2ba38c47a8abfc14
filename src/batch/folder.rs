use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::batch::collector::{self, MediaKind};
use crate::config::Config;
use crate::error::{ReelError, Result, WriteError};
use crate::params;
use crate::video::{assemble, composite, Clip, ClipLoader, ClipWriter, EncodedVideo};

/// Clips loaded once per batch and reused, read-only, by every job
#[derive(Debug, Clone)]
pub struct SharedInputs {
    pub intro: Clip,
    pub outro: Clip,
    /// Already sized to the canvas
    pub background: Clip,
}

/// Settings fixed for a whole batch
#[derive(Debug, Clone)]
pub struct AssemblySettings {
    /// Height every content clip is scaled to
    pub target_height: u32,

    /// Seconds each still image is shown
    pub image_duration: u32,

    /// Background canvas size (width, height)
    pub canvas: (u32, u32),

    /// Directory receiving `<folder>.mp4`
    pub output_dir: PathBuf,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            target_height: params::target_content_height(),
            image_duration: params::DEFAULT_IMAGE_DURATION,
            canvas: (params::CANVAS_WIDTH, params::CANVAS_HEIGHT),
            output_dir: PathBuf::from("."),
        }
    }
}

impl AssemblySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_duration: config.assembly.image_duration,
            output_dir: config.output.directory.clone(),
            ..Self::default()
        }
    }

    /// `<output_dir>/<folder basename>.mp4`
    pub fn output_path(&self, folder: &Path) -> Result<PathBuf> {
        let name = folder.file_name().ok_or_else(|| {
            ReelError::generic(format!("folder {:?} has no usable name", folder))
        })?;

        let mut file_name = name.to_os_string();
        file_name.push(".");
        file_name.push(params::OUTPUT_EXTENSION);
        Ok(self.output_dir.join(file_name))
    }
}

/// Everything needed to produce one output file
#[derive(Debug, Clone, Copy)]
pub struct AssemblyJob<'a> {
    pub folder: &'a Path,
    pub shared: &'a SharedInputs,
}

/// How a job ended when it did not fail
#[derive(Debug, Clone)]
pub enum FolderOutcome {
    Written(EncodedVideo),
    /// The folder held no usable media; nothing was written
    Skipped,
}

/// Runs a single note folder through the assembly pipeline
#[derive(Clone)]
pub struct FolderProcessor {
    loader: ClipLoader,
    writer: Arc<dyn ClipWriter>,
    settings: AssemblySettings,
}

impl FolderProcessor {
    pub fn new(loader: ClipLoader, writer: Arc<dyn ClipWriter>, settings: AssemblySettings) -> Self {
        Self { loader, writer, settings }
    }

    pub fn settings(&self) -> &AssemblySettings {
        &self.settings
    }

    pub fn loader(&self) -> &ClipLoader {
        &self.loader
    }

    /// Build the finished clip for a folder without writing it.
    ///
    /// Returns `None` when the folder contains no usable media. Any item
    /// that fails to load fails the whole folder.
    pub fn build(&self, job: &AssemblyJob<'_>) -> Result<Option<Clip>> {
        let items = collector::collect(job.folder)?;
        debug!("{} media items in {:?}", items.len(), job.folder);

        let image_duration = self.settings.image_duration as f64;
        let target_height = self.settings.target_height;

        let mut content_clips = Vec::with_capacity(items.len());
        for item in &items {
            let clip = match item.kind {
                MediaKind::Video => self.loader.load(item, image_duration, target_height)?.resize(target_height)?,
                MediaKind::Image => self.loader.load(item, image_duration, target_height)?,
            };
            debug!("   {:?} -> {}x{} for {:.2}s", item.path, clip.width(), clip.height(), clip.duration());
            content_clips.push(clip);
        }

        if content_clips.is_empty() {
            return Ok(None);
        }

        let final_content_clip = assemble(&content_clips)?;
        let final_clip = assemble(&[
            job.shared.intro.clone(),
            final_content_clip,
            job.shared.outro.clone(),
        ])?;
        let final_output = composite(&job.shared.background, &final_clip)?;

        Ok(Some(final_output))
    }

    /// Build and write one folder's video on the calling thread
    pub fn run_job(&self, job: &AssemblyJob<'_>) -> Result<FolderOutcome> {
        info!("📁 Processing {:?}", job.folder);

        let final_output = match self.build(job)? {
            Some(clip) => clip,
            None => {
                info!("   No videos or images in {:?}, skipping", job.folder);
                return Ok(FolderOutcome::Skipped);
            }
        };

        let output_path = self.settings.output_path(job.folder)?;
        let encoded = self.writer.write(&final_output, &output_path)?;

        info!("Video saved at {}", encoded.path.display());
        Ok(FolderOutcome::Written(encoded))
    }

    /// Build and write one folder's video.
    ///
    /// Probing, decoding and encoding all block, so the whole job runs on
    /// tokio's blocking pool.
    pub async fn process(&self, job: &AssemblyJob<'_>) -> Result<FolderOutcome> {
        let processor = self.clone();
        let folder = job.folder.to_path_buf();
        let shared = job.shared.clone();

        tokio::task::spawn_blocking(move || {
            processor.run_job(&AssemblyJob { folder: &folder, shared: &shared })
        })
        .await
        .map_err(|e| WriteError::EncodingFailed {
            path: job.folder.display().to_string(),
            reason: format!("folder task failed: {}", e),
        })?
    }
}

//! # note-reel
//!
//! Batch-assemble short videos from folders of notes.
//!
//! For every subfolder of a parent directory, the folder's videos and still
//! images are scaled to a common height, joined end to end, wrapped with an
//! intro and an outro clip, centered over a 1920x1080 background and written
//! as `<folder>.mp4`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use note_reel::{batch::{BatchInputs, BatchRunner}, config::Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let runner = BatchRunner::from_config(&config)?;
//!
//! let report = runner.run(&BatchInputs {
//!     intro: Some("intro.mp4".into()),
//!     outro: Some("outro.mp4".into()),
//!     background: Some("background.png".into()),
//!     parent: Some("notes/".into()),
//! }).await?;
//!
//! println!("{} videos written", report.written.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - immutable clips, frame rendering, assembly and encoding
//! - [`batch`] - folder collection, per-folder pipeline and the batch runner
//! - [`config`] - configuration management
//! - [`params`] - fixed canvas and output parameters
//!
//! Media decoding and encoding shell out to `ffmpeg` and `ffprobe`.

pub mod batch;
pub mod config;
pub mod error;
pub mod params;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    batch::{BatchInputs, BatchReport, BatchRunner},
    config::Config,
    error::{ReelError, Result},
    video::Clip,
};

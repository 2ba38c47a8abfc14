//! # Batch Processing
//!
//! Turns a parent directory of note folders into one video per folder.
//!
//! The pipeline for a single folder:
//! 1. Collect - list the folder's videos and images in name order
//! 2. Normalize - load every item and scale it to the content height
//! 3. Assemble - join the content, then wrap it with intro and outro
//! 4. Composite - center the result over the background, drop audio
//! 5. Write - encode `<folder>.mp4` into the output directory

pub mod collector;
pub mod folder;
pub mod runner;

pub use collector::{collect, MediaItem, MediaKind};
pub use folder::{AssemblyJob, AssemblySettings, FolderOutcome, FolderProcessor, SharedInputs};
pub use runner::{note_folders, BatchInputs, BatchReport, BatchRunner, FolderFailure, ResolvedInputs};

//! # Video Module
//!
//! Clip handles, frame rendering, composition and output encoding.

pub mod clip;
pub mod compose;
pub mod encoder;
pub mod loader;
pub mod render;
pub mod types;

pub use clip::{Clip, VideoSource};
pub use compose::{assemble, composite};
pub use encoder::{ClipWriter, EncodedVideo, FfmpegWriter};
pub use loader::{ClipLoader, VideoMetadata};
pub use render::FrameSource;
pub use types::Frame;

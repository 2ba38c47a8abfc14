//! Fixed output parameters shared by every job in a batch.

/// Width of the background canvas and of every output video
pub const CANVAS_WIDTH: u32 = 1920;

/// Height of the background canvas and of every output video
pub const CANVAS_HEIGHT: u32 = 1080;

/// Share of the canvas height given to folder content
pub const CONTENT_HEIGHT_RATIO: f64 = 0.6;

/// Output frame rate
pub const OUTPUT_FPS: f64 = 24.0;

/// Output video codec passed to ffmpeg
pub const OUTPUT_CODEC: &str = "libx264";

/// Output pixel format (broad player compatibility for H.264)
pub const OUTPUT_PIXEL_FORMAT: &str = "yuv420p";

/// Output container extension
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Default seconds each still image stays on screen
pub const DEFAULT_IMAGE_DURATION: u32 = 4;

/// Height every content clip is normalized to (648 for a 1080 canvas).
pub fn target_content_height() -> u32 {
    (CANVAS_HEIGHT as f64 * CONTENT_HEIGHT_RATIO).round() as u32
}

//! Immutable clip handles.
//!
//! A [`Clip`] describes what to show, never the pixels themselves (except
//! for stills). Every transform returns a new handle that shares the
//! underlying content through an `Arc`, so the batch-wide intro, outro and
//! background can be handed to every job without copying or locking.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::imageops::FilterType;

use crate::error::{CompositionError, DecodeError, Result};
use crate::video::render::{
    CompositeFrames, FrameSource, ScaledFrames, SequenceFrames, StillFrames, VideoFrames,
};
use crate::video::types::Frame;

/// A video file on disk plus the decoder that reads it
#[derive(Debug, Clone)]
pub struct VideoSource {
    pub path: PathBuf,

    /// Frame size stored in the container
    pub native_size: (u32, u32),

    /// ffmpeg executable used to decode frames
    pub ffmpeg: PathBuf,
}

pub(crate) enum Content {
    /// Decoded on demand; the decoder scales to the clip's size
    Video(VideoSource),
    /// A raster already at the clip's size
    Still(Frame),
    /// Another clip resampled per frame to this clip's size
    Scaled(Clip),
    /// Clips played back to back, each centered on this clip's canvas
    Sequence(Vec<Clip>),
    /// Foreground centered over background
    Composite { background: Clip, foreground: Clip },
}

/// A timed visual segment with fixed pixel dimensions
#[derive(Clone)]
pub struct Clip {
    content: Arc<Content>,
    width: u32,
    height: u32,
    duration: f64,
    has_audio: bool,
}

impl Clip {
    /// A still image shown for `duration` seconds
    pub fn still(frame: Frame, duration: f64) -> Self {
        let (width, height) = frame.dimensions();
        Self {
            content: Arc::new(Content::Still(frame)),
            width,
            height,
            duration,
            has_audio: false,
        }
    }

    /// A video file shown at its native size for `duration` seconds
    pub fn video(source: VideoSource, duration: f64, has_audio: bool) -> Self {
        let (width, height) = source.native_size;
        Self {
            content: Arc::new(Content::Video(source)),
            width,
            height,
            duration,
            has_audio,
        }
    }

    pub(crate) fn from_content(
        content: Content,
        size: (u32, u32),
        duration: f64,
        has_audio: bool,
    ) -> Self {
        Self {
            content: Arc::new(content),
            width: size.0,
            height: size.1,
            duration,
            has_audio,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    /// Short human-readable description used in logs and errors
    pub fn describe(&self) -> String {
        match &*self.content {
            Content::Video(source) => source.path.display().to_string(),
            Content::Still(_) => "still image".to_string(),
            Content::Scaled(inner) => format!("scaled {}", inner.describe()),
            Content::Sequence(clips) => format!("sequence of {} clips", clips.len()),
            Content::Composite { .. } => "composite".to_string(),
        }
    }

    /// Scale to `target_height`, keeping the aspect ratio.
    ///
    /// The new width is `round(width * target_height / height)`, never less
    /// than one pixel. Duration and audio are unchanged.
    pub fn resize(&self, target_height: u32) -> Result<Clip> {
        if self.height == 0 || self.width == 0 {
            return Err(DecodeError::DegenerateDimensions {
                source_name: self.describe(),
                width: self.width,
                height: self.height,
            }
            .into());
        }
        if target_height == self.height {
            return Ok(self.clone());
        }

        let width = scaled_width(self.width, self.height, target_height);
        self.resize_exact(width, target_height)
    }

    /// Scale to exactly `width` x `height`, ignoring the aspect ratio
    pub fn resize_exact(&self, width: u32, height: u32) -> Result<Clip> {
        if width == 0 || height == 0 {
            return Err(DecodeError::DegenerateDimensions {
                source_name: self.describe(),
                width,
                height,
            }
            .into());
        }
        if (width, height) == self.size() {
            return Ok(self.clone());
        }

        let content = match &*self.content {
            Content::Video(source) => Content::Video(source.clone()),
            Content::Still(frame) => Content::Still(frame.resized(width, height, FilterType::Lanczos3)),
            Content::Scaled(inner) => Content::Scaled(inner.clone()),
            _ => Content::Scaled(self.clone()),
        };

        Ok(Clip::from_content(content, (width, height), self.duration, self.has_audio))
    }

    /// Same content stamped with a new display length.
    ///
    /// Video shorter than the new duration holds its last frame.
    pub fn with_duration(&self, duration: f64) -> Result<Clip> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(CompositionError::InvalidParameters {
                details: format!("clip duration must be positive, got {}", duration),
            }
            .into());
        }
        Ok(Clip {
            duration,
            ..self.clone()
        })
    }

    /// Same content without an audio track
    pub fn without_audio(&self) -> Clip {
        Clip {
            has_audio: false,
            ..self.clone()
        }
    }

    /// Open a cursor that renders this clip at `fps`.
    ///
    /// Each call gets its own decoders, so the same clip can be rendered by
    /// several jobs one after another.
    pub fn frames(&self, fps: f64) -> Result<Box<dyn FrameSource>> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(CompositionError::InvalidParameters {
                details: format!("frame rate must be positive, got {}", fps),
            }
            .into());
        }

        let source: Box<dyn FrameSource> = match &*self.content {
            Content::Video(video) => Box::new(VideoFrames::open(video, self.size(), fps)?),
            Content::Still(frame) => Box::new(StillFrames::new(frame.clone())),
            Content::Scaled(inner) => Box::new(ScaledFrames::new(inner.frames(fps)?, self.size())),
            Content::Sequence(clips) => Box::new(SequenceFrames::new(clips.clone(), self.size(), fps)),
            Content::Composite { background, foreground } => Box::new(CompositeFrames::new(
                background.frames(fps)?,
                foreground.frames(fps)?,
            )),
        };
        Ok(source)
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("content", &self.describe())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("duration", &self.duration)
            .field("has_audio", &self.has_audio)
            .finish()
    }
}

/// Width that keeps `width:height` when the height becomes `target_height`
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    let scaled = (width as f64 * target_height as f64 / height as f64).round();
    (scaled as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelError;

    fn still(width: u32, height: u32, duration: f64) -> Clip {
        Clip::still(Frame::new_filled(width, height, [0, 255, 0]), duration)
    }

    fn video(width: u32, height: u32) -> Clip {
        Clip::video(
            VideoSource {
                path: PathBuf::from("clip.mp4"),
                native_size: (width, height),
                ffmpeg: PathBuf::from("ffmpeg"),
            },
            3.0,
            true,
        )
    }

    #[test]
    fn test_resize_pins_height_and_keeps_aspect() {
        let clip = video(1280, 720).resize(648).unwrap();
        assert_eq!(clip.size(), (1152, 648));
        assert_eq!(clip.duration(), 3.0);
        assert!(clip.has_audio());
    }

    #[test]
    fn test_resize_rounds_width() {
        // 1000 * 648 / 750 = 864.0, 1001 * 648 / 750 = 864.864
        assert_eq!(video(1001, 750).resize(648).unwrap().width(), 865);
        assert_eq!(scaled_width(1000, 750, 648), 864);
        assert_eq!(scaled_width(333, 1000, 1), 1);
    }

    #[test]
    fn test_resize_property_over_many_sizes() {
        for &(w, h) in &[(1920, 1080), (1080, 1920), (640, 480), (17, 3), (1, 999)] {
            for &target in &[1, 2, 100, 648, 1080] {
                let clip = video(w, h).resize(target).unwrap();
                assert_eq!(clip.height(), target);
                let expected = ((w as f64 * target as f64 / h as f64).round() as u32).max(1);
                assert_eq!(clip.width(), expected);
            }
        }
    }

    #[test]
    fn test_resize_to_same_height_is_identity() {
        let clip = still(300, 648, 4.0);
        let resized = clip.resize(648).unwrap();
        assert_eq!(resized.size(), (300, 648));
        assert!(Arc::ptr_eq(&clip.content, &resized.content));
    }

    #[test]
    fn test_zero_height_is_a_decode_error() {
        let clip = video(640, 0);
        assert!(matches!(
            clip.resize(648),
            Err(ReelError::Decode(DecodeError::DegenerateDimensions { .. }))
        ));
        assert!(video(640, 480).resize(0).is_err());
    }

    #[test]
    fn test_still_resize_resamples_raster() {
        let clip = still(400, 200, 4.0).resize(100).unwrap();
        let frame = clip.frames(24.0).unwrap().frame_at(0.0).unwrap();
        assert_eq!(frame.dimensions(), (200, 100));
        assert_eq!(clip.duration(), 4.0);
    }

    #[test]
    fn test_source_clip_is_untouched_by_transforms() {
        let clip = video(1920, 1080);
        let _ = clip.resize(648).unwrap();
        let _ = clip.with_duration(12.0).unwrap();
        let _ = clip.without_audio();
        assert_eq!(clip.size(), (1920, 1080));
        assert_eq!(clip.duration(), 3.0);
        assert!(clip.has_audio());
    }

    #[test]
    fn test_with_duration_rejects_non_positive() {
        assert!(still(2, 2, 1.0).with_duration(0.0).is_err());
        assert!(still(2, 2, 1.0).with_duration(-1.0).is_err());
        assert_eq!(still(2, 2, 1.0).with_duration(9.5).unwrap().duration(), 9.5);
    }

    #[test]
    fn test_frames_rejects_bad_fps() {
        assert!(still(2, 2, 1.0).frames(0.0).is_err());
    }
}

//! Frame rendering for clips.
//!
//! Rendering is pull-based: a [`FrameSource`] is asked for the frame visible
//! at a timestamp, and timestamps only ever move forward. That lets video
//! sources stream from a single ffmpeg decode instead of seeking per frame.

use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use image::imageops::FilterType;
use tracing::debug;

use crate::error::{DecodeError, Result};
use crate::video::clip::{Clip, VideoSource};
use crate::video::types::Frame;

/// Forward-only frame cursor over a clip
pub trait FrameSource: Send {
    /// Frame visible `t` seconds into the clip.
    ///
    /// Successive calls must pass non-decreasing `t`.
    fn frame_at(&mut self, t: f64) -> Result<Frame>;
}

/// Same raster at every timestamp
pub struct StillFrames {
    frame: Frame,
}

impl StillFrames {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }
}

impl FrameSource for StillFrames {
    fn frame_at(&mut self, _t: f64) -> Result<Frame> {
        Ok(self.frame.clone())
    }
}

/// Streams RGBA frames out of an ffmpeg child process.
///
/// ffmpeg resamples to the requested frame rate and size. Asking for a time
/// past the end of the stream returns the last decoded frame.
pub struct VideoFrames {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    size: (u32, u32),
    fps: f64,
    decoded: u64,
    current: Option<Frame>,
    finished: bool,
}

impl VideoFrames {
    pub fn open(source: &VideoSource, size: (u32, u32), fps: f64) -> Result<Self> {
        let filter = format!("fps={},scale={}:{}", fps, size.0, size.1);
        debug!("Decoding {:?} with filter {}", source.path, filter);

        let mut child = Command::new(&source.ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(&source.path)
            .args(["-an", "-sn", "-vf", &filter, "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DecodeError::ToolUnavailable {
                tool: source.ffmpeg.display().to_string(),
                reason: e.to_string(),
            })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DecodeError::Unreadable {
                    path: source.path.display().to_string(),
                    reason: "decoder output not captured".to_string(),
                }
                .into());
            }
        };

        Ok(Self {
            path: source.path.clone(),
            child,
            stdout,
            size,
            fps,
            decoded: 0,
            current: None,
            finished: false,
        })
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let (width, height) = self.size;
        let mut buffer = vec![0u8; width as usize * height as usize * 4];

        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => Ok(Frame::from_rgba_bytes(width, height, buffer)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(DecodeError::Unreadable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

impl FrameSource for VideoFrames {
    fn frame_at(&mut self, t: f64) -> Result<Frame> {
        // Tolerance keeps k/fps from landing on frame k-1.
        let wanted = (t.max(0.0) * self.fps + 1e-6).floor() as u64;

        while !self.finished && (self.current.is_none() || self.decoded <= wanted) {
            match self.read_frame()? {
                Some(frame) => {
                    self.current = Some(frame);
                    self.decoded += 1;
                }
                None => {
                    debug!("{:?} ended after {} frames", self.path, self.decoded);
                    self.finished = true;
                }
            }
        }

        self.current.clone().ok_or_else(|| {
            DecodeError::Unreadable {
                path: self.path.display().to_string(),
                reason: "no frames could be decoded".to_string(),
            }
            .into()
        })
    }
}

impl Drop for VideoFrames {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Resamples every frame of an inner source to a fixed size
pub struct ScaledFrames {
    inner: Box<dyn FrameSource>,
    size: (u32, u32),
}

impl ScaledFrames {
    pub fn new(inner: Box<dyn FrameSource>, size: (u32, u32)) -> Self {
        Self { inner, size }
    }
}

impl FrameSource for ScaledFrames {
    fn frame_at(&mut self, t: f64) -> Result<Frame> {
        let frame = self.inner.frame_at(t)?;
        Ok(frame.resized(self.size.0, self.size.1, FilterType::Triangle))
    }
}

/// Plays clips back to back on a shared canvas.
///
/// Only the segment currently on screen has an open source; moving past a
/// segment boundary drops the previous one.
pub struct SequenceFrames {
    clips: Vec<Clip>,
    starts: Vec<f64>,
    canvas: (u32, u32),
    fps: f64,
    index: usize,
    active: Option<Box<dyn FrameSource>>,
}

impl SequenceFrames {
    pub fn new(clips: Vec<Clip>, canvas: (u32, u32), fps: f64) -> Self {
        let mut starts = Vec::with_capacity(clips.len());
        let mut elapsed = 0.0;
        for clip in &clips {
            starts.push(elapsed);
            elapsed += clip.duration();
        }

        Self {
            clips,
            starts,
            canvas,
            fps,
            index: 0,
            active: None,
        }
    }
}

impl FrameSource for SequenceFrames {
    fn frame_at(&mut self, t: f64) -> Result<Frame> {
        if self.clips.is_empty() {
            return Ok(Frame::new_transparent(self.canvas.0, self.canvas.1));
        }

        while self.index + 1 < self.clips.len() && t >= self.starts[self.index + 1] {
            self.index += 1;
            self.active = None;
        }

        let mut source = match self.active.take() {
            Some(source) => source,
            None => {
                debug!("Sequence segment {} starts at {:.3}s", self.index, self.starts[self.index]);
                self.clips[self.index].frames(self.fps)?
            }
        };

        let local = (t - self.starts[self.index]).max(0.0);
        let frame = source.frame_at(local)?;
        self.active = Some(source);

        Ok(frame.centered_on_canvas(self.canvas.0, self.canvas.1))
    }
}

/// Foreground centered over background, sized to the background
pub struct CompositeFrames {
    background: Box<dyn FrameSource>,
    foreground: Box<dyn FrameSource>,
}

impl CompositeFrames {
    pub fn new(background: Box<dyn FrameSource>, foreground: Box<dyn FrameSource>) -> Self {
        Self { background, foreground }
    }
}

impl FrameSource for CompositeFrames {
    fn frame_at(&mut self, t: f64) -> Result<Frame> {
        let mut canvas = self.background.frame_at(t)?;
        let top = self.foreground.frame_at(t)?;
        canvas.overlay_centered(&top);
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports the timestamp it was asked for in the red channel
    struct ClockFrames;

    impl FrameSource for ClockFrames {
        fn frame_at(&mut self, t: f64) -> Result<Frame> {
            Ok(Frame::new_filled(2, 2, [(t * 10.0).round() as u8, 0, 0]))
        }
    }

    #[test]
    fn test_still_frames_ignore_time() {
        let mut source = StillFrames::new(Frame::new_filled(3, 3, [0, 0, 255]));
        assert_eq!(source.frame_at(0.0).unwrap().get_pixel(1, 1), [0, 0, 255, 255]);
        assert_eq!(source.frame_at(100.0).unwrap().get_pixel(1, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn test_scaled_frames_resize_each_frame() {
        let mut source = ScaledFrames::new(Box::new(ClockFrames), (8, 4));
        let frame = source.frame_at(1.0).unwrap();
        assert_eq!(frame.dimensions(), (8, 4));
    }

    #[test]
    fn test_sequence_switches_segments_at_boundaries() {
        let red = Clip::still(Frame::new_filled(4, 2, [255, 0, 0]), 1.0);
        let blue = Clip::still(Frame::new_filled(2, 2, [0, 0, 255]), 2.0);
        let mut source = SequenceFrames::new(vec![red, blue], (4, 2), 24.0);

        assert_eq!(source.frame_at(0.0).unwrap().get_pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(source.frame_at(0.99).unwrap().get_pixel(0, 0), [255, 0, 0, 255]);

        let frame = source.frame_at(1.0).unwrap();
        assert_eq!(frame.get_pixel(0, 0)[3], 0);
        assert_eq!(frame.get_pixel(1, 0), [0, 0, 255, 255]);
        assert_eq!(frame.get_pixel(2, 1), [0, 0, 255, 255]);
        assert_eq!(frame.get_pixel(3, 1)[3], 0);

        // Past the end the last segment keeps showing.
        assert_eq!(source.frame_at(5.0).unwrap().get_pixel(1, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_composite_layers_foreground_over_background() {
        let mut source = CompositeFrames::new(
            Box::new(StillFrames::new(Frame::new_filled(6, 4, [255, 0, 0]))),
            Box::new(StillFrames::new(Frame::new_filled(2, 2, [0, 255, 0]))),
        );
        let frame = source.frame_at(0.0).unwrap();
        assert_eq!(frame.dimensions(), (6, 4));
        assert_eq!(frame.get_pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(frame.get_pixel(2, 1), [0, 255, 0, 255]);
    }
}

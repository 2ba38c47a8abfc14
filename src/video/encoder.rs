use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info, warn};

use crate::config::ToolsConfig;
use crate::error::{ReelError, Result, WriteError};
use crate::params;
use crate::video::clip::Clip;

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: u64,
    pub file_size: u64,
}

/// Final stage of a job: turns a clip into a file
pub trait ClipWriter: Send + Sync {
    fn write(&self, clip: &Clip, path: &Path) -> Result<EncodedVideo>;
}

/// Renders clips frame by frame and pipes raw RGB into an ffmpeg encoder.
///
/// Output is always H.264 at the fixed frame rate with no audio stream.
#[derive(Debug, Clone)]
pub struct FfmpegWriter {
    ffmpeg: PathBuf,
    fps: f64,
    codec: String,
}

impl FfmpegWriter {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            fps: params::OUTPUT_FPS,
            codec: params::OUTPUT_CODEC.to_string(),
        }
    }

    pub fn check_ffmpeg_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn spawn_encoder(&self, size: (u32, u32), path: &Path) -> Result<Child> {
        Command::new(&self.ffmpeg)
            .args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", size.0, size.1)])
            .args(["-r", &self.fps.to_string(), "-i", "-"])
            .args(["-an", "-c:v", &self.codec, "-pix_fmt", params::OUTPUT_PIXEL_FORMAT])
            // yuv420p needs even dimensions
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-r", &self.fps.to_string()])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                WriteError::EncoderUnavailable {
                    reason: format!("{}: {}", self.ffmpeg.display(), e),
                }
                .into()
            })
    }

    fn render_into(&self, clip: &Clip, stdin: &mut ChildStdin, frame_count: u64) -> Result<()> {
        let mut frames = clip.frames(self.fps)?;
        for index in 0..frame_count {
            let t = index as f64 / self.fps;
            let frame = frames.frame_at(t)?;
            stdin.write_all(&frame.to_rgb_bytes())?;

            if index > 0 && index % (self.fps as u64 * 10).max(1) == 0 {
                debug!("Encoded {}/{} frames", index, frame_count);
            }
        }
        stdin.flush()?;
        Ok(())
    }
}

impl ClipWriter for FfmpegWriter {
    fn write(&self, clip: &Clip, path: &Path) -> Result<EncodedVideo> {
        let frame_count = frame_count(clip.duration(), self.fps);
        let path_str = path.display().to_string();

        info!(
            "Encoding {} frames ({}x{}, {:.2}s) to {}",
            frame_count,
            clip.width(),
            clip.height(),
            clip.duration(),
            path_str
        );

        let mut child = self.spawn_encoder(clip.size(), path)?;
        let mut stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(WriteError::EncoderUnavailable {
                    reason: "encoder input not captured".to_string(),
                }
                .into());
            }
        };

        let rendered = self.render_into(clip, &mut stdin, frame_count);
        drop(stdin);

        if let Err(e) = rendered {
            let _ = child.kill();
            let output = child.wait_with_output();
            remove_partial(path);

            // A closed pipe means ffmpeg gave up first; its stderr says why.
            return Err(match e {
                ReelError::Io(io) => {
                    let stderr = output
                        .map(|o| String::from_utf8_lossy(&o.stderr).trim().to_string())
                        .unwrap_or_default();
                    WriteError::EncodingFailed {
                        path: path_str,
                        reason: format!("{} {}", io, stderr).trim().to_string(),
                    }
                    .into()
                }
                other => other,
            });
        }

        let output = child.wait_with_output().map_err(|e| WriteError::EncodingFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            remove_partial(path);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WriteError::EncodingFailed {
                path: path_str,
                reason: format!("ffmpeg failed: {}", stderr.trim()),
            }
            .into());
        }

        let metadata = std::fs::metadata(path).map_err(|e| WriteError::OutputFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

        Ok(EncodedVideo {
            path: path.to_path_buf(),
            duration: frame_count as f64 / self.fps,
            frame_count,
            file_size: metadata.len(),
        })
    }
}

/// Frames needed to cover `duration` at `fps` (never zero)
pub fn frame_count(duration: f64, fps: f64) -> u64 {
    ((duration * fps - 1e-6).ceil().max(1.0)) as u64
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove partial output {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::types::Frame;
    use tempfile::tempdir;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(10.0, 24.0), 240);
        assert_eq!(frame_count(3.003, 24.0), 73);
        assert_eq!(frame_count(0.01, 24.0), 1);
    }

    #[test]
    fn test_missing_ffmpeg_is_a_write_error() {
        let dir = tempdir().unwrap();
        let tools = ToolsConfig {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg-binary"),
            ..ToolsConfig::default()
        };
        let writer = FfmpegWriter::new(&tools);
        assert!(!writer.check_ffmpeg_available());

        let clip = Clip::still(Frame::new_filled(4, 4, [0, 0, 0]), 1.0);
        let out = dir.path().join("out.mp4");
        let result = writer.write(&clip, &out);
        assert!(matches!(
            result,
            Err(ReelError::Write(WriteError::EncoderUnavailable { .. }))
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_writes_small_clip_when_ffmpeg_present() {
        let writer = FfmpegWriter::new(&ToolsConfig::default());
        if !writer.check_ffmpeg_available() {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let out = dir.path().join("small.mp4");
        let clip = Clip::still(Frame::new_filled(64, 36, [200, 10, 10]), 0.5);
        let encoded = writer.write(&clip, &out).unwrap();

        assert_eq!(encoded.frame_count, 12);
        assert!(encoded.file_size > 0);
        assert!(out.exists());
    }
}

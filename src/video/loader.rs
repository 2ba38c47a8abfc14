use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::GenericImageView;
use serde::Deserialize;
use tracing::debug;

use crate::batch::collector::{MediaItem, MediaKind};
use crate::config::ToolsConfig;
use crate::error::{DecodeError, Result};
use crate::video::clip::{Clip, VideoSource};
use crate::video::types::Frame;

/// Container metadata reported by ffprobe
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub duration: f64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    avg_frame_rate: Option<String>,
    #[serde(default)]
    tags: Option<FfprobeTags>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

impl FfprobeStream {
    /// Display rotation in degrees, normalized to `0..360`.
    ///
    /// The display matrix side data wins over the legacy `rotate` tag.
    fn rotation(&self) -> i64 {
        let degrees = self
            .side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0);
        (degrees.round() as i64).rem_euclid(360)
    }

    /// Frame size as ffmpeg delivers it after autorotation
    fn display_size(&self) -> (u32, u32) {
        let width = self.width.unwrap_or(0);
        let height = self.height.unwrap_or(0);
        match self.rotation() {
            90 | 270 => (height, width),
            _ => (width, height),
        }
    }
}

/// Turns media files into clips.
///
/// Videos are probed with ffprobe and decoded lazily with ffmpeg at render
/// time; images are decoded right away with the `image` crate.
#[derive(Debug, Clone)]
pub struct ClipLoader {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl ClipLoader {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
        }
    }

    /// Load a classified item.
    ///
    /// Images come back already scaled to `target_height` and lasting
    /// `image_duration` seconds; videos come back at native size and
    /// duration.
    pub fn load(&self, item: &MediaItem, image_duration: f64, target_height: u32) -> Result<Clip> {
        match item.kind {
            MediaKind::Video => self.load_video(&item.path),
            MediaKind::Image => self.load_image_fitted(&item.path, image_duration, target_height),
        }
    }

    /// Probe a video file and wrap it as a clip at its native size
    pub fn load_video<P: AsRef<Path>>(&self, path: P) -> Result<Clip> {
        let path = path.as_ref();
        let metadata = self.probe(path)?;

        debug!(
            "Video {:?}: {}x{} @ {:.2}fps, {:.2}s, codec {}, audio: {}",
            path, metadata.width, metadata.height, metadata.fps, metadata.duration,
            metadata.codec, metadata.has_audio
        );

        let source = VideoSource {
            path: path.to_path_buf(),
            native_size: (metadata.width, metadata.height),
            ffmpeg: self.ffmpeg.clone(),
        };
        Ok(Clip::video(source, metadata.duration, metadata.has_audio))
    }

    /// Decode an image at its native size, shown for `duration` seconds
    pub fn load_image<P: AsRef<Path>>(&self, path: P, duration: f64) -> Result<Clip> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| DecodeError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::DegenerateDimensions {
                source_name: path.display().to_string(),
                width,
                height,
            }
            .into());
        }

        debug!(
            "Image {:?}: {}x{} ({})",
            path,
            width,
            height,
            if image.color().has_alpha() { "with alpha" } else { "opaque" }
        );

        let clip = Clip::still(Frame::from_dynamic(image), 1.0);
        clip.with_duration(duration)
    }

    /// Decode an image and scale it to `target_height` in one step
    pub fn load_image_fitted<P: AsRef<Path>>(
        &self,
        path: P,
        duration: f64,
        target_height: u32,
    ) -> Result<Clip> {
        self.load_image(path, duration)?.resize(target_height)
    }

    /// Read container metadata with ffprobe
    pub fn probe<P: AsRef<Path>>(&self, path: P) -> Result<VideoMetadata> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| DecodeError::ToolUnavailable {
                tool: self.ffprobe.display().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::Unreadable {
                path: path_str,
                reason: format!("ffprobe failed: {}", stderr.trim()),
            }
            .into());
        }

        parse_probe_output(&path_str, &output.stdout)
    }
}

fn parse_probe_output(path: &str, json: &[u8]) -> Result<VideoMetadata> {
    let probe: FfprobeOutput = serde_json::from_slice(json).map_err(|e| DecodeError::Unreadable {
        path: path.to_string(),
        reason: format!("invalid ffprobe output: {}", e),
    })?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| DecodeError::NoVideoStream { path: path.to_string() })?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let (width, height) = video.display_size();
    if width == 0 || height == 0 {
        return Err(DecodeError::DegenerateDimensions {
            source_name: path.to_string(),
            width,
            height,
        }
        .into());
    }

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()))
        .or_else(|| parse_seconds(video.duration.as_deref()))
        .unwrap_or(0.0);
    if !(duration.is_finite() && duration > 0.0) {
        return Err(DecodeError::InvalidDuration {
            path: path.to_string(),
            duration,
        }
        .into());
    }

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        duration,
        fps,
        width,
        height,
        codec: video.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
        has_audio,
    })
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Parse ffprobe's "num/den" rate notation
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

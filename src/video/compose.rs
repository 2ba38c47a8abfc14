//! Sequence assembly and background compositing.

use tracing::debug;

use crate::error::{CompositionError, Result};
use crate::video::clip::{Clip, Content};

/// Concatenate clips end to end on a shared canvas.
///
/// The canvas takes the largest width and the largest height among the
/// inputs; each clip is centered on it for its own time segment and the
/// uncovered margins stay transparent. The result lasts as long as all
/// inputs together and carries audio if any input does.
pub fn assemble(clips: &[Clip]) -> Result<Clip> {
    if clips.is_empty() {
        return Err(CompositionError::EmptySequence.into());
    }

    let width = clips.iter().map(Clip::width).max().unwrap_or(0);
    let height = clips.iter().map(Clip::height).max().unwrap_or(0);
    let duration: f64 = clips.iter().map(Clip::duration).sum();
    let has_audio = clips.iter().any(Clip::has_audio);

    debug!(
        "Assembled {} clips on a {}x{} canvas ({:.2}s)",
        clips.len(),
        width,
        height,
        duration
    );

    Ok(Clip::from_content(
        Content::Sequence(clips.to_vec()),
        (width, height),
        duration,
        has_audio,
    ))
}

/// Center `foreground` over `background` and drop the audio.
///
/// The background is stamped to the foreground's duration; a still simply
/// stays on screen longer and a video holds its last frame. The result has
/// the background's dimensions.
pub fn composite(background: &Clip, foreground: &Clip) -> Result<Clip> {
    let background = background.with_duration(foreground.duration())?;

    Ok(Clip::from_content(
        Content::Composite {
            background: background.clone(),
            foreground: foreground.clone(),
        },
        background.size(),
        foreground.duration(),
        false,
    ))
}

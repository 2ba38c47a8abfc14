use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// What a content file is, decided once from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classify by extension, case-insensitively. `None` for anything else.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }
}

/// A classified content file inside a note folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// List the media files directly inside `folder`, sorted by file name.
///
/// Subdirectories and files with other extensions are left out.
pub fn collect<P: AsRef<Path>>(folder: P) -> Result<Vec<MediaItem>> {
    let folder = folder.as_ref();
    let mut items = Vec::new();

    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match MediaKind::from_path(&path) {
            Some(kind) => items.push(MediaItem { path, kind }),
            None => debug!("Ignoring {:?}", path),
        }
    }

    items.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(items)
}

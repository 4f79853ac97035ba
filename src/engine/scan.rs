use anyhow::Result;
use std::path::Path;
use walkdir::WalkDir;

use crate::engine::item::{Adjustments, VideoItem};

/// Video file extensions picked up by a folder scan
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi", "m4v"];

/// Check if a path has a video file extension
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan the top level of a source folder and build fresh items seeded with
/// the configured default adjustments.
///
/// Subfolders (including the processed/ archive) are deliberately not
/// descended into.
pub fn scan_items(root: &Path, defaults: Adjustments) -> Result<Vec<VideoItem>> {
    let mut items: Vec<VideoItem> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_video_file(e.path()))
        .map(|e| VideoItem::new(e.path().to_path_buf(), defaults))
        .collect();

    items.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(items)
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A decoded still frame held in memory (JPEG bytes straight from the grab).
pub type PreviewFrame = Vec<u8>;

/// Adjustment values applied to one source file.
///
/// Ranges: brightness -1.0..=1.0, contrast 0.0..=4.0, saturation 0.0..=3.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub output_width: u32,
    pub output_height: u32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.2,
            output_width: 1920,
            output_height: 1080,
        }
    }
}

/// One source file under consideration for the batch.
#[derive(Debug, Clone, Default)]
pub struct VideoItem {
    path: PathBuf,
    name: String,
    pub selected: bool,
    adjustments: Adjustments,

    // The before pair is immutable once extracted; the after pair is dropped
    // whenever any adjustment or resolution value changes.
    before_at40: Option<PreviewFrame>,
    before_at60: Option<PreviewFrame>,
    after_at40: Option<PreviewFrame>,
    after_at60: Option<PreviewFrame>,
}

impl VideoItem {
    pub fn new(path: PathBuf, adjustments: Adjustments) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            path,
            name,
            selected: true,
            adjustments,
            ..Self::default()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name derived from the source path.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn adjustments(&self) -> Adjustments {
        self.adjustments
    }

    pub fn set_brightness(&mut self, value: f64) {
        if self.adjustments.brightness != value {
            self.adjustments.brightness = value;
            self.invalidate_after_frames();
        }
    }

    pub fn set_contrast(&mut self, value: f64) {
        if self.adjustments.contrast != value {
            self.adjustments.contrast = value;
            self.invalidate_after_frames();
        }
    }

    pub fn set_saturation(&mut self, value: f64) {
        if self.adjustments.saturation != value {
            self.adjustments.saturation = value;
            self.invalidate_after_frames();
        }
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) {
        if self.adjustments.output_width != width || self.adjustments.output_height != height {
            self.adjustments.output_width = width;
            self.adjustments.output_height = height;
            self.invalidate_after_frames();
        }
    }

    /// Replace the whole adjustment set at once (bulk apply).
    pub fn apply_adjustments(&mut self, adjustments: Adjustments) {
        if self.adjustments != adjustments {
            self.adjustments = adjustments;
            self.invalidate_after_frames();
        }
    }

    /// Restore the per-run default adjustments.
    pub fn reset_adjustments(&mut self, defaults: Adjustments) {
        self.apply_adjustments(defaults);
    }

    pub fn before_frames(&self) -> (Option<&PreviewFrame>, Option<&PreviewFrame>) {
        (self.before_at40.as_ref(), self.before_at60.as_ref())
    }

    pub fn after_frames(&self) -> (Option<&PreviewFrame>, Option<&PreviewFrame>) {
        (self.after_at40.as_ref(), self.after_at60.as_ref())
    }

    pub fn has_before_frames(&self) -> bool {
        self.before_at40.is_some() || self.before_at60.is_some()
    }

    /// Store the before pair. Only the first extraction sticks.
    pub fn store_before_frames(&mut self, at40: Option<PreviewFrame>, at60: Option<PreviewFrame>) {
        if self.before_at40.is_none() {
            self.before_at40 = at40;
        }
        if self.before_at60.is_none() {
            self.before_at60 = at60;
        }
    }

    pub fn store_after_frames(&mut self, at40: Option<PreviewFrame>, at60: Option<PreviewFrame>) {
        self.after_at40 = at40;
        self.after_at60 = at60;
    }

    fn invalidate_after_frames(&mut self) {
        self.after_at40 = None;
        self.after_at60 = None;
    }

    /// Release every cached frame (list reload, batch completion, shutdown).
    pub fn clear_preview_cache(&mut self) {
        self.before_at40 = None;
        self.before_at60 = None;
        self.after_at40 = None;
        self.after_at60 = None;
    }
}

/// Copy the current item's adjustments to every item in the list and drop the
/// superseded after-frame caches.
pub fn apply_to_all(items: &mut [VideoItem], adjustments: Adjustments) {
    for item in items.iter_mut() {
        item.apply_adjustments(adjustments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> VideoItem {
        VideoItem::new(PathBuf::from("/videos/2024-01-15 Clip.mp4"), Adjustments::default())
    }

    #[test]
    fn name_is_derived_from_path() {
        assert_eq!(item().name(), "2024-01-15 Clip.mp4");
    }

    #[test]
    fn adjustment_change_invalidates_after_frames_only() {
        let mut item = item();
        item.store_before_frames(Some(vec![1]), Some(vec![2]));
        item.store_after_frames(Some(vec![3]), Some(vec![4]));

        item.set_brightness(0.25);

        assert!(item.has_before_frames());
        assert_eq!(item.after_frames(), (None, None));
    }

    #[test]
    fn unchanged_value_keeps_after_frames() {
        let mut item = item();
        item.store_after_frames(Some(vec![3]), Some(vec![4]));

        item.set_saturation(item.adjustments().saturation);

        assert!(item.after_frames().0.is_some());
    }

    #[test]
    fn before_frames_are_immutable_once_set() {
        let mut item = item();
        item.store_before_frames(Some(vec![1]), Some(vec![2]));
        item.store_before_frames(Some(vec![9]), Some(vec![9]));

        assert_eq!(item.before_frames().0, Some(&vec![1]));
        assert_eq!(item.before_frames().1, Some(&vec![2]));
    }

    #[test]
    fn resolution_change_invalidates_after_frames() {
        let mut item = item();
        item.store_after_frames(Some(vec![3]), None);
        item.set_output_size(1280, 720);
        assert_eq!(item.after_frames(), (None, None));
    }

    #[test]
    fn bulk_apply_clears_superseded_caches() {
        let mut items = vec![item(), item()];
        items[1].store_after_frames(Some(vec![5]), Some(vec![6]));

        let mut wanted = Adjustments::default();
        wanted.contrast = 1.5;
        apply_to_all(&mut items, wanted);

        assert_eq!(items[1].after_frames(), (None, None));
        assert_eq!(items[0].adjustments().contrast, 1.5);
    }
}

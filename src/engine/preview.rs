//! Live preview frame extraction.
//!
//! "Before" frames are grabbed once per file at the 40% and 60% marks;
//! "after" frames re-run the same grab with the color filter appended and are
//! regenerated (debounced) whenever adjustments change. Scaling is never
//! applied here - the preview exists for color grading feedback.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use uuid::Uuid;

use crate::engine::args::color_filter;
use crate::engine::debounce::Debouncer;
use crate::engine::item::{Adjustments, PreviewFrame};
use crate::engine::probe::probe_duration;

/// Fractions of the total duration where representative frames are taken.
pub const FRAME_POSITIONS: (f64, f64) = (0.40, 0.60);

/// Temp JPEGs may stay locked by the decoder briefly after exit.
const CLEANUP_GRACE: Duration = Duration::from_secs(1);

/// A before/after-agnostic pair of grabbed frames. Either slot may be empty
/// when the grab failed; that is never an error.
pub type FramePair = (Option<PreviewFrame>, Option<PreviewFrame>);

#[derive(Debug, Clone)]
pub struct PreviewPipeline {
    program: String,
    temp_dir: PathBuf,
    debouncer: Debouncer,
}

impl PreviewPipeline {
    pub fn new(program: impl Into<String>) -> Self {
        let temp_dir = std::env::temp_dir().join("vidforge");
        let _ = fs::create_dir_all(&temp_dir);

        Self {
            program: program.into(),
            temp_dir,
            debouncer: Debouncer::default(),
        }
    }

    #[cfg(test)]
    fn with_temp_dir(program: impl Into<String>, temp_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            temp_dir,
            debouncer: Debouncer::default(),
        }
    }

    /// Grab the unfiltered 40%/60% frames for a file.
    pub fn extract_before_frames(&self, source: &Path) -> FramePair {
        self.extract_pair(source, None)
    }

    /// Grab the 40%/60% frames with the current color adjustments applied.
    pub fn regenerate_after_frames(&self, source: &Path, adjustments: &Adjustments) -> FramePair {
        self.extract_pair(source, Some(color_filter(adjustments)))
    }

    /// Schedule a debounced regeneration; a burst of edits collapses into one
    /// grab once the quiet period passes without another edit.
    pub fn schedule_regeneration<F>(&self, source: PathBuf, adjustments: Adjustments, on_done: F)
    where
        F: FnOnce(FramePair) + Send + 'static,
    {
        let pipeline = self.clone();
        self.debouncer.schedule(move || {
            let pair = pipeline.regenerate_after_frames(&source, &adjustments);
            on_done(pair);
        });
    }

    /// Drop any pending regeneration (selection changed, shutdown).
    pub fn cancel_pending(&self) {
        self.debouncer.cancel();
    }

    fn extract_pair(&self, source: &Path, filter: Option<String>) -> FramePair {
        // Percentage seeks need the total duration; an unprobeable file simply
        // produces no preview.
        let duration = match probe_duration(source) {
            Ok(d) if d > 0.0 => d,
            _ => return (None, None),
        };

        let (p40, p60) = FRAME_POSITIONS;

        // The two timepoints are unrelated and each blocks on its own
        // external process, so they run concurrently and join here.
        let first = {
            let pipeline = self.clone();
            let source = source.to_path_buf();
            let filter = filter.clone();
            thread::spawn(move || pipeline.grab_frame(&source, duration * p40, filter.as_deref()))
        };
        let second = {
            let pipeline = self.clone();
            let source = source.to_path_buf();
            thread::spawn(move || pipeline.grab_frame(&source, duration * p60, filter.as_deref()))
        };

        (
            first.join().unwrap_or(None),
            second.join().unwrap_or(None),
        )
    }

    /// Extract a single frame at an absolute timestamp.
    ///
    /// Short-lived call: both output streams are fully captured and consumed
    /// before the process exits, so redirection is safe here.
    fn grab_frame(&self, source: &Path, seconds: f64, filter: Option<&str>) -> Option<PreviewFrame> {
        let output_path = self.temp_dir.join(format!("{}.jpg", Uuid::new_v4()));

        let mut args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{:.3}", seconds),
            "-i".to_string(),
            source.display().to_string(),
        ];
        if let Some(filter) = filter {
            args.push("-vf".to_string());
            args.push(filter.to_string());
        }
        args.extend([
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            output_path.display().to_string(),
        ]);

        let output = std::process::Command::new(&self.program)
            .args(&args)
            .output()
            .ok()?;

        if !output.status.success() || !output_path.exists() {
            return None;
        }

        let frame = fs::read(&output_path).ok();
        schedule_cleanup(output_path);
        frame
    }

    /// Best-effort sweep of stale temp frames (shutdown).
    pub fn cleanup_temp_files(&self) {
        let Ok(entries) = fs::read_dir(&self.temp_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "jpg") {
                let _ = fs::remove_file(path);
            }
        }
    }
}

/// Delete a temp frame after a short grace delay; failures are ignored.
fn schedule_cleanup(path: PathBuf) {
    thread::spawn(move || {
        thread::sleep(CLEANUP_GRACE);
        let _ = fs::remove_file(path);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprobeable_file_yields_empty_slots_not_errors() {
        let pipeline = PreviewPipeline::new("ffmpeg");
        let pair = pipeline.extract_before_frames(Path::new("/nonexistent/clip.mp4"));
        assert_eq!(pair, (None, None));
    }

    #[test]
    fn rapid_reschedules_collapse_into_one_regeneration() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let pipeline = PreviewPipeline::new("ffmpeg");
        let calls = Arc::new(AtomicUsize::new(0));

        // An unprobeable source keeps the regeneration itself a fast no-op
        for _ in 0..5 {
            let calls = Arc::clone(&calls);
            pipeline.schedule_regeneration(
                PathBuf::from("/nonexistent/clip.mp4"),
                Adjustments::default(),
                move |pair| {
                    assert_eq!(pair, (None, None));
                    calls.fetch_add(1, Ordering::SeqCst);
                },
            );
        }

        std::thread::sleep(std::time::Duration::from_millis(1500));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cleanup_sweep_removes_only_jpgs() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("stale.jpg");
        let other = dir.path().join("keep.txt");
        fs::write(&jpg, b"x").unwrap();
        fs::write(&other, b"x").unwrap();

        let pipeline = PreviewPipeline::with_temp_dir("ffmpeg", dir.path().to_path_buf());
        pipeline.cleanup_temp_files();

        assert!(!jpg.exists());
        assert!(other.exists());
    }
}

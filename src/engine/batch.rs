//! Sequential batch orchestration.
//!
//! Items run strictly one at a time in input order: the encoder already
//! saturates the machine by itself, and interleaved diagnostics from
//! concurrent encodes are unreadable. One item's failure never aborts the
//! batch.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::args::{FilterToggles, build_codec_args, build_encode_args, build_filter_chain};
use crate::engine::hardware::HardwareAvailability;
use crate::engine::item::VideoItem;
use crate::engine::profile::{CpuParams, EncoderProfile, ProfileError, resolve_profile};
use crate::engine::runner::{EncodeBackend, RunnerError};
use crate::events::{Event, Level, Reporter};
use crate::upload::{UploadRequest, VideoHost, render_template};

/// Name of the archive subfolder under the input directory.
const PROCESSED_DIR: &str = "processed";
/// Name of the subfolder (under the archive) for uploaded outputs.
const UPLOADED_DIR: &str = "uploaded";

/// Global toggles and paths for one run, snapshotted from config at start and
/// never mutated mid-run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Re-encode when true; byte-for-byte passthrough copy when false.
    pub reencode: bool,
    pub filters: FilterToggles,
    /// Move successfully processed sources into the archive subfolder.
    pub archive_originals: bool,
    pub extra_args: String,
}

/// Upload metadata templates resolved per item at upload time.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub title_template: String,
    pub description_template: String,
    pub tags: Vec<String>,
    pub privacy: String,
    pub category_id: String,
    pub made_for_kids: bool,
    pub age_restricted: bool,
    pub strip_date_from_filename: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub name: String,
    pub state: ItemState,
    pub error: Option<String>,
    /// URL of the published video when the upload step ran and succeeded.
    pub uploaded_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == ItemState::Succeeded)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == ItemState::Failed)
            .count()
    }
}

/// Errors that stop a batch before or instead of processing items.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no items selected")]
    NothingSelected,

    /// Configuration-range violations, rejected before any process launch.
    #[error("invalid encoder profile: {}", format_profile_errors(.0))]
    InvalidProfile(Vec<ProfileError>),

    /// The encoder binary is missing or unlaunchable.
    #[error(transparent)]
    Environment(#[from] RunnerError),

    #[error("failed to prepare directories: {0}")]
    Io(#[from] std::io::Error),
}

fn format_profile_errors(errors: &[ProfileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Run the whole batch.
///
/// The profile is resolved (with hardware fallback) exactly once per run;
/// the selected set is snapshotted before the first encode. All preview
/// caches across all items are released when the run finishes, whatever the
/// per-item outcomes were.
pub fn run_batch(
    items: &mut [VideoItem],
    requested: &EncoderProfile,
    cpu_fallback: &CpuParams,
    options: &BatchOptions,
    hardware: &HardwareAvailability,
    backend: &dyn EncodeBackend,
    uploader: Option<(&dyn VideoHost, &UploadSettings)>,
    reporter: &Reporter,
) -> Result<BatchReport, BatchError> {
    let selected: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.selected)
        .map(|(i, _)| i)
        .collect();

    if selected.is_empty() {
        return Err(BatchError::NothingSelected);
    }

    let resolved = resolve_profile(requested, cpu_fallback, hardware, reporter);
    let codec_args = build_codec_args(&resolved.profile).map_err(BatchError::InvalidProfile)?;

    fs::create_dir_all(&options.output_dir)?;
    let processed_dir = options.input_dir.join(PROCESSED_DIR);
    if options.archive_originals {
        fs::create_dir_all(&processed_dir)?;
    }

    reporter.info(format!(
        "Starting conversion of {} video(s) with {}",
        selected.len(),
        resolved.profile.display_name()
    ));

    let total = selected.len();
    let mut report = BatchReport::default();

    for (position, &index) in selected.iter().enumerate() {
        let item = &items[index];
        let name = item.name().to_string();

        reporter.send(Event::ItemStarted {
            index: position + 1,
            total,
            name: name.clone(),
        });
        reporter.info(format!("[{}/{}] Processing: {}", position + 1, total, name));

        let output_path = options.output_dir.join(&name);
        let mut outcome = ItemOutcome {
            name: name.clone(),
            state: ItemState::Running,
            error: None,
            uploaded_url: None,
        };

        let encoded = if options.reencode {
            encode_item(item, &output_path, &codec_args, options, backend, reporter)
        } else {
            // Passthrough for upload-only workflows
            reporter.info("  Copying file (conversion disabled)");
            match fs::copy(item.path(), &output_path) {
                Ok(_) => Ok(true),
                Err(e) => {
                    reporter.error(format!("  Copy failed: {}", e));
                    Ok(false)
                }
            }
        };

        let encoded = match encoded {
            Ok(ok) => ok,
            // A missing binary is an environment failure, not an item failure
            Err(e) => {
                reporter.error(e.to_string());
                return Err(e);
            }
        };

        if encoded {
            reporter.success(format!("Successfully processed: {}", name));

            if options.archive_originals {
                archive_original(item.path(), &processed_dir.join(&name), reporter);
            }

            if let Some((host, settings)) = uploader {
                outcome.uploaded_url =
                    upload_output(&output_path, &processed_dir, host, settings, reporter);
            }

            outcome.state = ItemState::Succeeded;
            reporter.send(Event::ItemSucceeded { name: name.clone() });
        } else {
            // Source stays in place; the batch moves on
            reporter.error(format!("Error converting: {} - original kept in place", name));
            outcome.state = ItemState::Failed;
            outcome.error = Some("encode failed".to_string());
            reporter.send(Event::ItemFailed {
                name: name.clone(),
                error: "encode failed".to_string(),
            });
        }

        report.outcomes.push(outcome);
    }

    reporter.send(Event::BatchFinished {
        succeeded: report.succeeded(),
        failed: report.failed(),
    });

    // Bound memory between runs regardless of per-item outcomes
    for item in items.iter_mut() {
        item.clear_preview_cache();
    }

    Ok(report)
}

// Ok(true/false) is the per-item pass/fail; Err is reserved for batch-fatal
// conditions (missing encoder binary).
fn encode_item(
    item: &VideoItem,
    output_path: &Path,
    codec_args: &[String],
    options: &BatchOptions,
    backend: &dyn EncodeBackend,
    reporter: &Reporter,
) -> Result<bool, BatchError> {
    let adjustments = item.adjustments();
    let filters = build_filter_chain(&adjustments, options.filters);

    if options.filters.scaling {
        reporter.info(format!(
            "  Scaling: {}x{}",
            adjustments.output_width, adjustments.output_height
        ));
    }
    if options.filters.color {
        reporter.info(format!(
            "  Color: Brightness={:.2}, Contrast={:.2}, Saturation={:.2}",
            adjustments.brightness, adjustments.contrast, adjustments.saturation
        ));
    }

    let args = build_encode_args(
        item.path(),
        output_path,
        &filters,
        codec_args,
        &options.extra_args,
    );

    match backend.run_encode(&args, item.name(), reporter) {
        Ok(run) => {
            if !run.success {
                for line in &run.diagnostic_tail {
                    reporter.error(format!("  {}", line));
                }
            }
            Ok(run.success)
        }
        Err(e @ RunnerError::EncoderNotFound { .. }) => Err(BatchError::Environment(e)),
        Err(e) => {
            reporter.error(format!("  {}", e));
            Ok(false)
        }
    }
}

fn archive_original(source: &Path, destination: &Path, reporter: &Reporter) {
    match fs::rename(source, destination) {
        Ok(()) => reporter.info("  Moved original to processed folder"),
        Err(e) => reporter.warning(format!("  Could not archive original: {}", e)),
    }
}

/// Hand the encoded output to the upload collaborator.
///
/// Success relocates the output into the uploaded subfolder; failure keeps it
/// in the output folder and the batch continues.
fn upload_output(
    output_path: &Path,
    processed_dir: &Path,
    host: &dyn VideoHost,
    settings: &UploadSettings,
    reporter: &Reporter,
) -> Option<String> {
    reporter.info("  Uploading to video platform...");

    let strip = settings.strip_date_from_filename;
    let request = UploadRequest {
        title: render_template(&settings.title_template, output_path, strip),
        description: render_template(&settings.description_template, output_path, strip),
        tags: settings.tags.clone(),
        privacy: settings.privacy.clone(),
        category_id: settings.category_id.clone(),
        made_for_kids: settings.made_for_kids,
        age_restricted: settings.age_restricted,
    };

    let progress_reporter = reporter.clone();
    let mut on_progress = move |percent: u8| {
        progress_reporter.emit(Level::Info, format!("  Upload progress: {}%", percent));
    };

    match host.upload(output_path, &request, &mut on_progress) {
        Ok(receipt) => {
            reporter.success(format!("  Uploaded: {}", receipt.url));

            let uploaded_dir = processed_dir.join(UPLOADED_DIR);
            let relocated = fs::create_dir_all(&uploaded_dir).and_then(|_| {
                let target = uploaded_dir.join(output_path.file_name().unwrap_or_default());
                fs::rename(output_path, &target)
            });
            match relocated {
                Ok(()) => reporter.info("  Moved converted video to uploaded folder"),
                Err(e) => reporter.warning(format!("  Could not move uploaded video: {}", e)),
            }

            Some(receipt.url)
        }
        Err(e) => {
            reporter.error(format!(
                "  Upload failed - converted video kept in output folder ({})",
                e
            ));
            None
        }
    }
}

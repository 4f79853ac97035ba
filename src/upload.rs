//! Narrow interface to the video-platform upload collaborator, plus the
//! title/description template engine.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use thiserror::Error;

/// Token set understood by [`render_template`].
///
/// `{filename}`, `{filename_ext}`, `{recording_date}`, `{date}`, `{time}`,
/// `{datetime}`, `{year}`, `{month}`, `{day}`.
pub fn render_template(template: &str, output_path: &Path, strip_date: bool) -> String {
    let mut filename = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut filename_ext = output_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    // The recording date comes from the filename itself, not the clock
    let recording_date = extract_recording_date(&filename).unwrap_or_default();

    if strip_date {
        filename = strip_date_from(&filename);
        filename_ext = strip_date_from(&filename_ext);
    }

    let now = Local::now();

    template
        .replace("{filename}", &filename)
        .replace("{filename_ext}", &filename_ext)
        .replace("{recording_date}", &recording_date)
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{time}", &now.format("%H:%M:%S").to_string())
        .replace("{datetime}", &now.format("%Y-%m-%d %H:%M:%S").to_string())
        .replace("{year}", &now.format("%Y").to_string())
        .replace("{month}", &now.format("%m").to_string())
        .replace("{day}", &now.format("%d").to_string())
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("static pattern"))
}

/// First yyyy-MM-dd substring that is an actual calendar date.
pub fn extract_recording_date(filename: &str) -> Option<String> {
    date_pattern()
        .find_iter(filename)
        .map(|m| m.as_str())
        .find(|candidate| NaiveDate::parse_from_str(candidate, "%Y-%m-%d").is_ok())
        .map(str::to_string)
}

/// Remove yyyy-MM-dd patterns and tidy up the separators left behind.
pub fn strip_date_from(input: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    static DANGLING: OnceLock<Regex> = OnceLock::new();

    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("static pattern"));
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[-_]{2,}").expect("static pattern"));
    let dangling = DANGLING.get_or_init(|| Regex::new(r"\s*-\s*-\s*").expect("static pattern"));

    let result = date_pattern().replace_all(input, "");
    let result = spaces.replace_all(&result, " ");
    let result = result.trim_matches([' ', '-', '_', '.']);
    let result = separators.replace_all(result, "-");
    dangling.replace_all(&result, " - ").to_string()
}

/// Everything the platform needs besides the file itself.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub privacy: String,
    pub category_id: String,
    pub made_for_kids: bool,
    pub age_restricted: bool,
}

/// Identity of a published video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("not authenticated with the video platform")]
    NotAuthenticated,

    #[error("upload failed: {0}")]
    Failed(String),
}

/// The upload collaborator. Implemented by the host application; the batch
/// core only drives it and reacts to the outcome.
pub trait VideoHost {
    fn upload(
        &self,
        path: &Path,
        request: &UploadRequest,
        progress: &mut dyn FnMut(u8),
    ) -> Result<UploadReceipt, UploadError>;
}

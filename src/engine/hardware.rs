//! Hardware encoder detection.

use std::process::Command;
use std::sync::OnceLock;

/// Cache for the output of `ffmpeg -encoders`.
///
/// Hardware availability cannot change mid-run, so the listing is captured at
/// most once per process. A missing binary or non-zero exit leaves the cache
/// empty, which reads as "nothing available" - the probe never fails the
/// caller.
static FFMPEG_ENCODERS_OUTPUT_CACHE: OnceLock<String> = OnceLock::new();

fn ffmpeg_encoders_output() -> &'static str {
    FFMPEG_ENCODERS_OUTPUT_CACHE.get_or_init(|| {
        Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).to_string())
            .unwrap_or_default()
    })
}

/// Check if the hevc_nvenc encoder is available (cached)
pub fn check_hevc_nvenc_available() -> bool {
    ffmpeg_encoders_output().contains("hevc_nvenc")
}

/// Check if the av1_nvenc encoder is available (cached)
pub fn check_av1_nvenc_available() -> bool {
    ffmpeg_encoders_output().contains("av1_nvenc")
}

/// Snapshot of which hardware encoders this machine exposes.
///
/// `Default` runs the real probes; tests construct the struct directly.
#[derive(Debug, Clone, Copy)]
pub struct HardwareAvailability {
    pub hevc_nvenc: bool,
    pub av1_nvenc: bool,
}

impl Default for HardwareAvailability {
    fn default() -> Self {
        Self {
            hevc_nvenc: check_hevc_nvenc_available(),
            av1_nvenc: check_av1_nvenc_available(),
        }
    }
}

impl HardwareAvailability {
    pub fn none() -> Self {
        Self {
            hevc_nvenc: false,
            av1_nvenc: false,
        }
    }
}

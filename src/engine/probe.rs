// Environment checks and input probing

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Check that ffmpeg is launchable and return its version line
pub fn ffmpeg_version() -> Result<String> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .context("Failed to execute ffmpeg. Is ffmpeg installed and in PATH?")?;

    if !output.status.success() {
        anyhow::bail!("ffmpeg command failed with status: {}", output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check that ffprobe is launchable and return its version line
pub fn ffprobe_version() -> Result<String> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .context("Failed to execute ffprobe. Is ffprobe installed and in PATH?")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe command failed with status: {}", output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Probe a video file for its duration in seconds.
///
/// ffprobe is asked to print the duration as a bare float on stdout; parsing
/// with `f64::from_str` keeps the decimal point locale-invariant.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_duration_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("No usable duration for {}", path.display()))
}

/// Parse the single float ffprobe prints for `format=duration`.
pub fn parse_duration_output(stdout: &str) -> Result<f64> {
    let value = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .context("Empty ffprobe output")?;

    value
        .parse::<f64>()
        .with_context(|| format!("Failed to parse duration '{}' as float", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_float() {
        assert_eq!(parse_duration_output("123.456\n").unwrap(), 123.456);
    }

    #[test]
    fn parses_integer_duration() {
        assert_eq!(parse_duration_output("60\n").unwrap(), 60.0);
    }

    #[test]
    fn skips_leading_blank_lines() {
        assert_eq!(parse_duration_output("\n  \n12.5\n").unwrap(), 12.5);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration_output("N/A\n").is_err());
        assert!(parse_duration_output("").is_err());
    }
}

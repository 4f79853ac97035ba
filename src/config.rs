// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::engine::args::FilterToggles;
use crate::engine::batch::{BatchOptions, UploadSettings};
use crate::engine::item::Adjustments;
use crate::engine::profile::{Av1NvencParams, CpuParams, EncoderProfile, HevcNvencParams};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub defaults: AdjustmentDefaults,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Folder scanned for source videos
    #[serde(default)]
    pub input_dir: String,

    /// Folder encoded outputs land in
    #[serde(default)]
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Re-encode when true; copy byte-for-byte when false (upload-only runs)
    #[serde(default = "default_true")]
    pub reencode: bool,

    #[serde(default = "default_true")]
    pub scaling: bool,

    #[serde(default = "default_true")]
    pub color_adjustments: bool,

    /// Move successfully processed sources into processed/
    #[serde(default = "default_true")]
    pub archive_originals: bool,

    /// Extra ffmpeg arguments appended verbatim (shell-style quoting allowed)
    #[serde(default)]
    pub extra_args: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentDefaults {
    #[serde(default)]
    pub brightness: f64,

    #[serde(default = "default_contrast")]
    pub contrast: f64,

    #[serde(default = "default_saturation")]
    pub saturation: f64,

    #[serde(default = "default_width")]
    pub output_width: u32,

    #[serde(default = "default_height")]
    pub output_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Which profile drives the next run: cpu, gpu-hevc, or gpu-av1
    #[serde(default = "default_active_encoder")]
    pub active: String,

    #[serde(default)]
    pub cpu: CpuParams,

    #[serde(default)]
    pub gpu_hevc: HevcNvencParams,

    #[serde(default)]
    pub gpu_av1: Av1NvencParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_title_template")]
    pub title_template: String,

    #[serde(default = "default_description_template")]
    pub description_template: String,

    /// Comma-separated tag list
    #[serde(default = "default_tags")]
    pub tags: String,

    /// private, unlisted, or public
    #[serde(default = "default_privacy")]
    pub privacy: String,

    #[serde(default = "default_category")]
    pub category_id: String,

    #[serde(default)]
    pub made_for_kids: bool,

    #[serde(default)]
    pub age_restricted: bool,

    #[serde(default)]
    pub strip_date_from_filename: bool,
}

fn default_true() -> bool {
    true
}
fn default_contrast() -> f64 {
    1.0
}
fn default_saturation() -> f64 {
    1.2
}
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_active_encoder() -> String {
    "cpu".to_string()
}
fn default_title_template() -> String {
    "{filename}".to_string()
}
fn default_description_template() -> String {
    "Converted video: {filename}".to_string()
}
fn default_tags() -> String {
    "gaming,gameplay".to_string()
}
fn default_privacy() -> String {
    "private".to_string()
}
fn default_category() -> String {
    "20".to_string()
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            reencode: true,
            scaling: true,
            color_adjustments: true,
            archive_originals: true,
            extra_args: String::new(),
        }
    }
}

impl Default for AdjustmentDefaults {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: default_contrast(),
            saturation: default_saturation(),
            output_width: default_width(),
            output_height: default_height(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            active: default_active_encoder(),
            cpu: CpuParams::default(),
            gpu_hevc: HevcNvencParams::default(),
            gpu_av1: Av1NvencParams::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            title_template: default_title_template(),
            description_template: default_description_template(),
            tags: default_tags(),
            privacy: default_privacy(),
            category_id: default_category(),
            made_for_kids: false,
            age_restricted: false,
            strip_date_from_filename: false,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("vidforge")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("vidforge")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or fall back to defaults when missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            let config: Config = toml::from_str(&contents).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk, creating the directory if needed
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// The profile the operator selected for the next run.
    pub fn requested_profile(&self) -> Result<EncoderProfile> {
        match self.encoder.active.as_str() {
            "cpu" => Ok(EncoderProfile::Cpu(self.encoder.cpu.clone())),
            "gpu-hevc" => Ok(EncoderProfile::GpuHevc(self.encoder.gpu_hevc.clone())),
            "gpu-av1" => Ok(EncoderProfile::GpuAv1(self.encoder.gpu_av1.clone())),
            other => anyhow::bail!(
                "Unknown encoder '{}' (expected cpu, gpu-hevc, or gpu-av1)",
                other
            ),
        }
    }

    /// Immutable snapshot of the run options, taken once at batch start.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            input_dir: PathBuf::from(&self.paths.input_dir),
            output_dir: PathBuf::from(&self.paths.output_dir),
            reencode: self.processing.reencode,
            filters: FilterToggles {
                scaling: self.processing.scaling,
                color: self.processing.color_adjustments,
            },
            archive_originals: self.processing.archive_originals,
            extra_args: self.processing.extra_args.clone(),
        }
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            title_template: self.upload.title_template.clone(),
            description_template: self.upload.description_template.clone(),
            tags: self
                .upload
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            privacy: self.upload.privacy.clone(),
            category_id: self.upload.category_id.clone(),
            made_for_kids: self.upload.made_for_kids,
            age_restricted: self.upload.age_restricted,
            strip_date_from_filename: self.upload.strip_date_from_filename,
        }
    }

    pub fn default_adjustments(&self) -> Adjustments {
        Adjustments {
            brightness: self.defaults.brightness,
            contrast: self.defaults.contrast,
            saturation: self.defaults.saturation,
            output_width: self.defaults.output_width,
            output_height: self.defaults.output_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_full_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.processing.reencode);
        assert_eq!(config.encoder.active, "cpu");
        assert_eq!(config.defaults.saturation, 1.2);
        assert_eq!(config.upload.privacy, "private");
    }

    #[test]
    fn active_encoder_selects_the_matching_profile() {
        let mut config = Config::default();
        config.encoder.active = "gpu-av1".to_string();
        config.encoder.gpu_av1.cq = 30;

        match config.requested_profile().unwrap() {
            EncoderProfile::GpuAv1(p) => assert_eq!(p.cq, 30),
            other => panic!("wrong profile: {:?}", other),
        }
    }

    #[test]
    fn unknown_encoder_name_is_an_error() {
        let mut config = Config::default();
        config.encoder.active = "gpu-vp9".to_string();
        assert!(config.requested_profile().is_err());
    }

    #[test]
    fn tags_are_trimmed_and_split() {
        let mut config = Config::default();
        config.upload.tags = "gaming, gameplay , , speedrun".to_string();

        let settings = config.upload_settings();
        assert_eq!(settings.tags, vec!["gaming", "gameplay", "speedrun"]);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = Config::default();
        config.encoder.cpu.crf = 18;
        config.processing.extra_args = "-movflags +faststart".to_string();

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.encoder.cpu.crf, 18);
        assert_eq!(back.processing.extra_args, "-movflags +faststart");
    }
}

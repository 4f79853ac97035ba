//! Encoder profiles and their validation rules.
//!
//! Exactly one profile is active per batch run. Every numeric knob is checked
//! against its closed range before it is serialized into arguments;
//! out-of-range values are configuration errors, never silent clamps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::hardware::HardwareAvailability;
use crate::events::{Level, Reporter};

// Closed ranges for the numeric knobs, per encoder family.
pub const CPU_CRF_RANGE: (u32, u32) = (0, 51);
pub const CPU_BFRAMES_RANGE: (u32, u32) = (0, 16);
pub const CPU_LOOKAHEAD_RANGE: (u32, u32) = (0, 250);
pub const HEVC_CQ_RANGE: (u32, u32) = (0, 51);
pub const HEVC_BFRAMES_RANGE: (u32, u32) = (0, 4);
pub const NVENC_LOOKAHEAD_RANGE: (u32, u32) = (0, 32);
pub const AV1_CQ_RANGE: (u32, u32) = (0, 63);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} = {value} is outside the valid range {min}..={max} for {encoder}")]
pub struct ProfileError {
    pub encoder: &'static str,
    pub field: &'static str,
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

fn check(
    encoder: &'static str,
    field: &'static str,
    value: u32,
    (min, max): (u32, u32),
    errors: &mut Vec<ProfileError>,
) {
    if value < min || value > max {
        errors.push(ProfileError {
            encoder,
            field,
            value,
            min,
            max,
        });
    }
}

fn default_cpu_crf() -> u32 {
    23
}
fn default_cpu_preset() -> String {
    "medium".to_string()
}
fn default_bframes() -> u32 {
    4
}
fn default_cpu_lookahead() -> u32 {
    20
}
fn default_bit_depth() -> u32 {
    8
}
fn default_cq() -> u32 {
    21
}
fn default_nvenc_preset() -> String {
    "p5".to_string()
}
fn default_rate_control() -> String {
    "constqp".to_string()
}
fn default_true() -> bool {
    true
}
fn default_hevc_bframes() -> u32 {
    3
}
fn default_nvenc_lookahead() -> u32 {
    32
}
fn default_multipass() -> String {
    "disabled".to_string()
}

/// Software x265 parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuParams {
    #[serde(default = "default_cpu_crf")]
    pub crf: u32,

    #[serde(default = "default_cpu_preset")]
    pub preset: String,

    /// Empty string means no tune flag.
    #[serde(default)]
    pub tune: String,

    #[serde(default = "default_bframes")]
    pub bframes: u32,

    #[serde(default = "default_cpu_lookahead")]
    pub lookahead: u32,

    /// 8 or 10.
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u32,
}

impl Default for CpuParams {
    fn default() -> Self {
        Self {
            crf: default_cpu_crf(),
            preset: default_cpu_preset(),
            tune: String::new(),
            bframes: default_bframes(),
            lookahead: default_cpu_lookahead(),
            bit_depth: default_bit_depth(),
        }
    }
}

/// NVENC HEVC parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HevcNvencParams {
    #[serde(default = "default_cq")]
    pub cq: u32,

    /// Preset tier p1 (fastest) .. p7 (best quality).
    #[serde(default = "default_nvenc_preset")]
    pub preset: String,

    /// constqp, vbr, or cbr.
    #[serde(default = "default_rate_control")]
    pub rate_control: String,

    #[serde(default = "default_true")]
    pub spatial_aq: bool,

    #[serde(default = "default_true")]
    pub temporal_aq: bool,

    #[serde(default = "default_hevc_bframes")]
    pub bframes: u32,

    #[serde(default = "default_nvenc_lookahead")]
    pub lookahead: u32,

    /// disabled, qres, or fullres.
    #[serde(default = "default_multipass")]
    pub multipass: String,

    #[serde(default = "default_bit_depth")]
    pub bit_depth: u32,
}

impl Default for HevcNvencParams {
    fn default() -> Self {
        Self {
            cq: default_cq(),
            preset: default_nvenc_preset(),
            rate_control: default_rate_control(),
            spatial_aq: true,
            temporal_aq: true,
            bframes: default_hevc_bframes(),
            lookahead: default_nvenc_lookahead(),
            multipass: default_multipass(),
            bit_depth: default_bit_depth(),
        }
    }
}

/// NVENC AV1 parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Av1NvencParams {
    #[serde(default = "default_cq")]
    pub cq: u32,

    #[serde(default = "default_nvenc_preset")]
    pub preset: String,

    #[serde(default = "default_rate_control")]
    pub rate_control: String,

    #[serde(default = "default_multipass")]
    pub multipass: String,

    #[serde(default = "default_nvenc_lookahead")]
    pub lookahead: u32,
}

impl Default for Av1NvencParams {
    fn default() -> Self {
        Self {
            cq: default_cq(),
            preset: default_nvenc_preset(),
            rate_control: default_rate_control(),
            multipass: default_multipass(),
            lookahead: default_nvenc_lookahead(),
        }
    }
}

/// One of three mutually exclusive encoder parameter sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum EncoderProfile {
    Cpu(CpuParams),
    GpuHevc(HevcNvencParams),
    GpuAv1(Av1NvencParams),
}

impl EncoderProfile {
    /// The ffmpeg encoder name this profile maps to.
    pub fn encoder_name(&self) -> &'static str {
        match self {
            Self::Cpu(_) => "libx265",
            Self::GpuHevc(_) => "hevc_nvenc",
            Self::GpuAv1(_) => "av1_nvenc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cpu(_) => "libx265 (CPU)",
            Self::GpuHevc(_) => "HEVC NVENC (GPU)",
            Self::GpuAv1(_) => "AV1 NVENC (GPU)",
        }
    }

    pub fn requires_hardware(&self) -> bool {
        !matches!(self, Self::Cpu(_))
    }

    /// Validate every numeric field against its documented range.
    ///
    /// Returns all violations so the operator can fix the config in one go.
    pub fn validate(&self) -> Result<(), Vec<ProfileError>> {
        let mut errors = Vec::new();

        match self {
            Self::Cpu(p) => {
                check("libx265", "crf", p.crf, CPU_CRF_RANGE, &mut errors);
                check("libx265", "bframes", p.bframes, CPU_BFRAMES_RANGE, &mut errors);
                check("libx265", "lookahead", p.lookahead, CPU_LOOKAHEAD_RANGE, &mut errors);
            }
            Self::GpuHevc(p) => {
                check("hevc_nvenc", "cq", p.cq, HEVC_CQ_RANGE, &mut errors);
                check("hevc_nvenc", "bframes", p.bframes, HEVC_BFRAMES_RANGE, &mut errors);
                check(
                    "hevc_nvenc",
                    "lookahead",
                    p.lookahead,
                    NVENC_LOOKAHEAD_RANGE,
                    &mut errors,
                );
            }
            Self::GpuAv1(p) => {
                check("av1_nvenc", "cq", p.cq, AV1_CQ_RANGE, &mut errors);
                check(
                    "av1_nvenc",
                    "lookahead",
                    p.lookahead,
                    NVENC_LOOKAHEAD_RANGE,
                    &mut errors,
                );
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Profile that will actually drive the batch, plus how it was arrived at.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    pub profile: EncoderProfile,
    /// Set when a hardware profile was downgraded; names the encoder the
    /// operator asked for.
    pub fallback_from: Option<&'static str>,
}

/// Resolve the requested profile against detected hardware.
///
/// A hardware profile on a machine without its encoder is silently replaced
/// by the configured CPU profile, with a single warning event per resolution.
/// The CPU profile keeps its own CRF; CQ values are not remapped between
/// quality scales.
pub fn resolve_profile(
    requested: &EncoderProfile,
    cpu_fallback: &CpuParams,
    hardware: &HardwareAvailability,
    reporter: &Reporter,
) -> ResolvedProfile {
    let available = match requested {
        EncoderProfile::Cpu(_) => true,
        EncoderProfile::GpuHevc(_) => hardware.hevc_nvenc,
        EncoderProfile::GpuAv1(_) => hardware.av1_nvenc,
    };

    if available {
        return ResolvedProfile {
            profile: requested.clone(),
            fallback_from: None,
        };
    }

    let wanted = requested.encoder_name();
    reporter.emit(
        Level::Warning,
        format!(
            "{} not available on this machine, falling back to CPU encoder (libx265)",
            wanted
        ),
    );

    ResolvedProfile {
        profile: EncoderProfile::Cpu(cpu_fallback.clone()),
        fallback_from: Some(wanted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, Reporter};

    #[test]
    fn default_profiles_validate() {
        assert!(EncoderProfile::Cpu(CpuParams::default()).validate().is_ok());
        assert!(
            EncoderProfile::GpuHevc(HevcNvencParams::default())
                .validate()
                .is_ok()
        );
        assert!(
            EncoderProfile::GpuAv1(Av1NvencParams::default())
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn out_of_range_crf_is_rejected_not_clamped() {
        let profile = EncoderProfile::Cpu(CpuParams {
            crf: 52,
            ..CpuParams::default()
        });

        let errors = profile.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "crf");
        assert_eq!(errors[0].max, 51);
    }

    #[test]
    fn hevc_bframes_cap_is_tighter_than_cpu() {
        let cpu = EncoderProfile::Cpu(CpuParams {
            bframes: 10,
            ..CpuParams::default()
        });
        assert!(cpu.validate().is_ok());

        let hw = EncoderProfile::GpuHevc(HevcNvencParams {
            bframes: 10,
            ..HevcNvencParams::default()
        });
        let errors = hw.validate().unwrap_err();
        assert_eq!(errors[0].field, "bframes");
        assert_eq!(errors[0].max, 4);
    }

    #[test]
    fn all_violations_are_reported_together() {
        let profile = EncoderProfile::GpuHevc(HevcNvencParams {
            cq: 99,
            lookahead: 500,
            ..HevcNvencParams::default()
        });

        let errors = profile.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn hardware_profile_falls_back_to_cpu_with_one_warning() {
        let (reporter, rx) = Reporter::channel();
        let hardware = HardwareAvailability {
            hevc_nvenc: false,
            av1_nvenc: false,
        };
        let cpu = CpuParams {
            crf: 28,
            ..CpuParams::default()
        };

        let resolved = resolve_profile(
            &EncoderProfile::GpuHevc(HevcNvencParams::default()),
            &cpu,
            &hardware,
            &reporter,
        );

        assert_eq!(resolved.fallback_from, Some("hevc_nvenc"));
        match resolved.profile {
            EncoderProfile::Cpu(p) => assert_eq!(p.crf, 28),
            other => panic!("expected CPU fallback, got {:?}", other),
        }

        let warnings: Vec<_> = rx
            .try_iter()
            .filter(|e| matches!(e, Event::Log { level: Level::Warning, .. }))
            .collect();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn cpu_profile_never_falls_back() {
        let reporter = Reporter::sink();
        let hardware = HardwareAvailability {
            hevc_nvenc: false,
            av1_nvenc: false,
        };

        let resolved = resolve_profile(
            &EncoderProfile::Cpu(CpuParams::default()),
            &CpuParams::default(),
            &hardware,
            &reporter,
        );

        assert!(resolved.fallback_from.is_none());
    }

    #[test]
    fn available_hardware_keeps_requested_profile() {
        let reporter = Reporter::sink();
        let hardware = HardwareAvailability {
            hevc_nvenc: true,
            av1_nvenc: true,
        };
        let requested = EncoderProfile::GpuAv1(Av1NvencParams::default());

        let resolved = resolve_profile(&requested, &CpuParams::default(), &hardware, &reporter);

        assert_eq!(resolved.profile, requested);
        assert!(resolved.fallback_from.is_none());
    }
}

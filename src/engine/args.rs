//! Pure mapping from profiles and per-file adjustments to ffmpeg arguments.
//!
//! Everything here builds plain `Vec<String>` argument lists so the dry-run
//! subcommand and tests can inspect exact command lines without launching
//! anything.

use std::path::Path;

use crate::engine::item::Adjustments;
use crate::engine::profile::{EncoderProfile, ProfileError};

/// Which filters a batch run applies. Snapshotted from config at run start.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterToggles {
    pub scaling: bool,
    pub color: bool,
}

/// Format a filter parameter with an invariant decimal point.
///
/// ffmpeg's filter graph syntax would be corrupted by a comma decimal, and eq
/// values carry two decimals.
fn fmt2(value: f64) -> String {
    format!("{:.2}", value)
}

/// The brightness/contrast/saturation expression for one item.
pub fn color_filter(adjustments: &Adjustments) -> String {
    format!(
        "eq=brightness={}:contrast={}:saturation={}",
        fmt2(adjustments.brightness),
        fmt2(adjustments.contrast),
        fmt2(adjustments.saturation)
    )
}

/// The resolution filter for one item.
pub fn scale_filter(adjustments: &Adjustments) -> Vec<String> {
    vec![
        format!(
            "scale={}:{}:flags=lanczos",
            adjustments.output_width, adjustments.output_height
        ),
        "setdar=16/9".to_string(),
    ]
}

/// Build the ordered filter chain for an item.
///
/// The scale filter always precedes the color filter: the eq math is defined
/// on the post-scale pixel grid. Empty when both toggles are off.
pub fn build_filter_chain(adjustments: &Adjustments, toggles: FilterToggles) -> Vec<String> {
    let mut filters = Vec::new();

    if toggles.scaling {
        filters.extend(scale_filter(adjustments));
    }

    if toggles.color {
        filters.push(color_filter(adjustments));
    }

    filters
}

/// Build the codec argument list for a validated profile.
///
/// Range violations are rejected here, before any process is launched.
pub fn build_codec_args(profile: &EncoderProfile) -> Result<Vec<String>, Vec<ProfileError>> {
    profile.validate()?;

    let mut args: Vec<String> = Vec::new();
    let mut push = |parts: &[&str]| {
        args.extend(parts.iter().map(|s| s.to_string()));
    };

    match profile {
        EncoderProfile::Cpu(p) => {
            push(&["-c:v", "libx265"]);
            push(&["-preset", &p.preset]);
            if !p.tune.is_empty() {
                push(&["-tune", &p.tune]);
            }
            push(&["-crf", &p.crf.to_string()]);
            push(&["-bf", &p.bframes.to_string()]);
            push(&["-x265-params", &format!("rc-lookahead={}", p.lookahead)]);
            let pix_fmt = if p.bit_depth >= 10 { "yuv420p10le" } else { "yuv420p" };
            push(&["-pix_fmt", pix_fmt]);
        }
        EncoderProfile::GpuHevc(p) => {
            push(&["-c:v", "hevc_nvenc"]);
            push(&["-preset", &p.preset]);
            push(&["-tune", "hq"]);
            push(&["-rc", &p.rate_control]);
            push(&["-cq", &p.cq.to_string()]);
            if p.spatial_aq {
                push(&["-spatial-aq", "1"]);
            }
            if p.temporal_aq {
                push(&["-temporal-aq", "1"]);
            }
            push(&["-bf", &p.bframes.to_string()]);
            push(&["-rc-lookahead", &p.lookahead.to_string()]);
            push(&["-multipass", &p.multipass]);
            let pix_fmt = if p.bit_depth >= 10 { "p010le" } else { "yuv420p" };
            push(&["-pix_fmt", pix_fmt]);
        }
        EncoderProfile::GpuAv1(p) => {
            push(&["-c:v", "av1_nvenc"]);
            push(&["-preset", &p.preset]);
            push(&["-rc", &p.rate_control]);
            push(&["-cq", &p.cq.to_string()]);
            push(&["-multipass", &p.multipass]);
            push(&["-rc-lookahead", &p.lookahead.to_string()]);
        }
    }

    Ok(args)
}

/// Assemble the full encode invocation: `-y -i IN [-vf CHAIN] CODEC OUT`.
///
/// `extra_args` is a user-provided string split shell-style so quoted values
/// survive; unbalanced quotes fall back to whitespace splitting.
pub fn build_encode_args(
    input: &Path,
    output: &Path,
    filters: &[String],
    codec_args: &[String],
    extra_args: &str,
) -> Vec<String> {
    let mut args = vec!["-y".to_string(), "-i".to_string(), input.display().to_string()];

    if !filters.is_empty() {
        args.push("-vf".to_string());
        args.push(filters.join(","));
    }

    args.extend(codec_args.iter().cloned());

    if !extra_args.is_empty() {
        match shlex::split(extra_args) {
            Some(extra) => args.extend(extra),
            None => args.extend(extra_args.split_whitespace().map(str::to_string)),
        }
    }

    args.push(output.display().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::profile::{Av1NvencParams, CpuParams, HevcNvencParams};
    use std::path::PathBuf;

    fn adjustments() -> Adjustments {
        Adjustments {
            brightness: -0.05,
            contrast: 1.0,
            saturation: 1.2,
            output_width: 1920,
            output_height: 1080,
        }
    }

    #[test]
    fn color_filter_uses_two_decimals_and_a_dot() {
        let filter = color_filter(&adjustments());
        assert_eq!(filter, "eq=brightness=-0.05:contrast=1.00:saturation=1.20");
    }

    #[test]
    fn scale_always_precedes_color() {
        let chain = build_filter_chain(
            &adjustments(),
            FilterToggles {
                scaling: true,
                color: true,
            },
        );

        let scale_pos = chain.iter().position(|f| f.starts_with("scale=")).unwrap();
        let color_pos = chain.iter().position(|f| f.starts_with("eq=")).unwrap();
        assert!(scale_pos < color_pos);
        assert_eq!(chain[scale_pos + 1], "setdar=16/9");
    }

    #[test]
    fn disabled_toggles_emit_no_filters() {
        let chain = build_filter_chain(&adjustments(), FilterToggles::default());
        assert!(chain.is_empty());

        let args = build_encode_args(
            &PathBuf::from("in.mp4"),
            &PathBuf::from("out.mp4"),
            &chain,
            &[],
            "",
        );
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn cpu_args_carry_every_knob() {
        let profile = EncoderProfile::Cpu(CpuParams {
            crf: 20,
            preset: "slow".to_string(),
            tune: "grain".to_string(),
            bframes: 8,
            lookahead: 60,
            bit_depth: 10,
        });

        let args = build_codec_args(&profile).unwrap();
        let joined = args.join(" ");
        assert_eq!(
            joined,
            "-c:v libx265 -preset slow -tune grain -crf 20 -bf 8 \
             -x265-params rc-lookahead=60 -pix_fmt yuv420p10le"
        );
    }

    #[test]
    fn empty_tune_is_omitted() {
        let args = build_codec_args(&EncoderProfile::Cpu(CpuParams::default())).unwrap();
        assert!(!args.contains(&"-tune".to_string()));
    }

    #[test]
    fn hevc_nvenc_aq_flags_follow_toggles() {
        let profile = EncoderProfile::GpuHevc(HevcNvencParams {
            spatial_aq: false,
            temporal_aq: true,
            ..HevcNvencParams::default()
        });

        let args = build_codec_args(&profile).unwrap();
        assert!(!args.contains(&"-spatial-aq".to_string()));
        assert!(args.contains(&"-temporal-aq".to_string()));
    }

    #[test]
    fn av1_args_have_no_pix_fmt_override() {
        let args = build_codec_args(&EncoderProfile::GpuAv1(Av1NvencParams::default())).unwrap();
        assert!(!args.contains(&"-pix_fmt".to_string()));
        assert_eq!(args[1], "av1_nvenc");
    }

    #[test]
    fn out_of_range_profile_never_reaches_args() {
        let profile = EncoderProfile::GpuAv1(Av1NvencParams {
            cq: 64,
            ..Av1NvencParams::default()
        });
        assert!(build_codec_args(&profile).is_err());
    }

    #[test]
    fn extra_args_respect_quotes() {
        let args = build_encode_args(
            &PathBuf::from("in.mp4"),
            &PathBuf::from("out.mp4"),
            &[],
            &[],
            "-metadata title=\"My Clip\"",
        );

        assert!(args.contains(&"title=My Clip".to_string()));
    }
}

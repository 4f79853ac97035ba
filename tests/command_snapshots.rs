use insta::assert_snapshot;
use std::path::PathBuf;

use vidforge::engine::item::Adjustments;
use vidforge::engine::profile::{Av1NvencParams, CpuParams, EncoderProfile, HevcNvencParams};
use vidforge::engine::{FilterToggles, build_codec_args, build_encode_args, build_filter_chain};

fn render(profile: &EncoderProfile, toggles: FilterToggles, extra: &str) -> String {
    let adjustments = Adjustments::default();
    let filters = build_filter_chain(&adjustments, toggles);
    let codec = build_codec_args(profile).expect("valid profile");
    let args = build_encode_args(
        &PathBuf::from("/videos/clip.mp4"),
        &PathBuf::from("/out/clip.mp4"),
        &filters,
        &codec,
        extra,
    );
    args.join(" ")
}

const BOTH: FilterToggles = FilterToggles {
    scaling: true,
    color: true,
};

#[test]
fn snapshot_cpu_command() {
    let profile = EncoderProfile::Cpu(CpuParams::default());
    assert_snapshot!(
        render(&profile, BOTH, ""),
        @"-y -i /videos/clip.mp4 -vf scale=1920:1080:flags=lanczos,setdar=16/9,eq=brightness=0.00:contrast=1.00:saturation=1.20 -c:v libx265 -preset medium -crf 23 -bf 4 -x265-params rc-lookahead=20 -pix_fmt yuv420p /out/clip.mp4"
    );
}

#[test]
fn snapshot_hevc_nvenc_command() {
    let profile = EncoderProfile::GpuHevc(HevcNvencParams::default());
    assert_snapshot!(
        render(&profile, BOTH, ""),
        @"-y -i /videos/clip.mp4 -vf scale=1920:1080:flags=lanczos,setdar=16/9,eq=brightness=0.00:contrast=1.00:saturation=1.20 -c:v hevc_nvenc -preset p5 -tune hq -rc constqp -cq 21 -spatial-aq 1 -temporal-aq 1 -bf 3 -rc-lookahead 32 -multipass disabled -pix_fmt yuv420p /out/clip.mp4"
    );
}

#[test]
fn snapshot_av1_nvenc_command() {
    let profile = EncoderProfile::GpuAv1(Av1NvencParams::default());
    assert_snapshot!(
        render(&profile, BOTH, ""),
        @"-y -i /videos/clip.mp4 -vf scale=1920:1080:flags=lanczos,setdar=16/9,eq=brightness=0.00:contrast=1.00:saturation=1.20 -c:v av1_nvenc -preset p5 -rc constqp -cq 21 -multipass disabled -rc-lookahead 32 /out/clip.mp4"
    );
}

#[test]
fn snapshot_color_only_command() {
    let profile = EncoderProfile::Cpu(CpuParams::default());
    let toggles = FilterToggles {
        scaling: false,
        color: true,
    };
    assert_snapshot!(
        render(&profile, toggles, ""),
        @"-y -i /videos/clip.mp4 -vf eq=brightness=0.00:contrast=1.00:saturation=1.20 -c:v libx265 -preset medium -crf 23 -bf 4 -x265-params rc-lookahead=20 -pix_fmt yuv420p /out/clip.mp4"
    );
}

#[test]
fn snapshot_unfiltered_command_with_extra_args() {
    let profile = EncoderProfile::Cpu(CpuParams::default());
    assert_snapshot!(
        render(&profile, FilterToggles::default(), "-movflags +faststart"),
        @"-y -i /videos/clip.mp4 -c:v libx265 -preset medium -crf 23 -bf 4 -x265-params rc-lookahead=20 -pix_fmt yuv420p -movflags +faststart /out/clip.mp4"
    );
}

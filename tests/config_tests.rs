// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration resolution

use camstream::constants::{defaults, env};
use camstream::{AppError, DeviceProfile, EnvOverrides, resolve};

fn all_profiles() -> Vec<DeviceProfile> {
    let mut profiles = Vec::new();
    for h264 in [false, true] {
        profiles.push(DeviceProfile {
            has_v4l2_device: true,
            supports_hardware_h264: h264,
            has_audio_capture: true,
            video_device: Some("/dev/video0".into()),
            ..Default::default()
        });
    }
    for (audio, h264) in [(false, false), (true, false), (true, true)] {
        profiles.push(DeviceProfile {
            has_native_camera: true,
            supports_hardware_h264: h264,
            has_audio_capture: audio,
            detected_audio_sample_rate: audio.then_some(defaults::NATIVE_AUDIO_SAMPLE_RATE),
            ..Default::default()
        });
    }
    profiles
}

#[test]
fn test_disable_audio_overrides_every_profile() {
    let overrides = EnvOverrides::from_pairs([(env::DISABLE_AUDIO, "1")]);
    for profile in all_profiles() {
        let config = resolve(&profile, &overrides).unwrap();
        assert!(!config.audio_enabled, "{:?}", profile);
    }
}

#[test]
fn test_empty_overrides_resolve_for_every_profile() {
    let overrides = EnvOverrides::default();
    assert!(overrides.is_empty());
    for profile in all_profiles() {
        let config = resolve(&profile, &overrides).unwrap();
        assert_eq!(config.audio_enabled, profile.has_audio_capture);
        assert_eq!(
            config.use_hardware_encoder,
            profile.has_native_camera || !profile.supports_hardware_h264
        );
    }
}

#[test]
fn test_camera_module_always_uses_hardware_encoder() {
    for profile in all_profiles().into_iter().filter(|p| p.has_native_camera) {
        let config = resolve(&profile, &EnvOverrides::default()).unwrap();
        assert!(config.use_hardware_encoder, "{:?}", profile);
    }
}

#[test]
fn test_empty_stream_url_is_fatal() {
    let overrides = EnvOverrides::from_pairs([(env::STREAM_URL, "")]);
    let err = resolve(&all_profiles()[0], &overrides).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert_ne!(err.exit_code(), 0);
}

#[test]
fn test_unparsable_numbers_never_abort() {
    let overrides = EnvOverrides::from_pairs([
        (env::AUDIO_BITRATE, "lots"),
        (env::AUDIO_SAMPLE_RATE, "-1"),
        (env::VIDEO_WIDTH, "1280px"),
    ]);
    for profile in all_profiles() {
        let config = resolve(&profile, &overrides).unwrap();
        assert_eq!(config.audio_bitrate, defaults::AUDIO_BITRATE);
        assert_eq!(config.video_width, defaults::VIDEO_WIDTH);
        let expected_rate = profile
            .detected_audio_sample_rate
            .unwrap_or(defaults::AUDIO_SAMPLE_RATE);
        assert_eq!(config.audio_sample_rate, expected_rate);
    }
}

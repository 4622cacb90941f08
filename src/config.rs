// SPDX-License-Identifier: GPL-3.0-only

//! Stream configuration
//!
//! [`resolve`] merges the detected [`DeviceProfile`] with environment
//! overrides. Each field is resolved on its own: an override wins, otherwise
//! the profile or a default from [`crate::constants::defaults`] applies.

use crate::backends::DeviceProfile;
use crate::constants::{defaults, devices, env};
use crate::errors::{AppError, AppResult};
use crate::pipelines::graph::{ElementDescriptor, parse_properties};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// String overrides taken from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    values: HashMap<String, String>,
}

impl EnvOverrides {
    /// Read every known variable from the process environment
    pub fn from_env() -> Self {
        let mut values = HashMap::new();
        for name in env::ALL {
            match std::env::var(name) {
                Ok(value) => {
                    values.insert(name.to_string(), value);
                }
                Err(std::env::VarError::NotUnicode(_)) => {
                    warn!(variable = name, "Ignoring non UTF-8 environment value");
                }
                Err(std::env::VarError::NotPresent) => {}
            }
        }
        Self { values }
    }

    /// Build overrides from explicit key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw override value, if set
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether no override is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn string_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    /// Element descriptor override; blank values fall back to the default
    fn descriptor_or(&self, name: &str, default: String) -> String {
        match self.get(name) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            Some(_) => {
                warn!(variable = name, default = %default, "Empty element descriptor, using default");
                default
            }
            None => default,
        }
    }

    /// Positive integer override; unparsable values fall back to the default
    fn number_or(&self, name: &str, default: u32) -> u32 {
        let Some(raw) = self.get(name) else {
            return default;
        };
        match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(variable = name, value = %raw, default, "Invalid number, using default");
                default
            }
        }
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(is_truthy)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Final, immutable stream settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamConfig {
    pub stream_url: String,
    pub stream_key: String,
    pub audio_enabled: bool,
    pub audio_source: String,
    /// AAC bitrate in bits per second
    pub audio_bitrate: u32,
    pub audio_sample_rate: u32,
    pub video_source: String,
    pub video_width: u32,
    pub video_height: u32,
    pub video_framerate: u32,
    pub use_hardware_encoder: bool,
    /// Hardware H.264 encoder element factory
    pub h264_encoder: String,
    pub encoder_params: String,
    pub parser_params: String,
}

impl StreamConfig {
    /// Sink destination: `<url>/<key>`, concatenated as given
    pub fn destination(&self) -> String {
        format!("{}/{}", self.stream_url, self.stream_key)
    }
}

/// Merge a device profile with environment overrides.
///
/// Only an empty stream URL is fatal. Everything else falls back to a
/// default when the override is missing or malformed.
pub fn resolve(profile: &DeviceProfile, overrides: &EnvOverrides) -> AppResult<StreamConfig> {
    let stream_url = overrides.string_or(env::STREAM_URL, defaults::STREAM_URL);
    let stream_url = stream_url.trim().to_string();
    if stream_url.is_empty() {
        return Err(AppError::Config(format!(
            "{} resolves to an empty stream URL",
            env::STREAM_URL
        )));
    }

    let audio_disabled = overrides.flag(env::DISABLE_AUDIO);
    if audio_disabled {
        debug!("Audio disabled by {}", env::DISABLE_AUDIO);
    }
    let audio_enabled = profile.has_audio_capture && !audio_disabled;

    let default_video_source = if profile.has_v4l2_device {
        format!(
            "{} device={}",
            defaults::V4L2_VIDEO_SOURCE,
            profile
                .video_device
                .as_deref()
                .unwrap_or(devices::DEFAULT_V4L2_DEVICE)
        )
    } else {
        defaults::NATIVE_VIDEO_SOURCE.to_string()
    };

    let config = StreamConfig {
        stream_url,
        stream_key: overrides.string_or(env::STREAM_KEY, defaults::STREAM_KEY),
        audio_enabled,
        audio_source: overrides
            .descriptor_or(env::AUDIO_SOURCE, defaults::AUDIO_SOURCE.to_string()),
        audio_bitrate: overrides.number_or(env::AUDIO_BITRATE, defaults::AUDIO_BITRATE),
        audio_sample_rate: overrides.number_or(
            env::AUDIO_SAMPLE_RATE,
            profile
                .detected_audio_sample_rate
                .unwrap_or(defaults::AUDIO_SAMPLE_RATE),
        ),
        video_source: overrides.descriptor_or(env::VIDEO_SOURCE, default_video_source),
        video_width: overrides.number_or(env::VIDEO_WIDTH, defaults::VIDEO_WIDTH),
        video_height: overrides.number_or(env::VIDEO_HEIGHT, defaults::VIDEO_HEIGHT),
        video_framerate: overrides.number_or(env::VIDEO_FRAMERATE, defaults::VIDEO_FRAMERATE),
        // Camera modules emit raw frames whatever the profile claims
        use_hardware_encoder: profile.has_native_camera || !profile.supports_hardware_h264,
        h264_encoder: overrides
            .descriptor_or(env::H264_ENCODER, defaults::H264_ENCODER.to_string()),
        encoder_params: overrides.string_or(env::H264_ENCODER_PARAMS, ""),
        parser_params: overrides.string_or(env::H264_PARSER_PARAMS, ""),
    };

    warn_stray_tokens(env::AUDIO_SOURCE, &ElementDescriptor::parse(&config.audio_source).1);
    warn_stray_tokens(env::VIDEO_SOURCE, &ElementDescriptor::parse(&config.video_source).1);
    warn_stray_tokens(env::H264_ENCODER_PARAMS, &parse_properties(&config.encoder_params).1);
    warn_stray_tokens(env::H264_PARSER_PARAMS, &parse_properties(&config.parser_params).1);

    debug!(?config, "Resolved stream configuration");
    Ok(config)
}

fn warn_stray_tokens(variable: &str, dropped: &[String]) {
    if !dropped.is_empty() {
        warn!(variable, ?dropped, "Ignoring name= and tokens that are not key=value pairs");
    }
}

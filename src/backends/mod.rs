// SPDX-License-Identifier: MPL-2.0

//! Capability detection for the local capture hardware
//!
//! The detector answers four questions before anything is built:
//!
//! ```text
//! generic node present? ──yes──▶ webcam: V4L2 source, audio assumed,
//!        │                        H.264 encoder only if the webcam
//!        │                        cannot emit H.264 itself
//!        no
//!        ▼
//! camera module: vendor source, hardware encoder always,
//! audio only if ALSA registers a capture device
//! ```
//!
//! Every probe is read-only. A probe that fails resolves to the most
//! conservative answer instead of an error.
//!
//! # Modules
//!
//! - [`audio`]: ALSA device registry parsing
//! - [`camera`]: V4L2 node probes

pub mod audio;
pub mod camera;

use crate::constants::{defaults, devices};
use crate::errors::ProbeFailure;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the capture hardware can do natively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    /// A camera module without a generic V4L2 node is assumed
    pub has_native_camera: bool,
    /// A generic V4L2 capture node exists
    pub has_v4l2_device: bool,
    /// The capture device emits H.264 itself, no encoder stage needed
    pub supports_hardware_h264: bool,
    /// Audio can be captured alongside video
    pub has_audio_capture: bool,
    /// Sample rate suited to the detected audio hardware, if known
    pub detected_audio_sample_rate: Option<u32>,
    /// Path of the generic capture node, when one was found
    pub video_device: Option<String>,
}

/// Read-only probes of the host device environment
pub trait DeviceProbe {
    /// Stat-based existence check (dangling links are missing)
    fn path_exists(&self, path: &Path) -> bool;

    /// FourCC codes advertised by a capture node
    fn video_formats(&self, device: &Path) -> Result<Vec<String>, ProbeFailure>;

    /// Raw contents of the system audio device registry
    fn audio_registry(&self) -> Result<String, ProbeFailure>;
}

/// Probes backed by the real filesystem, V4L2 and ALSA
#[derive(Debug, Clone)]
pub struct SystemProbe {
    asound_devices: PathBuf,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            asound_devices: PathBuf::from(devices::ASOUND_DEVICES),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProbe for SystemProbe {
    fn path_exists(&self, path: &Path) -> bool {
        camera::device_exists(path)
    }

    fn video_formats(&self, device: &Path) -> Result<Vec<String>, ProbeFailure> {
        if let Some((card, driver)) = camera::v4l2_utils::describe_device(device) {
            debug!(device = %device.display(), card = %card, driver = %driver, "Querying webcam formats");
        }
        camera::list_formats(device)
    }

    fn audio_registry(&self) -> Result<String, ProbeFailure> {
        audio::read_registry(&self.asound_devices)
    }
}

/// Detect the capabilities of the local capture hardware.
///
/// Never fails: a probe error is treated as "capability absent".
pub fn detect(probe: &impl DeviceProbe, video_device: &Path) -> DeviceProfile {
    if probe.path_exists(video_device) {
        info!(device = %video_device.display(), "Detected webcam");
        // Webcams are assumed to carry a microphone; AV_DISABLE_AUDIO opts out
        info!("Assuming webcam has audio");

        let supports_hardware_h264 = match probe.video_formats(video_device) {
            Ok(formats) => {
                debug!(?formats, "Webcam formats");
                camera::supports_h264(&formats)
            }
            Err(e) => {
                debug!(error = %e, "Format query failed, assuming no native H.264");
                false
            }
        };

        if supports_hardware_h264 {
            info!("Webcam supports H.264");
        } else {
            info!("Webcam does not support H.264, hardware encoding required");
        }

        DeviceProfile {
            has_native_camera: false,
            has_v4l2_device: true,
            supports_hardware_h264,
            has_audio_capture: true,
            detected_audio_sample_rate: None,
            video_device: Some(video_device.to_string_lossy().to_string()),
        }
    } else {
        info!("No generic capture node, defaulting to camera module");

        let has_audio_capture = match probe.audio_registry() {
            Ok(registry) => audio::has_capture_device(&registry),
            Err(e) => {
                debug!(error = %e, "Audio registry unreadable, assuming no capture");
                false
            }
        };

        if has_audio_capture {
            info!("Audio capture available");
        } else {
            info!("No audio capture available");
        }

        DeviceProfile {
            has_native_camera: true,
            has_v4l2_device: false,
            supports_hardware_h264: false,
            has_audio_capture,
            detected_audio_sample_rate: has_audio_capture
                .then_some(defaults::NATIVE_AUDIO_SAMPLE_RATE),
            video_device: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Scripted probe answers
    #[derive(Debug, Clone, Default)]
    pub struct FakeProbe {
        pub node_present: bool,
        pub formats: Option<Vec<String>>,
        pub registry: Option<String>,
    }

    impl DeviceProbe for FakeProbe {
        fn path_exists(&self, _path: &Path) -> bool {
            self.node_present
        }

        fn video_formats(&self, _device: &Path) -> Result<Vec<String>, ProbeFailure> {
            self.formats
                .clone()
                .ok_or_else(|| ProbeFailure::Command("v4l2-ctl: not found".into()))
        }

        fn audio_registry(&self) -> Result<String, ProbeFailure> {
            self.registry
                .clone()
                .ok_or_else(|| ProbeFailure::Io("No such file or directory".into()))
        }
    }
}

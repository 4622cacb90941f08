// SPDX-License-Identifier: GPL-3.0-only

//! Shared V4L2 utility functions
//!
//! Read-only probes of a generic capture node: existence, identity and the
//! list of pixel formats it can emit.

use crate::constants::devices;
use crate::errors::ProbeFailure;
use std::path::Path;
use std::process::Command;
use tracing::debug;
use v4l::prelude::*;
use v4l::video::Capture;

/// Test whether a device path exists.
///
/// Uses `stat` semantics, so a dangling symbolic link counts as missing.
pub fn device_exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}

/// Get the card name and driver of a V4L2 device for logging
pub fn describe_device(path: &Path) -> Option<(String, String)> {
    let dev = Device::with_path(path).ok()?;
    let caps = dev.query_caps().ok()?;
    Some((caps.card, caps.driver))
}

/// List the FourCC codes a capture device advertises.
///
/// Tries the V4L2 ioctl interface first and falls back to `v4l2-ctl
/// --list-formats` when the device cannot be opened that way.
pub fn list_formats(path: &Path) -> Result<Vec<String>, ProbeFailure> {
    match list_formats_ioctl(path) {
        Ok(formats) if !formats.is_empty() => Ok(formats),
        Ok(_) => list_formats_v4l2_ctl(path),
        Err(e) => {
            debug!(device = %path.display(), error = %e, "V4L2 format ioctl failed, trying v4l2-ctl");
            list_formats_v4l2_ctl(path)
        }
    }
}

fn list_formats_ioctl(path: &Path) -> Result<Vec<String>, ProbeFailure> {
    let dev = Device::with_path(path)?;
    let formats = dev
        .enum_formats()?
        .into_iter()
        .map(|desc| desc.fourcc.to_string())
        .collect();
    Ok(formats)
}

fn list_formats_v4l2_ctl(path: &Path) -> Result<Vec<String>, ProbeFailure> {
    let output = Command::new(devices::V4L2_CTL)
        .arg("--device")
        .arg(path)
        .arg("--list-formats")
        .output()
        .map_err(|e| ProbeFailure::Command(format!("{}: {}", devices::V4L2_CTL, e)))?;

    if !output.status.success() {
        return Err(ProbeFailure::Command(format!(
            "{} exited with {}",
            devices::V4L2_CTL,
            output.status
        )));
    }

    Ok(parse_v4l2_ctl_formats(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Extract FourCC codes from `v4l2-ctl --list-formats` output.
///
/// Format lines look like `[0]: 'YUYV' (YUYV 4:2:2)`.
pub fn parse_v4l2_ctl_formats(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let start = line.find('\'')?;
            let rest = &line[start + 1..];
            let end = rest.find('\'')?;
            let fourcc = rest[..end].trim();
            (!fourcc.is_empty()).then(|| fourcc.to_string())
        })
        .collect()
}

/// Check whether a format list contains native H.264 output
pub fn supports_h264(formats: &[String]) -> bool {
    formats
        .iter()
        .any(|f| f.trim().eq_ignore_ascii_case(devices::H264_FOURCC))
}

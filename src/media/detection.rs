// SPDX-License-Identifier: MPL-2.0

//! GStreamer element detection
//!
//! Checks that every element factory a pipeline names is installed before
//! the description is handed to the parser, so a missing plugin is reported
//! by name instead of as a parse failure.

use crate::constants::elements;
use gstreamer as gst;
use tracing::{debug, info};

/// Check if a specific GStreamer element factory is registered
pub fn is_element_available(element_name: &str) -> bool {
    gst::ElementFactory::find(element_name).is_some()
}

/// Return the factories from `factories` that are not installed
pub fn missing_elements<'a>(factories: &[&'a str]) -> Vec<&'a str> {
    factories
        .iter()
        .copied()
        .filter(|factory| !is_element_available(factory))
        .collect()
}

/// Detect the hardware H.264 encoders installed on this host
pub fn detect_h264_encoders() -> Vec<&'static str> {
    let available: Vec<&'static str> = elements::HARDWARE_H264_ENCODERS
        .iter()
        .copied()
        .filter(|encoder| {
            let found = is_element_available(encoder);
            if found {
                debug!("H.264 encoder available: {}", encoder);
            }
            found
        })
        .collect();

    info!("Detected {} hardware H.264 encoders", available.len());
    available
}

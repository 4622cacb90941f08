// SPDX-License-Identifier: MPL-2.0

//! Audio capture discovery via the ALSA device registry

use crate::constants::devices;
use crate::errors::ProbeFailure;
use std::path::Path;
use tracing::debug;

/// One entry of `/proc/asound/devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlsaDevice {
    /// Minor number
    pub minor: u32,
    /// Card index, absent for global devices such as the sequencer
    pub card: Option<u32>,
    /// Device index on the card
    pub device: Option<u32>,
    /// Free-form description, e.g. "digital audio capture"
    pub description: String,
}

impl AlsaDevice {
    /// Whether this registry entry is a capture endpoint
    pub fn is_capture(&self) -> bool {
        self.description.contains(devices::CAPTURE_MARKER)
    }
}

/// Read the raw ALSA device registry
pub fn read_registry(path: &Path) -> Result<String, ProbeFailure> {
    Ok(std::fs::read_to_string(path)?)
}

/// Parse the ALSA device registry.
///
/// Lines look like ` 16: [ 1- 0]: digital audio capture` or
/// ` 33:        : timer`. Unparsable lines are skipped.
pub fn parse_registry(contents: &str) -> Vec<AlsaDevice> {
    contents.lines().filter_map(parse_registry_line).collect()
}

fn parse_registry_line(line: &str) -> Option<AlsaDevice> {
    let (minor, rest) = line.split_once(':')?;
    let minor = minor.trim().parse().ok()?;
    let (slot, description) = rest.split_once(':')?;

    let (card, device) = match slot.trim().strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => {
            let mut parts = inner.splitn(2, '-');
            let card = parts.next().and_then(|c| c.trim().parse().ok());
            let device = parts.next().and_then(|d| d.trim().parse().ok());
            (card, device)
        }
        None => (None, None),
    };

    Some(AlsaDevice {
        minor,
        card,
        device,
        description: description.trim().to_string(),
    })
}

/// Check a registry dump for at least one capture-capable device
pub fn has_capture_device(contents: &str) -> bool {
    let entries = parse_registry(contents);
    for entry in entries.iter().filter(|e| e.is_capture()) {
        debug!(
            card = ?entry.card,
            device = ?entry.device,
            description = %entry.description,
            "Found audio capture device"
        );
    }

    // Fall back to a plain substring test for registry layouts we do not parse
    entries.iter().any(AlsaDevice::is_capture) || contents.contains(devices::CAPTURE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY_WITH_CAPTURE: &str = "  0: [ 0]   : control\n \
         16: [ 0- 0]: digital audio playback\n \
         32: [ 1]   : control\n \
         56: [ 1- 0]: digital audio capture\n \
         33:        : timer\n";

    const REGISTRY_PLAYBACK_ONLY: &str = "  0: [ 0]   : control\n \
         16: [ 0- 0]: digital audio playback\n \
         33:        : timer\n";

    #[test]
    fn test_parse_registry() {
        let entries = parse_registry(REGISTRY_WITH_CAPTURE);
        assert_eq!(entries.len(), 5);

        let capture = entries.iter().find(|e| e.is_capture()).unwrap();
        assert_eq!(capture.minor, 56);
        assert_eq!(capture.card, Some(1));
        assert_eq!(capture.device, Some(0));

        let timer = entries.iter().find(|e| e.minor == 33).unwrap();
        assert_eq!(timer.card, None);
        assert_eq!(timer.description, "timer");
    }

    #[test]
    fn test_has_capture_device() {
        assert!(has_capture_device(REGISTRY_WITH_CAPTURE));
        assert!(!has_capture_device(REGISTRY_PLAYBACK_ONLY));
        assert!(!has_capture_device(""));
    }
}

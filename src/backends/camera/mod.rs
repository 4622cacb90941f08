// SPDX-License-Identifier: GPL-3.0-only

//! Camera probes
//!
//! Generic V4L2 webcams are inspected through [`v4l2_utils`]. Camera modules
//! driven by a vendor source element have no generic node and are assumed
//! present when no V4L2 node exists.

pub mod v4l2_utils;

pub use v4l2_utils::{device_exists, list_formats, supports_h264};

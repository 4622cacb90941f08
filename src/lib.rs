// SPDX-License-Identifier: MPL-2.0

//! camstream - stream a local camera to an RTMP endpoint
//!
//! The crate detects what the capture hardware can do, resolves a stream
//! configuration from that profile and environment overrides, builds a
//! GStreamer pipeline graph to match, and supervises it until the stream
//! ends.
//!
//! # Architecture
//!
//! - [`backends`]: capability detection (V4L2 node, H.264 output, ALSA capture)
//! - [`config`]: environment overrides and the resolved [`StreamConfig`]
//! - [`pipelines`]: graph building and the pipeline controller
//! - [`media`]: the GStreamer execution runtime
//!
//! # Example
//!
//! ```ignore
//! let profile = camstream::detect(&SystemProbe::new(), Path::new("/dev/video0"));
//! let config = camstream::resolve(&profile, &EnvOverrides::from_env())?;
//! let graph = camstream::build(&config);
//! let outcome = PipelineController::new(GstRuntime::new()?).run(&graph);
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;

// Re-export commonly used types
pub use backends::{DeviceProbe, DeviceProfile, SystemProbe, detect};
pub use config::{EnvOverrides, StreamConfig, resolve};
pub use errors::{AppError, AppResult};
pub use pipelines::{PipelineController, PipelineGraph, RunState, SessionOutcome, build};

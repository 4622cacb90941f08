// SPDX-License-Identifier: MPL-2.0

//! GStreamer integration
//!
//! # Modules
//!
//! - [`detection`]: element factory availability checks
//! - [`runtime`]: [`GstRuntime`], the execution runtime used in production

pub mod detection;
pub mod runtime;

pub use runtime::GstRuntime;

// SPDX-License-Identifier: MPL-2.0

//! Pipeline construction and lifecycle
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ StreamConfig │ ──▶ │  Pipeline Builder │ ──▶ │  PipelineGraph   │
//! └──────────────┘     └───────────────────┘     └────────┬─────────┘
//!                                                         │
//!                      ┌───────────────────┐     ┌────────▼─────────┐
//!                      │ ExecutionRuntime  │ ◀── │    Controller    │
//!                      │   (GStreamer)     │ ──▶ │ Idle → Playing → │
//!                      └───────────────────┘ bus │ Stopped / Failed │
//!                                                └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`graph`]: typed stage list and launch-syntax serialization
//! - [`builder`]: stage selection from a stream configuration
//! - [`controller`]: run state machine and event supervision
//! - [`runtime`]: the runtime trait and its event type

pub mod builder;
pub mod controller;
pub mod graph;
pub mod runtime;

pub use builder::build;
pub use controller::{PipelineController, RunState, SessionOutcome};
pub use graph::{Branch, PipelineGraph, Stage, StageElement, StageKind};
pub use runtime::{ExecutionRuntime, RuntimeEvent};

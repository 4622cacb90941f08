// SPDX-License-Identifier: MPL-2.0

//! GStreamer execution runtime
//!
//! The graph is serialized to launch syntax here and nowhere else. Runtime
//! events are read with a blocking pop on the pipeline bus; a Ctrl+C/SIGTERM
//! handler posts an application message on the same bus so signals arrive through
//! the one channel the controller waits on.

use super::detection::{detect_h264_encoders, missing_elements};
use crate::constants::{INTERRUPT_MESSAGE, timing};
use crate::errors::{AppError, AppResult};
use crate::pipelines::graph::PipelineGraph;
use crate::pipelines::runtime::{ExecutionRuntime, RuntimeEvent};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, error, info, warn};

/// [`ExecutionRuntime`] backed by a `gst::Pipeline`
pub struct GstRuntime {
    pipeline: Option<gst::Pipeline>,
    bus: Option<gst::Bus>,
}

impl GstRuntime {
    /// Initialize GStreamer
    pub fn new() -> AppResult<Self> {
        gst::init().map_err(|e| {
            AppError::GraphConstruction(format!("GStreamer init failed: {}", e))
        })?;
        debug!(version = %gst::version_string(), "GStreamer initialized");
        Ok(Self {
            pipeline: None,
            bus: None,
        })
    }

    fn check_factories(graph: &PipelineGraph) -> AppResult<()> {
        let missing = missing_elements(&graph.factories());
        if missing.is_empty() {
            return Ok(());
        }

        error!(?missing, "GStreamer elements not installed");
        let encoders = detect_h264_encoders();
        if !encoders.is_empty() {
            info!(?encoders, "Installed hardware H.264 encoders (select one with AV_H264_ENCODER)");
        }
        Err(AppError::GraphConstruction(format!(
            "missing GStreamer elements: {}",
            missing.join(", ")
        )))
    }

    fn install_signal_handler(bus: &gst::Bus) {
        let bus = bus.clone();
        let result = ctrlc::set_handler(move || {
            let msg = gst::message::Application::new(gst::Structure::new_empty(INTERRUPT_MESSAGE));
            if bus.post(msg).is_err() {
                // Bus already flushed: the pipeline is going down anyway
                warn!("Interrupt received after shutdown");
            }
        });
        if let Err(e) = result {
            warn!(error = %e, "Could not install termination signal handler");
        }
    }
}

impl ExecutionRuntime for GstRuntime {
    fn launch(&mut self, graph: &PipelineGraph) -> AppResult<()> {
        Self::check_factories(graph)?;

        let description = graph.to_launch_string();
        let element = gst::parse::launch(&description).map_err(|e| {
            error!(error = %e, pipeline = %description, "Failed to parse pipeline");
            AppError::GraphConstruction(e.to_string())
        })?;

        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| AppError::GraphConstruction("description is not a pipeline".into()))?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| AppError::GraphConstruction("pipeline has no bus".into()))?;

        Self::install_signal_handler(&bus);
        self.pipeline = Some(pipeline);
        self.bus = Some(bus);
        Ok(())
    }

    fn play(&mut self) -> AppResult<()> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| AppError::GraphConstruction("pipeline not launched".into()))?;

        if let Err(e) = pipeline.set_state(gst::State::Playing) {
            // The element that refused the change posts the reason on the bus
            let cause = self.bus.as_ref().and_then(|bus| {
                bus.timed_pop_filtered(
                    gst::ClockTime::from_mseconds(timing::PLAY_ERROR_TIMEOUT_MS),
                    &[gst::MessageType::Error],
                )
            });
            let cause = cause.as_ref().and_then(|msg| match msg.view() {
                gst::MessageView::Error(err) => Some(error_event(err)),
                _ => None,
            });
            return Err(play_failure(
                format!("Failed to set pipeline to PLAYING: {}", e),
                cause,
            ));
        }
        Ok(())
    }

    fn next_event(&mut self) -> AppResult<RuntimeEvent> {
        let bus = self
            .bus
            .as_ref()
            .ok_or_else(|| AppError::Supervision("pipeline has no bus".into()))?;

        loop {
            let msg = bus
                .timed_pop(gst::ClockTime::NONE)
                .ok_or_else(|| AppError::Supervision("bus returned no message".into()))?;

            match msg.view() {
                gst::MessageView::Eos(..) => return Ok(RuntimeEvent::EndOfStream),
                gst::MessageView::Error(err) => return Ok(error_event(err)),
                gst::MessageView::Warning(warning) => {
                    let source = warning
                        .src()
                        .map(|s| s.name().to_string())
                        .unwrap_or_default();
                    return Ok(RuntimeEvent::Warning(format!(
                        "{}: {}",
                        source,
                        warning.error()
                    )));
                }
                gst::MessageView::Application(app)
                    if app
                        .structure()
                        .is_some_and(|s| s.has_name(INTERRUPT_MESSAGE)) =>
                {
                    return Ok(RuntimeEvent::Interrupted);
                }
                gst::MessageView::StateChanged(change) => {
                    let from_pipeline = match (msg.src(), self.pipeline.as_ref()) {
                        (Some(src), Some(pipeline)) => src == pipeline.upcast_ref::<gst::Object>(),
                        _ => false,
                    };
                    if from_pipeline {
                        debug!(
                            old = ?change.old(),
                            current = ?change.current(),
                            pending = ?change.pending(),
                            "Pipeline state changed"
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn stop(&mut self) {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return;
        };

        info!("Setting pipeline to NULL state");
        if let Err(e) = pipeline.set_state(gst::State::Null) {
            warn!(error = %e, "Failed to set pipeline to NULL");
        }
        // Wait for Null so GStreamer releases devices and sockets
        let _ = pipeline.state(gst::ClockTime::from_seconds(
            timing::NULL_STATE_TIMEOUT_SECS,
        ));
    }
}

fn error_event(err: &gst::message::Error) -> RuntimeEvent {
    RuntimeEvent::Error {
        message: err.error().to_string(),
        debug: err.debug().map(|d| d.to_string()),
        source: err.src().map(|s| s.name().to_string()),
    }
}

/// Error for a refused PLAYING transition, preferring the bus error's details
fn play_failure(fallback: String, cause: Option<RuntimeEvent>) -> AppError {
    match cause {
        Some(RuntimeEvent::Error {
            message,
            debug,
            source,
        }) => AppError::Runtime {
            message,
            debug: Some(debug.map_or(fallback.clone(), |d| format!("{}\n{}", fallback, d))),
            source,
        },
        _ => AppError::Runtime {
            message: fallback,
            debug: None,
            source: None,
        },
    }
}

impl Drop for GstRuntime {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.as_ref() {
            let _ = pipeline.set_state(gst::State::Null);
        }
    }
}

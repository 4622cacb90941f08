// SPDX-License-Identifier: MPL-2.0

//! Pipeline lifecycle
//!
//! ```text
//! Idle ──launch+play──▶ Playing ──EOS──▶ Stopped
//!   │                      │
//!   └──rejected───▶ Failed ◀──error / signal / bus failure
//! ```
//!
//! Every terminal transition stops the runtime before returning.

use super::graph::PipelineGraph;
use super::runtime::{ExecutionRuntime, RuntimeEvent};
use crate::constants::exit;
use crate::errors::{AppError, AppResult};
use tracing::{error, info, warn};

/// Controller run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Playing,
    Stopped,
    Failed,
}

/// How a streaming session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// End of stream, graceful shutdown
    Completed,
    /// Construction or playback failed
    Failed(AppError),
}

impl SessionOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionOutcome::Completed => exit::SUCCESS,
            SessionOutcome::Failed(err) => err.exit_code(),
        }
    }
}

/// Drives one pipeline through its lifetime
#[derive(Debug)]
pub struct PipelineController<R: ExecutionRuntime> {
    runtime: R,
    state: RunState,
}

impl<R: ExecutionRuntime> PipelineController<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Access the runtime, e.g. to inspect it after a session
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Hand the graph to the runtime and start it.
    ///
    /// On failure the runtime is stopped and the controller is `Failed`.
    pub fn start(&mut self, graph: &PipelineGraph) -> AppResult<()> {
        if self.state != RunState::Idle {
            return Err(AppError::GraphConstruction(format!(
                "pipeline already used (state {:?})",
                self.state
            )));
        }

        info!(pipeline = %graph, "Launching pipeline");
        let started = self
            .runtime
            .launch(graph)
            .and_then(|()| self.runtime.play());

        match started {
            Ok(()) => {
                self.state = RunState::Playing;
                info!("Pipeline playing");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to start pipeline");
                self.terminate(RunState::Failed);
                Err(e)
            }
        }
    }

    /// Block on runtime events until the session ends
    pub fn supervise(&mut self) -> SessionOutcome {
        if self.state != RunState::Playing {
            let err = AppError::Supervision(format!(
                "cannot supervise a pipeline in state {:?}",
                self.state
            ));
            self.terminate(RunState::Failed);
            return SessionOutcome::Failed(err);
        }

        loop {
            let event = match self.runtime.next_event() {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "Lost the runtime event stream");
                    self.terminate(RunState::Failed);
                    return SessionOutcome::Failed(e);
                }
            };

            match event {
                RuntimeEvent::EndOfStream => {
                    info!("End of stream");
                    self.terminate(RunState::Stopped);
                    return SessionOutcome::Completed;
                }
                RuntimeEvent::Error {
                    message,
                    debug,
                    source,
                } => {
                    error!(
                        error = %message,
                        debug = ?debug,
                        source = ?source,
                        "Runtime error"
                    );
                    self.terminate(RunState::Failed);
                    return SessionOutcome::Failed(AppError::Runtime {
                        message,
                        debug,
                        source,
                    });
                }
                RuntimeEvent::Warning(message) => {
                    warn!(warning = %message, "Runtime warning");
                }
                RuntimeEvent::Interrupted => {
                    warn!("Termination signal received");
                    self.terminate(RunState::Failed);
                    return SessionOutcome::Failed(AppError::Interrupted(
                        "termination signal".to_string(),
                    ));
                }
            }
        }
    }

    /// Start the graph and supervise it until it ends
    pub fn run(&mut self, graph: &PipelineGraph) -> SessionOutcome {
        match self.start(graph) {
            Ok(()) => self.supervise(),
            Err(e) => SessionOutcome::Failed(e),
        }
    }

    fn terminate(&mut self, state: RunState) {
        self.runtime.stop();
        self.state = state;
        info!(?state, "Pipeline shut down");
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{Call, ScriptedRuntime};
    use super::*;
    use crate::pipelines::graph::{Branch, Stage, StageKind};

    fn graph() -> PipelineGraph {
        let mut graph = PipelineGraph::new();
        graph.push(
            Branch::Video,
            Stage::factory("src", StageKind::Source, "videotestsrc"),
        );
        graph.push(
            Branch::Output,
            Stage::factory("mux", StageKind::Muxer, "flvmux"),
        );
        graph.push(
            Branch::Output,
            Stage::factory("sink", StageKind::Sink, "fakesink"),
        );
        graph
    }

    #[test]
    fn test_end_of_stream_stops() {
        let runtime = ScriptedRuntime::with_events([Ok(RuntimeEvent::EndOfStream)]);
        let mut controller = PipelineController::new(runtime);
        assert_eq!(controller.state(), RunState::Idle);

        let outcome = controller.run(&graph());

        assert_eq!(outcome, SessionOutcome::Completed);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(controller.state(), RunState::Stopped);
        assert_eq!(
            controller.runtime().calls.last(),
            Some(&Call::Stop)
        );
        assert_eq!(controller.runtime().stop_count(), 1);
    }

    #[test]
    fn test_error_event_fails() {
        let runtime = ScriptedRuntime::with_events([
            Ok(RuntimeEvent::Warning("late buffer".into())),
            Ok(RuntimeEvent::Error {
                message: "Could not connect to RTMP stream".into(),
                debug: Some("rtmpsink.c(...)".into()),
                source: Some("rtmp_sink".into()),
            }),
            Ok(RuntimeEvent::EndOfStream),
        ]);
        let mut controller = PipelineController::new(runtime);

        let outcome = controller.run(&graph());

        assert!(matches!(
            outcome,
            SessionOutcome::Failed(AppError::Runtime { .. })
        ));
        assert_eq!(outcome.exit_code(), exit::RUNTIME);
        assert_eq!(controller.state(), RunState::Failed);
        assert_eq!(controller.runtime().stop_count(), 1);
        // the EOS after the error is never consumed
        assert_eq!(controller.runtime().events.len(), 1);
    }

    #[test]
    fn test_rejected_graph_fails_without_play() {
        let runtime = ScriptedRuntime {
            reject_launch: true,
            ..Default::default()
        };
        let mut controller = PipelineController::new(runtime);

        let outcome = controller.run(&graph());

        assert!(matches!(
            outcome,
            SessionOutcome::Failed(AppError::GraphConstruction(_))
        ));
        assert_eq!(outcome.exit_code(), exit::GRAPH_CONSTRUCTION);
        assert_eq!(controller.state(), RunState::Failed);
        let calls = &controller.runtime().calls;
        assert!(!calls.contains(&Call::Play));
        assert_eq!(calls.last(), Some(&Call::Stop));
    }

    #[test]
    fn test_play_failure_stops_runtime() {
        let runtime = ScriptedRuntime {
            fail_play: true,
            ..Default::default()
        };
        let mut controller = PipelineController::new(runtime);

        assert!(controller.start(&graph()).is_err());
        assert_eq!(controller.state(), RunState::Failed);
        assert_eq!(controller.runtime().stop_count(), 1);
    }

    #[test]
    fn test_interrupt_fails() {
        let runtime = ScriptedRuntime::with_events([Ok(RuntimeEvent::Interrupted)]);
        let mut controller = PipelineController::new(runtime);

        let outcome = controller.run(&graph());

        assert_eq!(outcome.exit_code(), exit::INTERRUPTED);
        assert_eq!(controller.state(), RunState::Failed);
        assert_eq!(controller.runtime().stop_count(), 1);
    }

    #[test]
    fn test_bus_failure_fails() {
        let runtime =
            ScriptedRuntime::with_events([Err(AppError::Supervision("bus flushed".into()))]);
        let mut controller = PipelineController::new(runtime);

        let outcome = controller.run(&graph());

        assert_eq!(outcome.exit_code(), exit::SUPERVISION);
        assert_eq!(controller.state(), RunState::Failed);
        assert_eq!(controller.runtime().stop_count(), 1);
    }

    #[test]
    fn test_controller_is_single_use() {
        let runtime = ScriptedRuntime::with_events([Ok(RuntimeEvent::EndOfStream)]);
        let mut controller = PipelineController::new(runtime);
        assert_eq!(controller.run(&graph()), SessionOutcome::Completed);

        assert!(controller.start(&graph()).is_err());
        // no second launch reached the runtime
        let launches = controller
            .runtime()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Launch(_)))
            .count();
        assert_eq!(launches, 1);
    }
}

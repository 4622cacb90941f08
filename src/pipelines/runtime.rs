// SPDX-License-Identifier: MPL-2.0

//! Boundary to the graph-execution runtime

use super::graph::PipelineGraph;
use crate::errors::AppResult;

/// Typed messages coming back from a running pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The stream ended normally
    EndOfStream,
    /// An element failed
    Error {
        message: String,
        debug: Option<String>,
        source: Option<String>,
    },
    /// Non-fatal element warning
    Warning(String),
    /// The process received a termination signal
    Interrupted,
}

/// An engine that instantiates a pipeline graph and runs it
pub trait ExecutionRuntime {
    /// Parse and instantiate the graph. Fails with
    /// [`AppError::GraphConstruction`](crate::errors::AppError::GraphConstruction)
    /// when the description is rejected.
    fn launch(&mut self, graph: &PipelineGraph) -> AppResult<()>;

    /// Start data flow
    fn play(&mut self) -> AppResult<()>;

    /// Block until the next event
    fn next_event(&mut self) -> AppResult<RuntimeEvent>;

    /// Return the runtime to an inert state, releasing devices and sockets.
    /// Must be safe to call in any state, including before `launch`.
    fn stop(&mut self);
}

// SPDX-License-Identifier: MPL-2.0

//! Error types for the streamer
//!
//! [`AppError`] covers every fatal condition and knows the exit code the
//! process reports for it. [`ProbeFailure`] never leaves the capability
//! detector: a failed probe just means "assume the capability is absent".

use crate::constants::exit;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Fatal application errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration could not be resolved into a usable stream
    Config(String),
    /// The runtime rejected the pipeline description
    GraphConstruction(String),
    /// The runtime reported an error while playing
    Runtime {
        message: String,
        debug: Option<String>,
        source: Option<String>,
    },
    /// A termination signal reached the process
    Interrupted(String),
    /// Waiting for runtime events failed
    Supervision(String),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => exit::CONFIG,
            AppError::GraphConstruction(_) => exit::GRAPH_CONSTRUCTION,
            AppError::Runtime { .. } => exit::RUNTIME,
            AppError::Interrupted(_) => exit::INTERRUPTED,
            AppError::Supervision(_) => exit::SUPERVISION,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::GraphConstruction(msg) => write!(f, "Pipeline construction failed: {}", msg),
            AppError::Runtime {
                message, source, ..
            } => match source {
                Some(source) => write!(f, "Runtime error from {}: {}", source, message),
                None => write!(f, "Runtime error: {}", message),
            },
            AppError::Interrupted(msg) => write!(f, "Interrupted: {}", msg),
            AppError::Supervision(msg) => write!(f, "Supervision failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// A read-only device probe that could not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Device node or registry file could not be read
    Io(String),
    /// External query command could not run or exited non-zero
    Command(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Io(msg) => write!(f, "I/O error: {}", msg),
            ProbeFailure::Command(msg) => write!(f, "Command failed: {}", msg),
        }
    }
}

impl std::error::Error for ProbeFailure {}

impl From<std::io::Error> for ProbeFailure {
    fn from(err: std::io::Error) -> Self {
        ProbeFailure::Io(err.to_string())
    }
}

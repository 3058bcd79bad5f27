//! # Error Definitions
//!
//! Local failures of the bridge. Engine-reported failures are not errors at
//! this layer: they complete the call with an `Outcome` whose kind says so.

use std::time::Duration;

use thiserror::Error;

use crate::handle::CommandHandle;
use crate::operation::Operation;
use crate::status::ErrorKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The engine is not loaded. Nothing was allocated.
    #[error("engine is not loaded")]
    EngineUnavailable,

    /// An argument could not be put into its wire form. Nothing was allocated.
    #[error("argument encoding failed: {0}")]
    ArgumentEncoding(String),

    /// A command handle was registered twice.
    #[error("command handle {0} is already pending")]
    DuplicateCorrelation(CommandHandle),

    /// The engine refused to accept the call; its pending slot was discarded.
    #[error("engine failed to dispatch {operation}: {reason}")]
    Dispatch { operation: Operation, reason: String },

    /// The caller stopped waiting; the slot stays registered for the late callback.
    #[error("no callback for {command} within {after:?}")]
    DeadlineElapsed { command: CommandHandle, after: Duration },

    /// The slot was torn down before the engine answered.
    #[error("pending call {0} was abandoned")]
    Abandoned(CommandHandle),

    /// The private runtime used by blocking calls could not be started.
    #[error("blocking runtime unavailable: {0}")]
    Runtime(String),
}

impl Error {
    /// The closest engine-level classification for this local failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EngineUnavailable => ErrorKind::InvalidState,
            Self::ArgumentEncoding(_) => ErrorKind::InvalidArgument,
            Self::DuplicateCorrelation(_) => ErrorKind::InvalidState,
            Self::Dispatch { .. } => ErrorKind::IOError,
            Self::DeadlineElapsed { .. } => ErrorKind::Timeout,
            Self::Abandoned(_) => ErrorKind::IOError,
            Self::Runtime(_) => ErrorKind::IOError,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::ArgumentEncoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

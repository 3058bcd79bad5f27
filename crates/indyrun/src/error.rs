//! # Error Definitions

use indycall::ErrorKind;
use indycall::Operation;
use indycall::Outcome;
use thiserror::Error;

use crate::resource::ResourceKind;
use crate::resource::ResourceState;
use crate::resource::Transition;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The bridge failed locally; the resource was not touched.
    #[error(transparent)]
    Call(#[from] indycall::Error),

    /// The transition is not valid from the resource's current state.
    #[error("cannot {transition} {resource} '{name}' while {state}")]
    InvalidState {
        resource: ResourceKind,
        name: String,
        state: ResourceState,
        transition: Transition,
    },

    /// The engine completed the call with a failure status.
    #[error("{operation} rejected: {outcome}")]
    Rejected { operation: Operation, outcome: Outcome },

    /// A successful completion carried no handle or document.
    #[error("{0} succeeded without a result")]
    MissingResult(Operation),
}

impl Error {
    /// Classification callers can branch on, whatever layer failed.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Call(e) => e.kind(),
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Rejected { outcome, .. } => outcome.error_kind(),
            Self::MissingResult(_) => ErrorKind::InvalidArgument,
        }
    }

    /// The engine outcome, when the engine was the one that failed.
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            Self::Rejected { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

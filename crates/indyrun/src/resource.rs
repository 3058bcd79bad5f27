//! # Resource Lifecycle
//!
//! The state machine shared by pools and wallets:
//!
//! ```text
//! Unused ──create──▶ Created ──open──▶ Open ──close──▶ Closed
//!                                       ▲  │refresh        │
//!                                       │  ◀───┘           │
//!                                       └──────open────────┘
//! Unused | Created | Closed ──delete──▶ Deleted
//! ```
//!
//! Transitions are checked here before any call reaches the engine.

use indycall::Outcome;

use crate::error::Error;
use crate::error::Result;

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum ResourceState {
    Unused,
    Created,
    Open,
    Closed,
    Deleted,
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unused => write!(f, "unused"),
            Self::Created => write!(f, "created"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Transition {
    Create,
    Open,
    Refresh,
    Close,
    Delete,
    /// Using an open resource for a ledger request.
    Submit,
}

impl Transition {
    pub fn allowed_from(&self, state: ResourceState) -> bool {
        use ResourceState::*;
        match self {
            Self::Create => state == Unused,
            Self::Open => matches!(state, Created | Closed),
            Self::Refresh | Self::Close | Self::Submit => state == Open,
            Self::Delete => matches!(state, Unused | Created | Closed),
        }
    }

    /// The state a successful transition lands in.
    pub fn target(&self) -> Option<ResourceState> {
        match self {
            Self::Create => Some(ResourceState::Created),
            Self::Open => Some(ResourceState::Open),
            Self::Refresh | Self::Submit => None,
            Self::Close => Some(ResourceState::Closed),
            Self::Delete => Some(ResourceState::Deleted),
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Open => write!(f, "open"),
            Self::Refresh => write!(f, "refresh"),
            Self::Close => write!(f, "close"),
            Self::Delete => write!(f, "delete"),
            Self::Submit => write!(f, "submit through"),
        }
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum ResourceKind {
    Pool,
    Wallet,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pool => write!(f, "pool"),
            Self::Wallet => write!(f, "wallet"),
        }
    }
}

/// Rejects `transition` unless `state` allows it.
pub(crate) fn check(
    kind: ResourceKind,
    name: &str,
    state: ResourceState,
    transition: Transition,
) -> Result<()> {
    if transition.allowed_from(state) {
        return Ok(());
    }
    tracing::error!(resource = %kind, name, %state, %transition, "transition not allowed");
    Err(Error::InvalidState {
        resource: kind,
        name: name.to_owned(),
        state,
        transition,
    })
}

/// Passes a successful outcome through; logs and rejects anything else.
pub(crate) fn settle(outcome: Outcome, subject: &str) -> Result<Outcome> {
    if outcome.is_success() {
        return Ok(outcome);
    }
    tracing::error!(
        subject,
        operation = %outcome.operation(),
        command = %outcome.command(),
        invocation_status = outcome.invocation_status(),
        status = outcome.callback_status(),
        kind = %outcome.error_kind(),
        "engine rejected call"
    );
    Err(Error::Rejected {
        operation: outcome.operation(),
        outcome,
    })
}

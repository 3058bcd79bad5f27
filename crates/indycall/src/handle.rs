//! # Command Handles
//!
//! Correlation identifiers that link an issued invocation to the callback the
//! engine delivers for it later.

use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

/// Strong type for correlation identifiers.
///
/// The engine receives the raw `i32` and hands it back unchanged in every
/// callback it makes for the invocation.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandHandle(pub i32);

impl std::fmt::Display for CommandHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

/// Monotonic allocator for command handles.
///
/// A single counter shared by every caller of a `Client`. Values start at 1
/// and only ever grow, so a handle is never handed out twice while the
/// previous owner is still pending.
#[derive(Debug)]
pub struct CommandHandles {
    next: AtomicI32,
}

impl CommandHandles {
    pub fn new() -> Self {
        Self {
            next: AtomicI32::new(1),
        }
    }

    /// Returns the next unused command handle.
    pub fn next(&self) -> CommandHandle {
        CommandHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CommandHandles {
    fn default() -> Self {
        Self::new()
    }
}

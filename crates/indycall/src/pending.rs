//! # Pending Call Table
//!
//! One slot per in-flight invocation, keyed by command handle. Caller threads
//! insert, engine threads resolve. Every slot is resolved at most once: the
//! resolving callback removes it, so a second callback for the same handle
//! finds nothing and is reported instead of delivered.
//!
//! Removal happens under the map's shard lock, the hand-off to the waiter
//! happens after it is released, so an engine thread never waits on
//! caller-side work.
//!
//! A successful open that nobody is waiting for any more would leave the
//! engine holding a handle no caller knows about. Such handles go to the
//! releaser installed by the owning `Client`, which closes them.

use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::error::Result;
use crate::handle::CommandHandle;
use crate::operation::Operation;
use crate::outcome::Completion;

/// Issues `release` for an engine handle that no caller will ever see.
pub type Releaser = Box<dyn Fn(Operation, i32) + Send + Sync>;

struct Slot {
    operation: Operation,
    tx: oneshot::Sender<Completion>,
}

/// Concurrent table of invocations waiting on their callback.
pub struct PendingCalls {
    slots: DashMap<CommandHandle, Slot>,
    violations: AtomicU64,
    releaser: OnceLock<Releaser>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            violations: AtomicU64::new(0),
            releaser: OnceLock::new(),
        }
    }

    /// Installs the releaser for orphaned handles. Only the first one sticks.
    pub fn set_releaser(&self, releaser: Releaser) -> bool {
        self.releaser.set(releaser).is_ok()
    }

    /// Creates the slot for `command` and returns the receiving end.
    ///
    /// Fails with `DuplicateCorrelation` if the handle is already pending.
    pub fn register(
        &self,
        command: CommandHandle,
        operation: Operation,
    ) -> Result<oneshot::Receiver<Completion>> {
        match self.slots.entry(command) {
            Entry::Occupied(_) => Err(Error::DuplicateCorrelation(command)),
            Entry::Vacant(vacant) => {
                let (tx, rx) = oneshot::channel();
                vacant.insert(Slot { operation, tx });
                Ok(rx)
            }
        }
    }

    /// Delivers `completion` to the waiter registered under `command`.
    ///
    /// Runs on engine threads and never fails: a completion for a handle that
    /// is not pending is counted and logged, then dropped.
    pub fn resolve(&self, command: CommandHandle, completion: Completion) {
        let Some((_, slot)) = self.slots.remove(&command) else {
            self.violations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                %command,
                status = completion.status,
                "protocol violation: callback for unknown or already resolved command"
            );
            return;
        };

        let operation = slot.operation;
        let status = completion.status;
        match slot.tx.send(completion) {
            Ok(()) => tracing::debug!(%command, %operation, status, "call resolved"),
            // The waiter gave up (deadline or drop).
            Err(completion) => {
                tracing::debug!(%command, %operation, status, "late completion drained");
                self.reclaim(command, operation, &completion);
            }
        }
    }

    /// Hands a handle opened by an unobserved `completion` to the releaser.
    pub(crate) fn reclaim(
        &self,
        command: CommandHandle,
        operation: Operation,
        completion: &Completion,
    ) {
        let Some(release) = operation.release() else { return };
        let Some(handle) = completion.handle else { return };
        if !completion.kind.is_success() {
            return;
        }
        match self.releaser.get() {
            Some(releaser) => {
                tracing::warn!(%command, %operation, handle, %release, "releasing orphaned handle");
                releaser(release, handle);
            }
            None => {
                tracing::error!(%command, %operation, handle, "orphaned handle leaked, no releaser")
            }
        }
    }

    /// Removes a slot without resolving it. Returns whether it existed.
    pub fn discard(&self, command: CommandHandle) -> bool {
        self.slots.remove(&command).is_some()
    }

    /// Removes every slot, failing their waiters. Returns how many were pending.
    pub fn abandon_all(&self) -> usize {
        let keys: Vec<CommandHandle> = self.slots.iter().map(|e| *e.key()).collect();
        let mut abandoned = 0;
        for key in keys {
            if let Some((_, slot)) = self.slots.remove(&key) {
                tracing::debug!(
                    command = %key,
                    operation = %slot.operation,
                    "abandoning pending call"
                );
                drop(slot);
                abandoned += 1;
            }
        }
        abandoned
    }

    pub fn contains(&self, command: CommandHandle) -> bool {
        self.slots.contains_key(&command)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of completions that arrived for handles that were not pending.
    pub fn protocol_violations(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingCalls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCalls")
            .field("pending", &self.slots.len())
            .field("violations", &self.protocol_violations())
            .finish()
    }
}

//! # Invocation Gateway
//!
//! The `Client` issues every engine call: it allocates a command handle,
//! registers the pending slot, picks the callback adapter for the operation's
//! shape and hands everything to the engine. What comes back is a
//! `PendingCall` the caller can await or block on.
//!
//! An open that succeeds after its caller stopped listening, through a
//! deadline or a dropped `PendingCall`, is closed again by the client so the
//! engine never keeps a handle nobody knows about.
//!
//! There is no process-wide client. Construct one per engine and pass it to
//! whatever needs to issue calls; clones share the same pending table.

use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::blocking::block_on;
use crate::callback::Callback;
use crate::engine::Arg;
use crate::engine::Engine;
use crate::engine::Invocation;
use crate::error::Error;
use crate::error::Result;
use crate::handle::CommandHandle;
use crate::handle::CommandHandles;
use crate::operation::Operation;
use crate::outcome::Completion;
use crate::outcome::Outcome;
use crate::pending::PendingCalls;

/// Tunables for a `Client`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long a caller waits for a callback. `None` waits forever.
    ///
    /// When it elapses the caller gets `DeadlineElapsed`, but the slot stays
    /// registered so a late callback is still drained.
    pub deadline: Option<Duration>,
}

/// Fluent builder for a `Client`.
pub struct ClientBuilder {
    engine: Arc<dyn Engine>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            config: ClientConfig::default(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Client {
        let inner = Arc::new(Inner {
            engine: self.engine,
            pending: Arc::new(PendingCalls::new()),
            handles: CommandHandles::new(),
            config: self.config,
        });

        let weak = Arc::downgrade(&inner);
        inner
            .pending
            .set_releaser(Box::new(move |release, handle| release_orphan(&weak, release, handle)));

        Client { inner }
    }
}

/// Closes an engine handle whose open completed after its caller stopped waiting.
fn release_orphan(inner: &Weak<Inner>, release: Operation, handle: i32) {
    let Some(inner) = inner.upgrade() else { return };
    let client = Client { inner };
    match client.invoke(release, vec![Arg::Int(handle)]) {
        // Nobody reads the close either; its completion is drained.
        Ok(pending) => {
            tracing::debug!(command = %pending.command(), %release, handle, "release issued")
        }
        Err(e) => {
            tracing::error!(%release, handle, error = %e, "failed to release orphaned handle")
        }
    }
}

struct Inner {
    engine: Arc<dyn Engine>,
    pending: Arc<PendingCalls>,
    handles: CommandHandles,
    config: ClientConfig,
}

/// Gateway to one engine.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Creates a client with the default configuration.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        ClientBuilder::new(engine).build()
    }

    pub fn builder(engine: Arc<dyn Engine>) -> ClientBuilder {
        ClientBuilder::new(engine)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The table of calls still waiting on the engine.
    pub fn pending(&self) -> &PendingCalls {
        &self.inner.pending
    }

    /// Issues `operation` with `args` and returns the awaitable result.
    ///
    /// Local failures (engine not loaded, argument not encodable) are returned
    /// before any command handle is allocated. If the engine refuses the call
    /// outright, its slot is discarded before returning `Dispatch`.
    pub fn invoke(&self, operation: Operation, args: Vec<Arg>) -> Result<PendingCall> {
        if !self.inner.engine.is_loaded() {
            return Err(Error::EngineUnavailable);
        }
        for arg in &args {
            arg.validate()?;
        }

        let command = self.inner.handles.next();
        let rx = self.inner.pending.register(command, operation)?;
        let callback = Callback::for_shape(operation.shape(), Arc::clone(&self.inner.pending));

        tracing::debug!(%command, %operation, "issuing call");
        let invocation = Invocation {
            command,
            operation,
            args: &args,
        };

        let invocation_status = match self.inner.engine.invoke(invocation, callback) {
            Ok(status) => status,
            Err(e) => {
                self.inner.pending.discard(command);
                tracing::warn!(%command, %operation, error = %e, "engine refused call");
                return Err(Error::Dispatch {
                    operation,
                    reason: e.to_string(),
                });
            }
        };

        if invocation_status != 0 {
            tracing::debug!(%command, %operation, invocation_status, "non-zero immediate status");
        }

        Ok(PendingCall {
            command,
            operation,
            invocation_status,
            deadline: self.inner.config.deadline,
            calls: Arc::clone(&self.inner.pending),
            rx: Some(rx),
        })
    }

    /// Issues `operation` and awaits its outcome.
    pub async fn call(&self, operation: Operation, args: Vec<Arg>) -> Result<Outcome> {
        self.invoke(operation, args)?.outcome().await
    }

    /// Issues `operation` and blocks the current thread until its outcome arrives.
    pub fn call_blocking(&self, operation: Operation, args: Vec<Arg>) -> Result<Outcome> {
        block_on(self.call(operation, args))?
    }

    /// Fails every in-flight call with `Abandoned`. Returns how many there were.
    ///
    /// Callbacks that still arrive for those handles are reported as unknown.
    pub fn abandon_pending(&self) -> usize {
        let abandoned = self.inner.pending.abandon_all();
        if abandoned > 0 {
            tracing::warn!(abandoned, "abandoned pending calls");
        }
        abandoned
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("pending", &self.inner.pending)
            .finish()
    }
}

/// An issued call waiting for its callback.
///
/// Yields its outcome once. Dropping it unread, or giving up on it at the
/// deadline, hands any handle the call opened back to the engine.
pub struct PendingCall {
    command: CommandHandle,
    operation: Operation,
    invocation_status: i32,
    deadline: Option<Duration>,
    calls: Arc<PendingCalls>,
    rx: Option<oneshot::Receiver<Completion>>,
}

impl PendingCall {
    pub fn command(&self) -> CommandHandle {
        self.command
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The status the engine returned when the call was issued.
    pub fn invocation_status(&self) -> i32 {
        self.invocation_status
    }

    /// Overrides the client's deadline for this call only.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Waits for the callback and returns the joined outcome.
    pub async fn outcome(mut self) -> Result<Outcome> {
        self.recv().await
    }

    /// Blocks the current thread until the callback arrives.
    ///
    /// Inside an async runtime this returns `Error::Runtime` without touching
    /// the call, which can still be awaited with `outcome`.
    pub fn wait(&mut self) -> Result<Outcome> {
        block_on(self.recv())?
    }

    async fn recv(&mut self) -> Result<Outcome> {
        let command = self.command;
        let operation = self.operation;
        let Some(rx) = self.rx.as_mut() else {
            return Err(Error::Abandoned(command));
        };

        let waited = match self.deadline {
            Some(after) => tokio::time::timeout(after, rx).await.map_err(|_| after),
            None => Ok(rx.await),
        };
        let received = match waited {
            Ok(received) => received,
            Err(after) => {
                tracing::warn!(%command, %operation, ?after, "deadline elapsed");
                self.forsake();
                return Err(Error::DeadlineElapsed { command, after });
            }
        };
        self.rx = None;

        let completion = received.map_err(|_| Error::Abandoned(command))?;
        Ok(Outcome::new(command, operation, self.invocation_status, completion))
    }

    /// Stops listening. A completion already sitting in the channel is
    /// reclaimed here; one still to come is drained by the pending table.
    fn forsake(&mut self) {
        let Some(mut rx) = self.rx.take() else { return };
        rx.close();
        if let Ok(completion) = rx.try_recv() {
            tracing::debug!(
                command = %self.command,
                operation = %self.operation,
                "unread completion dropped"
            );
            self.calls.reclaim(self.command, self.operation, &completion);
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.forsake();
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("command", &self.command)
            .field("operation", &self.operation)
            .field("invocation_status", &self.invocation_status)
            .field("deadline", &self.deadline)
            .finish()
    }
}

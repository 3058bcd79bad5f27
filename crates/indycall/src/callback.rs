//! # Callback Adapters
//!
//! The completion targets handed to the engine with every invocation. Each
//! adapter only classifies the status and posts a `Completion` into the
//! pending table; no caller-side work runs on the engine's thread.

use std::sync::Arc;

use crate::handle::CommandHandle;
use crate::operation::CallbackShape;
use crate::outcome::Completion;
use crate::pending::PendingCalls;

/// Completion target for `(command, status)` callbacks.
#[derive(Clone)]
pub struct SimpleCallback {
    calls: Arc<PendingCalls>,
}

impl SimpleCallback {
    pub fn new(calls: Arc<PendingCalls>) -> Self {
        Self { calls }
    }

    pub fn complete(&self, command: CommandHandle, status: i32) {
        self.calls.resolve(command, Completion::new(status));
    }
}

/// Completion target for `(command, status, handle)` callbacks.
#[derive(Clone)]
pub struct HandleCallback {
    calls: Arc<PendingCalls>,
}

impl HandleCallback {
    pub fn new(calls: Arc<PendingCalls>) -> Self {
        Self { calls }
    }

    pub fn complete(&self, command: CommandHandle, status: i32, handle: i32) {
        self.calls.resolve(command, Completion::new(status).with_handle(handle));
    }
}

/// Completion target for `(command, status, json)` callbacks.
#[derive(Clone)]
pub struct PayloadCallback {
    calls: Arc<PendingCalls>,
}

impl PayloadCallback {
    pub fn new(calls: Arc<PendingCalls>) -> Self {
        Self { calls }
    }

    pub fn complete(&self, command: CommandHandle, status: i32, json: Option<&str>) {
        let payload = json.map(str::to_owned);
        self.calls.resolve(command, Completion::new(status).with_payload(payload));
    }
}

/// The adapter selected for one invocation.
#[derive(Clone)]
pub enum Callback {
    Simple(SimpleCallback),
    Handle(HandleCallback),
    Payload(PayloadCallback),
}

impl Callback {
    /// Builds the adapter for `shape`, bound to `calls`.
    pub fn for_shape(shape: CallbackShape, calls: Arc<PendingCalls>) -> Self {
        match shape {
            CallbackShape::Simple => Self::Simple(SimpleCallback::new(calls)),
            CallbackShape::Handle => Self::Handle(HandleCallback::new(calls)),
            CallbackShape::Payload => Self::Payload(PayloadCallback::new(calls)),
        }
    }

    pub fn shape(&self) -> CallbackShape {
        match self {
            Self::Simple(_) => CallbackShape::Simple,
            Self::Handle(_) => CallbackShape::Handle,
            Self::Payload(_) => CallbackShape::Payload,
        }
    }

    /// Completes with a bare status, whatever the shape.
    ///
    /// Engines use this for failures, where the shaped value is meaningless.
    pub fn fail(&self, command: CommandHandle, status: i32) {
        match self {
            Self::Simple(cb) => cb.complete(command, status),
            Self::Handle(cb) => cb.complete(command, status, 0),
            Self::Payload(cb) => cb.complete(command, status, None),
        }
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback::{:?}", self.shape())
    }
}

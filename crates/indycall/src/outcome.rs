//! # Outcomes
//!
//! `Completion` is what a callback adapter hands across the pending table.
//! `Outcome` is what the waiting caller finally sees: the completion joined with
//! the immediate status the engine returned when the call was issued.

use crate::handle::CommandHandle;
use crate::operation::Operation;
use crate::status::ErrorKind;

/// A classified engine callback, as posted by a callback adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub status: i32,
    pub kind: ErrorKind,
    pub handle: Option<i32>,
    pub payload: Option<String>,
}

impl Completion {
    /// Classifies `status` and builds a completion with no result value.
    pub fn new(status: i32) -> Self {
        Self {
            status,
            kind: ErrorKind::from_status(status),
            handle: None,
            payload: None,
        }
    }

    pub fn with_handle(mut self, handle: i32) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_payload(mut self, payload: Option<String>) -> Self {
        self.payload = payload;
        self
    }
}

/// The structured result of one invocation.
///
/// `error_kind` is authoritative for success or failure. `invocation_status`
/// is the value the engine returned synchronously when the call was issued and
/// is kept for diagnostics only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    command: CommandHandle,
    operation: Operation,
    invocation_status: i32,
    callback_status: i32,
    error_kind: ErrorKind,
    result_handle: Option<i32>,
    result_payload: Option<String>,
}

impl Outcome {
    pub(crate) fn new(
        command: CommandHandle,
        operation: Operation,
        invocation_status: i32,
        completion: Completion,
    ) -> Self {
        Self {
            command,
            operation,
            invocation_status,
            callback_status: completion.status,
            error_kind: completion.kind,
            result_handle: completion.handle,
            result_payload: completion.payload,
        }
    }

    pub fn command(&self) -> CommandHandle {
        self.command
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn invocation_status(&self) -> i32 {
        self.invocation_status
    }

    /// The raw status carried by the callback.
    pub fn callback_status(&self) -> i32 {
        self.callback_status
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.error_kind
    }

    pub fn result_handle(&self) -> Option<i32> {
        self.result_handle
    }

    pub fn result_payload(&self) -> Option<&str> {
        self.result_payload.as_deref()
    }

    /// Consumes the outcome, returning the payload document if any.
    pub fn into_payload(self) -> Option<String> {
        self.result_payload
    }

    pub fn is_success(&self) -> bool {
        self.error_kind.is_success()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {} [callback status {}, immediate status {}]",
            self.operation,
            self.command,
            self.error_kind,
            self.callback_status,
            self.invocation_status
        )
    }
}

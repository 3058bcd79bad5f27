//! # Engine Abstraction
//!
//! The native engine as the bridge sees it: an operation identified by name
//! that accepts already-serialized arguments and a completion target, and
//! returns an immediate status code.
//!
//! ## Philosophy
//!
//! - **Opaque**: The bridge knows nothing about how the engine is loaded or
//!   how arguments cross into native code. It hands over strings and integers.
//! - **Callback-Driven**: The engine completes every accepted call exactly once,
//!   later, on a thread of its own choosing, through the `Callback` it was given.

use serde::Serialize;

use crate::callback::Callback;
use crate::error::Error;
use crate::error::Result;
use crate::handle::CommandHandle;
use crate::operation::Operation;

/// A single serialized argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    /// A nullable string, typically a name or a JSON document.
    Str(Option<String>),
    Int(i32),
    Bool(bool),
}

impl Arg {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(Some(value.into()))
    }

    pub fn opt_str(value: Option<impl Into<String>>) -> Self {
        Self::Str(value.map(Into::into))
    }

    pub fn null() -> Self {
        Self::Str(None)
    }

    /// Serializes `value` to a JSON document argument.
    pub fn document<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value)?;
        Ok(Self::Str(Some(json)))
    }

    /// Wraps a caller-supplied JSON document, checking that it parses.
    pub fn json(document: &str) -> Result<Self> {
        serde_json::from_str::<serde_json::Value>(document)?;
        Ok(Self::Str(Some(document.to_owned())))
    }

    /// Like `json`, but absent documents become a null argument.
    pub fn opt_json(document: Option<&str>) -> Result<Self> {
        match document {
            Some(document) => Self::json(document),
            None => Ok(Self::null()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => s.as_deref(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Checks the argument can cross into native code as a C string.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Str(Some(s)) if s.contains('\0') => Err(Error::ArgumentEncoding(
                "string argument contains an interior NUL byte".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// One call as handed to the engine.
#[derive(Clone, Copy, Debug)]
pub struct Invocation<'a> {
    pub command: CommandHandle,
    pub operation: Operation,
    pub args: &'a [Arg],
}

/// The engine refused to accept a call at all.
///
/// Distinct from a non-success immediate status: when this is returned the
/// engine will never invoke the callback.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

/// An engine capable of executing named operations.
///
/// This trait is designed to be object-safe (`Arc<dyn Engine>`).
pub trait Engine: Send + Sync + 'static {
    /// Whether the engine is loaded and able to accept calls.
    fn is_loaded(&self) -> bool {
        true
    }

    /// Issues `invocation` and returns the engine's immediate status.
    ///
    /// # invariants
    /// - On `Ok`, `callback` must be invoked exactly once with `invocation.command`,
    ///   possibly before this method returns and possibly from another thread.
    /// - On `Err`, `callback` must never be invoked.
    /// - Must not block waiting for the operation itself to finish.
    fn invoke(
        &self,
        invocation: Invocation<'_>,
        callback: Callback,
    ) -> std::result::Result<i32, EngineError>;
}

//! # indycall
//!
//! A bridge from a callback-driven native engine to futures and blocking calls.
//!
//! ## Architecture
//!
//! Every engine operation returns an immediate status and later invokes one of
//! three callback shapes, exactly once, on a thread the engine owns. indycall
//! correlates those callbacks back to their callers:
//!
//! - **CommandHandles**: allocates the integer each invocation is correlated by
//! - **PendingCalls**: one slot per in-flight call, resolved at most once
//! - **Callback**: the simple / handle / payload adapters handed to the engine
//! - **Client**: issues calls and returns a `PendingCall` to await or block on
//! - **Outcome** / **ErrorKind**: the classified result of a call
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use indycall::Arg;
//! use indycall::Client;
//! use indycall::Operation;
//! use indycall::mock_engine::MockEngine;
//!
//! # async fn example() -> indycall::Result<()> {
//! let client = Client::new(Arc::new(MockEngine::new()));
//! let outcome = client
//!     .call(Operation::CreatePoolLedgerConfig, vec![Arg::str("sandbox"), Arg::null()])
//!     .await?;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod callback;
pub mod client;
pub mod engine;
pub mod error;
pub mod handle;
pub mod mock_engine;
pub mod operation;
pub mod outcome;
pub mod pending;
pub mod status;

pub use blocking::block_on;
pub use callback::Callback;
pub use client::Client;
pub use client::ClientBuilder;
pub use client::ClientConfig;
pub use client::PendingCall;
pub use engine::Arg;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::Invocation;
pub use error::Error;
pub use error::Result;
pub use handle::CommandHandle;
pub use handle::CommandHandles;
pub use operation::CallbackShape;
pub use operation::Operation;
pub use outcome::Completion;
pub use outcome::Outcome;
pub use pending::PendingCalls;
pub use status::ErrorKind;

#[cfg(test)]
mod tests;

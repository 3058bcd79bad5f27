//! # indyrun
//!
//! Lifecycle management for pools and wallets on top of `indycall`.
//!
//! ## Architecture
//!
//! - **Pool** / **Wallet**: single-owner resource objects tracking their state
//!   and, while open, their engine handle
//! - **PoolManager** / **WalletManager**: check each transition, issue the
//!   engine call and advance the state only on success
//! - **LedgerManager**: builds ledger requests and submits them through open
//!   pools and wallets
//!
//! Every manager operation has an async form and a `_blocking` form, plus a
//! `submit_*` form that takes plain names or handles and returns the raw
//! `PendingCall` without touching any resource state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use indycall::Client;
//! use indycall::mock_engine::MockEngine;
//! use indyrun::Pool;
//! use indyrun::PoolManager;
//!
//! # async fn example() -> indyrun::Result<()> {
//! let pools = PoolManager::new(Client::new(Arc::new(MockEngine::new())));
//! let mut pool = Pool::new("sandbox");
//! pools.create_config(&mut pool).await?;
//! pools.open(&mut pool).await?;
//! pools.close(&mut pool).await?;
//! pools.delete_config(&mut pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod resource;
pub mod wallet;

pub use config::CreatePoolConfig;
pub use config::OpenPoolConfig;
pub use error::Error;
pub use error::Result;
pub use ledger::LedgerManager;
pub use pool::Pool;
pub use pool::PoolHandle;
pub use pool::PoolManager;
pub use resource::ResourceKind;
pub use resource::ResourceState;
pub use resource::Transition;
pub use wallet::Wallet;
pub use wallet::WalletHandle;
pub use wallet::WalletManager;

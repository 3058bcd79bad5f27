//! # Pool Ledgers
//!
//! A `Pool` is a named connection to a ledger network. The `PoolManager`
//! drives it through its lifecycle, checking each transition against the
//! pool's state before issuing the engine call and only moving the state
//! forward once the engine reports success.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use indycall::Arg;
use indycall::Client;
use indycall::Operation;
use indycall::Outcome;
use indycall::PendingCall;
use indycall::block_on;

use crate::config::CreatePoolConfig;
use crate::config::OpenPoolConfig;
use crate::error::Error;
use crate::error::Result;
use crate::resource::ResourceKind;
use crate::resource::ResourceState;
use crate::resource::Transition;
use crate::resource::check;
use crate::resource::settle;

/// Engine handle of an open pool.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PoolHandle(pub i32);

impl std::fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Pool {
    name: String,
    genesis_path: Option<PathBuf>,
    open_config: OpenPoolConfig,
    state: ResourceState,
    handle: Option<PoolHandle>,
}

impl Pool {
    /// A pool that has no ledger configuration yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            genesis_path: None,
            open_config: OpenPoolConfig::default(),
            state: ResourceState::Unused,
            handle: None,
        }
    }

    /// A pool whose configuration was created earlier, e.g. by another process.
    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            state: ResourceState::Created,
            ..Self::new(name)
        }
    }

    pub fn genesis_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.genesis_path = Some(path.into());
        self
    }

    pub fn refresh_on_open(mut self, refresh: bool) -> Self {
        self.open_config.refresh_on_open = refresh;
        self
    }

    pub fn auto_refresh(mut self, interval: Duration) -> Self {
        self.open_config.auto_refresh = interval;
        self
    }

    pub fn network_timeout(mut self, timeout: Duration) -> Self {
        self.open_config.network_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genesis(&self) -> Option<&Path> {
        self.genesis_path.as_deref()
    }

    pub fn open_config(&self) -> &OpenPoolConfig {
        &self.open_config
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Present exactly while the pool is open.
    pub fn handle(&self) -> Option<PoolHandle> {
        self.handle
    }

    pub(crate) fn check(&self, transition: Transition) -> Result<()> {
        check(ResourceKind::Pool, &self.name, self.state, transition)
    }

    /// The handle of an open pool, or the state error for `transition`.
    pub(crate) fn open_handle(&self, transition: Transition) -> Result<PoolHandle> {
        self.check(transition)?;
        match self.handle {
            Some(handle) => Ok(handle),
            None => Err(Error::InvalidState {
                resource: ResourceKind::Pool,
                name: self.name.clone(),
                state: self.state,
                transition,
            }),
        }
    }

    fn advance(&mut self, transition: Transition) {
        if let Some(state) = transition.target() {
            tracing::debug!(pool = %self.name, from = %self.state, to = %state, "pool transition");
            self.state = state;
        }
    }
}

/// Drives pools through their lifecycle.
#[derive(Clone, Debug)]
pub struct PoolManager {
    client: Client,
}

impl PoolManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn submit_create_config(
        &self,
        name: &str,
        genesis_path: Option<&Path>,
    ) -> Result<PendingCall> {
        let config = match genesis_path {
            Some(path) => Arg::document(&CreatePoolConfig::from_path(path)?)?,
            None => Arg::null(),
        };
        Ok(self
            .client
            .invoke(Operation::CreatePoolLedgerConfig, vec![Arg::str(name), config])?)
    }

    pub fn submit_open(&self, name: &str, config: &OpenPoolConfig) -> Result<PendingCall> {
        let config = Arg::document(config)?;
        Ok(self.client.invoke(Operation::OpenPoolLedger, vec![Arg::str(name), config])?)
    }

    pub fn submit_refresh(&self, handle: PoolHandle) -> Result<PendingCall> {
        Ok(self.client.invoke(Operation::RefreshPoolLedger, vec![Arg::Int(handle.0)])?)
    }

    pub fn submit_close(&self, handle: PoolHandle) -> Result<PendingCall> {
        Ok(self.client.invoke(Operation::ClosePoolLedger, vec![Arg::Int(handle.0)])?)
    }

    pub fn submit_delete_config(&self, name: &str) -> Result<PendingCall> {
        Ok(self.client.invoke(Operation::DeletePoolLedgerConfig, vec![Arg::str(name)])?)
    }

    /// Registers the pool's ledger configuration with the engine.
    pub async fn create_config(&self, pool: &mut Pool) -> Result<Outcome> {
        pool.check(Transition::Create)?;
        let pending = self.submit_create_config(&pool.name, pool.genesis_path.as_deref())?;
        let outcome = settle(pending.outcome().await?, &pool.name)?;
        pool.advance(Transition::Create);
        Ok(outcome)
    }

    /// Opens the pool and stores the handle the engine returns.
    pub async fn open(&self, pool: &mut Pool) -> Result<Outcome> {
        pool.check(Transition::Open)?;
        let pending = self.submit_open(&pool.name, &pool.open_config)?;
        let outcome = settle(pending.outcome().await?, &pool.name)?;
        let handle = outcome
            .result_handle()
            .ok_or(Error::MissingResult(Operation::OpenPoolLedger))?;
        pool.handle = Some(PoolHandle(handle));
        pool.advance(Transition::Open);
        Ok(outcome)
    }

    /// Re-syncs an open pool with the network. The state does not change.
    pub async fn refresh(&self, pool: &mut Pool) -> Result<Outcome> {
        let handle = pool.open_handle(Transition::Refresh)?;
        let outcome = settle(self.submit_refresh(handle)?.outcome().await?, &pool.name)?;
        tracing::debug!(pool = %pool.name, %handle, "pool refreshed");
        Ok(outcome)
    }

    pub async fn close(&self, pool: &mut Pool) -> Result<Outcome> {
        let handle = pool.open_handle(Transition::Close)?;
        let outcome = settle(self.submit_close(handle)?.outcome().await?, &pool.name)?;
        pool.handle = None;
        pool.advance(Transition::Close);
        Ok(outcome)
    }

    pub async fn delete_config(&self, pool: &mut Pool) -> Result<Outcome> {
        pool.check(Transition::Delete)?;
        let pending = self.submit_delete_config(&pool.name)?;
        let outcome = settle(pending.outcome().await?, &pool.name)?;
        pool.advance(Transition::Delete);
        Ok(outcome)
    }

    pub fn create_config_blocking(&self, pool: &mut Pool) -> Result<Outcome> {
        block_on(self.create_config(pool))?
    }

    pub fn open_blocking(&self, pool: &mut Pool) -> Result<Outcome> {
        block_on(self.open(pool))?
    }

    pub fn refresh_blocking(&self, pool: &mut Pool) -> Result<Outcome> {
        block_on(self.refresh(pool))?
    }

    pub fn close_blocking(&self, pool: &mut Pool) -> Result<Outcome> {
        block_on(self.close(pool))?
    }

    pub fn delete_config_blocking(&self, pool: &mut Pool) -> Result<Outcome> {
        block_on(self.delete_config(pool))?
    }
}

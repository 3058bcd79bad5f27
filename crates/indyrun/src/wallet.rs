//! # Wallets
//!
//! A `Wallet` is a named secure store bound to a pool. Credentials are passed
//! per call and never kept on the wallet object.

use indycall::Arg;
use indycall::Client;
use indycall::Operation;
use indycall::Outcome;
use indycall::PendingCall;
use indycall::block_on;

use crate::error::Error;
use crate::error::Result;
use crate::resource::ResourceKind;
use crate::resource::ResourceState;
use crate::resource::Transition;
use crate::resource::check;
use crate::resource::settle;

/// Engine handle of an open wallet.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct WalletHandle(pub i32);

impl std::fmt::Display for WalletHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wallet-{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Wallet {
    name: String,
    store_type: Option<String>,
    config: Option<String>,
    runtime_config: Option<String>,
    state: ResourceState,
    handle: Option<WalletHandle>,
}

impl Wallet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store_type: None,
            config: None,
            runtime_config: None,
            state: ResourceState::Unused,
            handle: None,
        }
    }

    /// A wallet created earlier, e.g. by another process.
    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            state: ResourceState::Created,
            ..Self::new(name)
        }
    }

    /// Storage backend registered with the engine. The engine default when unset.
    pub fn store_type(mut self, store_type: impl Into<String>) -> Self {
        self.store_type = Some(store_type.into());
        self
    }

    /// JSON configuration used when the wallet is created.
    pub fn config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// JSON configuration used each time the wallet is opened.
    pub fn runtime_config(mut self, config: impl Into<String>) -> Self {
        self.runtime_config = Some(config.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Present exactly while the wallet is open.
    pub fn handle(&self) -> Option<WalletHandle> {
        self.handle
    }

    pub(crate) fn check(&self, transition: Transition) -> Result<()> {
        check(ResourceKind::Wallet, &self.name, self.state, transition)
    }

    pub(crate) fn open_handle(&self, transition: Transition) -> Result<WalletHandle> {
        self.check(transition)?;
        self.handle.ok_or_else(|| Error::InvalidState {
            resource: ResourceKind::Wallet,
            name: self.name.clone(),
            state: self.state,
            transition,
        })
    }

    fn advance(&mut self, transition: Transition) {
        if let Some(state) = transition.target() {
            tracing::debug!(
                wallet = %self.name,
                from = %self.state,
                to = %state,
                "wallet transition"
            );
            self.state = state;
        }
    }
}

/// Drives wallets through their lifecycle.
#[derive(Clone, Debug)]
pub struct WalletManager {
    client: Client,
}

impl WalletManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn submit_create(
        &self,
        pool_name: &str,
        name: &str,
        store_type: Option<&str>,
        config: Option<&str>,
        credentials: Option<&str>,
    ) -> Result<PendingCall> {
        let args = vec![
            Arg::str(pool_name),
            Arg::str(name),
            Arg::opt_str(store_type),
            Arg::opt_json(config)?,
            Arg::opt_json(credentials)?,
        ];
        Ok(self.client.invoke(Operation::CreateWallet, args)?)
    }

    pub fn submit_open(
        &self,
        name: &str,
        runtime_config: Option<&str>,
        credentials: Option<&str>,
    ) -> Result<PendingCall> {
        let args = vec![
            Arg::str(name),
            Arg::opt_json(runtime_config)?,
            Arg::opt_json(credentials)?,
        ];
        Ok(self.client.invoke(Operation::OpenWallet, args)?)
    }

    pub fn submit_close(&self, handle: WalletHandle) -> Result<PendingCall> {
        Ok(self.client.invoke(Operation::CloseWallet, vec![Arg::Int(handle.0)])?)
    }

    pub fn submit_delete(&self, name: &str, credentials: Option<&str>) -> Result<PendingCall> {
        let args = vec![Arg::str(name), Arg::opt_json(credentials)?];
        Ok(self.client.invoke(Operation::DeleteWallet, args)?)
    }

    /// Creates the wallet in the engine, bound to `pool_name`.
    pub async fn create(
        &self,
        pool_name: &str,
        wallet: &mut Wallet,
        credentials: Option<&str>,
    ) -> Result<Outcome> {
        wallet.check(Transition::Create)?;
        let pending = self.submit_create(
            pool_name,
            &wallet.name,
            wallet.store_type.as_deref(),
            wallet.config.as_deref(),
            credentials,
        )?;
        let outcome = settle(pending.outcome().await?, &wallet.name)?;
        wallet.advance(Transition::Create);
        Ok(outcome)
    }

    pub async fn open(&self, wallet: &mut Wallet, credentials: Option<&str>) -> Result<Outcome> {
        wallet.check(Transition::Open)?;
        let runtime_config = wallet.runtime_config.as_deref();
        let pending = self.submit_open(&wallet.name, runtime_config, credentials)?;
        let outcome = settle(pending.outcome().await?, &wallet.name)?;
        let handle = outcome
            .result_handle()
            .ok_or(Error::MissingResult(Operation::OpenWallet))?;
        wallet.handle = Some(WalletHandle(handle));
        wallet.advance(Transition::Open);
        Ok(outcome)
    }

    pub async fn close(&self, wallet: &mut Wallet) -> Result<Outcome> {
        let handle = wallet.open_handle(Transition::Close)?;
        let outcome = settle(self.submit_close(handle)?.outcome().await?, &wallet.name)?;
        wallet.handle = None;
        wallet.advance(Transition::Close);
        Ok(outcome)
    }

    pub async fn delete(&self, wallet: &mut Wallet, credentials: Option<&str>) -> Result<Outcome> {
        wallet.check(Transition::Delete)?;
        let pending = self.submit_delete(&wallet.name, credentials)?;
        let outcome = settle(pending.outcome().await?, &wallet.name)?;
        wallet.advance(Transition::Delete);
        Ok(outcome)
    }

    pub fn create_blocking(
        &self,
        pool_name: &str,
        wallet: &mut Wallet,
        credentials: Option<&str>,
    ) -> Result<Outcome> {
        block_on(self.create(pool_name, wallet, credentials))?
    }

    pub fn open_blocking(&self, wallet: &mut Wallet, credentials: Option<&str>) -> Result<Outcome> {
        block_on(self.open(wallet, credentials))?
    }

    pub fn close_blocking(&self, wallet: &mut Wallet) -> Result<Outcome> {
        block_on(self.close(wallet))?
    }

    pub fn delete_blocking(
        &self,
        wallet: &mut Wallet,
        credentials: Option<&str>,
    ) -> Result<Outcome> {
        block_on(self.delete(wallet, credentials))?
    }
}

//! # Ledger Requests
//!
//! Builds ledger transaction requests and submits them through an open pool.
//! Every operation here completes with a JSON document.

use indycall::Arg;
use indycall::Client;
use indycall::Operation;
use indycall::block_on;

use crate::error::Error;
use crate::error::Result;
use crate::pool::Pool;
use crate::resource::Transition;
use crate::resource::settle;
use crate::wallet::Wallet;

#[derive(Clone, Debug)]
pub struct LedgerManager {
    client: Client,
}

impl LedgerManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn document(
        &self,
        operation: Operation,
        subject: &str,
        args: Vec<Arg>,
    ) -> Result<String> {
        let outcome = settle(self.client.call(operation, args).await?, subject)?;
        outcome.into_payload().ok_or(Error::MissingResult(operation))
    }

    /// Sends `request_json` to the pool's nodes and returns their reply.
    pub async fn submit_request(&self, pool: &Pool, request_json: &str) -> Result<String> {
        let handle = pool.open_handle(Transition::Submit)?;
        let args = vec![Arg::Int(handle.0), Arg::json(request_json)?];
        self.document(Operation::SubmitRequest, pool.name(), args).await
    }

    /// Signs `request_json` with `submitter_did`'s key from `wallet`, then submits it.
    pub async fn sign_and_submit_request(
        &self,
        pool: &Pool,
        wallet: &Wallet,
        submitter_did: &str,
        request_json: &str,
    ) -> Result<String> {
        let pool_handle = pool.open_handle(Transition::Submit)?;
        let wallet_handle = wallet.open_handle(Transition::Submit)?;
        let args = vec![
            Arg::Int(pool_handle.0),
            Arg::Int(wallet_handle.0),
            Arg::str(submitter_did),
            Arg::json(request_json)?,
        ];
        self.document(Operation::SignAndSubmitRequest, pool.name(), args).await
    }

    pub fn submit_request_blocking(&self, pool: &Pool, request_json: &str) -> Result<String> {
        block_on(self.submit_request(pool, request_json))?
    }

    pub fn sign_and_submit_request_blocking(
        &self,
        pool: &Pool,
        wallet: &Wallet,
        submitter_did: &str,
        request_json: &str,
    ) -> Result<String> {
        block_on(self.sign_and_submit_request(pool, wallet, submitter_did, request_json))?
    }

    pub async fn build_get_ddo_request(
        &self,
        submitter_did: &str,
        target_did: &str,
    ) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::str(target_did)];
        self.document(Operation::BuildGetDdoRequest, submitter_did, args).await
    }

    pub async fn build_nym_request(
        &self,
        submitter_did: &str,
        target_did: &str,
        verkey: Option<&str>,
        alias: Option<&str>,
        role: Option<&str>,
    ) -> Result<String> {
        let args = vec![
            Arg::str(submitter_did),
            Arg::str(target_did),
            Arg::opt_str(verkey),
            Arg::opt_str(alias),
            Arg::opt_str(role),
        ];
        self.document(Operation::BuildNymRequest, submitter_did, args).await
    }

    /// Exactly one of `hash`, `raw` or `enc` is expected by the ledger.
    pub async fn build_attrib_request(
        &self,
        submitter_did: &str,
        target_did: &str,
        hash: Option<&str>,
        raw: Option<&str>,
        enc: Option<&str>,
    ) -> Result<String> {
        let args = vec![
            Arg::str(submitter_did),
            Arg::str(target_did),
            Arg::opt_str(hash),
            Arg::opt_json(raw)?,
            Arg::opt_str(enc),
        ];
        self.document(Operation::BuildAttribRequest, submitter_did, args).await
    }

    pub async fn build_get_attrib_request(
        &self,
        submitter_did: &str,
        target_did: &str,
        data: &str,
    ) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::str(target_did), Arg::str(data)];
        self.document(Operation::BuildGetAttribRequest, submitter_did, args).await
    }

    pub async fn build_get_nym_request(
        &self,
        submitter_did: &str,
        target_did: &str,
    ) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::str(target_did)];
        self.document(Operation::BuildGetNymRequest, submitter_did, args).await
    }

    pub async fn build_schema_request(&self, submitter_did: &str, data: &str) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::json(data)?];
        self.document(Operation::BuildSchemaRequest, submitter_did, args).await
    }

    pub async fn build_get_schema_request(
        &self,
        submitter_did: &str,
        dest: &str,
        data: &str,
    ) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::str(dest), Arg::json(data)?];
        self.document(Operation::BuildGetSchemaRequest, submitter_did, args).await
    }

    pub async fn build_node_request(
        &self,
        submitter_did: &str,
        target_did: &str,
        data: &str,
    ) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::str(target_did), Arg::json(data)?];
        self.document(Operation::BuildNodeRequest, submitter_did, args).await
    }

    pub async fn build_get_txn_request(&self, submitter_did: &str, seq_no: i32) -> Result<String> {
        let args = vec![Arg::str(submitter_did), Arg::Int(seq_no)];
        self.document(Operation::BuildGetTxnRequest, submitter_did, args).await
    }
}

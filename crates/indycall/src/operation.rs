//! # Operation Table
//!
//! The static mapping from each engine operation to its native name and the
//! callback shape the engine completes it with.

/// The three ways the engine completes an invocation.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum CallbackShape {
    /// `(command, status)`
    Simple,
    /// `(command, status, handle)`
    Handle,
    /// `(command, status, json)`
    Payload,
}

/// Every engine operation the bridge knows how to issue.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Operation {
    CreatePoolLedgerConfig,
    OpenPoolLedger,
    RefreshPoolLedger,
    ClosePoolLedger,
    DeletePoolLedgerConfig,

    CreateWallet,
    OpenWallet,
    CloseWallet,
    DeleteWallet,

    SubmitRequest,
    SignAndSubmitRequest,
    BuildGetDdoRequest,
    BuildNymRequest,
    BuildAttribRequest,
    BuildGetAttribRequest,
    BuildGetNymRequest,
    BuildSchemaRequest,
    BuildGetSchemaRequest,
    BuildNodeRequest,
    BuildGetTxnRequest,
}

impl Operation {
    /// The engine's symbol for this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatePoolLedgerConfig => "indy_create_pool_ledger_config",
            Self::OpenPoolLedger => "indy_open_pool_ledger",
            Self::RefreshPoolLedger => "indy_refresh_pool_ledger",
            Self::ClosePoolLedger => "indy_close_pool_ledger",
            Self::DeletePoolLedgerConfig => "indy_delete_pool_ledger_config",
            Self::CreateWallet => "indy_create_wallet",
            Self::OpenWallet => "indy_open_wallet",
            Self::CloseWallet => "indy_close_wallet",
            Self::DeleteWallet => "indy_delete_wallet",
            Self::SubmitRequest => "indy_submit_request",
            Self::SignAndSubmitRequest => "indy_sign_and_submit_request",
            Self::BuildGetDdoRequest => "indy_build_get_ddo_request",
            Self::BuildNymRequest => "indy_build_nym_request",
            Self::BuildAttribRequest => "indy_build_attrib_request",
            Self::BuildGetAttribRequest => "indy_build_get_attrib_request",
            Self::BuildGetNymRequest => "indy_build_get_nym_request",
            Self::BuildSchemaRequest => "indy_build_schema_request",
            Self::BuildGetSchemaRequest => "indy_build_get_schema_request",
            Self::BuildNodeRequest => "indy_build_node_request",
            Self::BuildGetTxnRequest => "indy_build_get_txn_request",
        }
    }

    /// The callback shape the engine uses to complete this operation.
    pub fn shape(&self) -> CallbackShape {
        match self {
            Self::OpenPoolLedger | Self::OpenWallet => CallbackShape::Handle,

            Self::CreatePoolLedgerConfig
            | Self::RefreshPoolLedger
            | Self::ClosePoolLedger
            | Self::DeletePoolLedgerConfig
            | Self::CreateWallet
            | Self::CloseWallet
            | Self::DeleteWallet => CallbackShape::Simple,

            Self::SubmitRequest
            | Self::SignAndSubmitRequest
            | Self::BuildGetDdoRequest
            | Self::BuildNymRequest
            | Self::BuildAttribRequest
            | Self::BuildGetAttribRequest
            | Self::BuildGetNymRequest
            | Self::BuildSchemaRequest
            | Self::BuildGetSchemaRequest
            | Self::BuildNodeRequest
            | Self::BuildGetTxnRequest => CallbackShape::Payload,
        }
    }

    /// The operation that gives back the handle this one opens.
    pub fn release(&self) -> Option<Operation> {
        match self {
            Self::OpenPoolLedger => Some(Self::ClosePoolLedger),
            Self::OpenWallet => Some(Self::CloseWallet),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

//! # Status Classification
//!
//! The engine reports every result as a bare integer. This module folds those
//! integers into a closed set of kinds callers can match on, while keeping
//! codes it has never seen as `Unknown(code)` instead of coercing them.

/// Classified result of an engine status code.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    Success,
    /// The engine (or the lifecycle layer) refused because of resource state.
    InvalidState,
    /// A parameter or document was rejected.
    InvalidArgument,
    /// A pool or wallet handle the engine does not recognize.
    InvalidHandle,
    NotFound,
    AlreadyExists,
    IOError,
    Timeout,
    /// The ledger refused the transaction (no consensus, invalid, unauthorized).
    LedgerRejected,
    /// A code with no known mapping, preserved verbatim.
    Unknown(i32),
}

impl ErrorKind {
    /// Classifies a raw engine status code.
    pub fn from_status(code: i32) -> Self {
        match code {
            0 => Self::Success,
            100..=111 => Self::InvalidArgument,
            112 => Self::InvalidState,
            113 => Self::InvalidArgument,
            114 => Self::IOError,
            200 => Self::InvalidHandle,
            201 => Self::NotFound,
            202 | 203 => Self::AlreadyExists,
            204 => Self::NotFound,
            205 => Self::InvalidArgument,
            206 => Self::InvalidState,
            300 => Self::NotFound,
            301 => Self::InvalidHandle,
            302 => Self::InvalidState,
            303..=305 => Self::LedgerRejected,
            306 => Self::AlreadyExists,
            307 => Self::Timeout,
            other => Self::Unknown(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InvalidHandle => write!(f, "invalid handle"),
            Self::NotFound => write!(f, "not found"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::IOError => write!(f, "I/O error"),
            Self::Timeout => write!(f, "timeout"),
            Self::LedgerRejected => write!(f, "ledger rejected"),
            Self::Unknown(code) => write!(f, "unknown status {}", code),
        }
    }
}

/// Returns the engine's own name for a status code, if it has one.
pub fn status_name(code: i32) -> Option<&'static str> {
    let name = match code {
        0 => "Success",
        100 => "CommonInvalidParam1",
        101 => "CommonInvalidParam2",
        102 => "CommonInvalidParam3",
        103 => "CommonInvalidParam4",
        104 => "CommonInvalidParam5",
        105 => "CommonInvalidParam6",
        106 => "CommonInvalidParam7",
        107 => "CommonInvalidParam8",
        108 => "CommonInvalidParam9",
        109 => "CommonInvalidParam10",
        110 => "CommonInvalidParam11",
        111 => "CommonInvalidParam12",
        112 => "CommonInvalidState",
        113 => "CommonInvalidStructure",
        114 => "CommonIOError",
        200 => "WalletInvalidHandle",
        201 => "WalletUnknownTypeError",
        202 => "WalletTypeAlreadyRegisteredError",
        203 => "WalletAlreadyExistsError",
        204 => "WalletNotFoundError",
        205 => "WalletIncompatiblePoolError",
        206 => "WalletAlreadyOpenedError",
        300 => "PoolLedgerNotCreatedError",
        301 => "PoolLedgerInvalidPoolHandle",
        302 => "PoolLedgerTerminated",
        303 => "LedgerNoConsensusError",
        304 => "LedgerInvalidTransaction",
        305 => "LedgerSecurityError",
        306 => "PoolLedgerConfigAlreadyExistsError",
        307 => "PoolLedgerTimeout",
        _ => return None,
    };
    Some(name)
}

/// Status codes the bridge and its engine stand-in refer to by name.
pub mod code {
    pub const SUCCESS: i32 = 0;
    pub const COMMON_INVALID_PARAM1: i32 = 100;
    pub const COMMON_INVALID_STATE: i32 = 112;
    pub const COMMON_INVALID_STRUCTURE: i32 = 113;
    pub const COMMON_IO_ERROR: i32 = 114;
    pub const WALLET_INVALID_HANDLE: i32 = 200;
    pub const WALLET_UNKNOWN_TYPE: i32 = 201;
    pub const WALLET_ALREADY_EXISTS: i32 = 203;
    pub const WALLET_NOT_FOUND: i32 = 204;
    pub const WALLET_ALREADY_OPENED: i32 = 206;
    pub const POOL_LEDGER_NOT_CREATED: i32 = 300;
    pub const POOL_LEDGER_INVALID_HANDLE: i32 = 301;
    pub const POOL_CONFIG_ALREADY_EXISTS: i32 = 306;
    pub const POOL_LEDGER_TIMEOUT: i32 = 307;
}

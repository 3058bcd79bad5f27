//! # Pool Configuration Documents
//!
//! The JSON documents the engine expects when a pool ledger configuration is
//! created and when a pool is opened.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde::Serializer;
use serde::ser::Error as _;

use crate::error::Result;

/// Sent with `indy_create_pool_ledger_config`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatePoolConfig {
    /// Path to the genesis transactions file.
    pub genesis_txn: String,
}

impl CreatePoolConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let genesis_txn = path.to_str().ok_or_else(|| {
            indycall::Error::ArgumentEncoding(format!(
                "genesis path {} is not valid UTF-8",
                path.display()
            ))
        })?;
        Ok(Self {
            genesis_txn: genesis_txn.to_owned(),
        })
    }
}

/// Sent with `indy_open_pool_ledger`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPoolConfig {
    pub refresh_on_open: bool,

    /// Interval between automatic refreshes. Zero disables them.
    #[serde(rename = "autoRefreshTime", serialize_with = "as_minutes")]
    pub auto_refresh: Duration,

    #[serde(serialize_with = "as_millis")]
    pub network_timeout: Duration,
}

impl Default for OpenPoolConfig {
    fn default() -> Self {
        Self {
            refresh_on_open: true,
            auto_refresh: Duration::from_secs(24 * 60 * 60),
            network_timeout: Duration::from_millis(20_000),
        }
    }
}

fn as_minutes<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let minutes = i32::try_from(value.as_secs() / 60).map_err(|_| {
        S::Error::custom(format!("autoRefreshTime {:?} overflows minutes", value))
    })?;
    serializer.serialize_i32(minutes)
}

fn as_millis<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let millis = i32::try_from(value.as_millis()).map_err(|_| {
        S::Error::custom(format!("networkTimeout {:?} overflows milliseconds", value))
    })?;
    serializer.serialize_i32(millis)
}

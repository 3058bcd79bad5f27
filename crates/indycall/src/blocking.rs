//! # Blocking Bridge
//!
//! Drives a bridge future to completion on the calling thread, for callers
//! that are not running inside an async runtime.

use std::future::Future;

use crate::error::Error;
use crate::error::Result;

/// Runs `future` to completion on a private current-thread runtime.
///
/// Returns `Error::Runtime` instead of panicking when called from inside an
/// existing tokio runtime; use the async entry points there.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Error::Runtime(
            "blocking call issued from inside an async runtime".into(),
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| Error::Runtime(e.to_string()))?;

    Ok(runtime.block_on(future))
}

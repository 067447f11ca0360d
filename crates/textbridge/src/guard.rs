//! Panic and error normalization at the engine boundary.
//!
//! Every engine operation runs under [`guard`]. Reported engine errors come
//! out as [`Error::Engine`] with the engine's own message, or as the bridge
//! error they carry. Faults and panics come out as [`Error::Panic`], whose
//! message reads `caught panic: <message>`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::engine::{EngineFailure, EngineResult};
use crate::error::{Error, Result};
use crate::functions;

/// Runs an engine operation, normalizing every way it can fail.
pub(crate) fn guard<T, F>(operation: &str, f: F) -> Result<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(EngineFailure::Reported(err))) => Err(functions::recover(err)),
        Ok(Err(EngineFailure::Fault(message))) => Err(Error::Panic(message)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(operation, %message, "caught panic at engine boundary");
            Err(Error::Panic(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

use core::time::Duration;
use std::{any::Any, io};

use crate::PairId;

/// Errors produced by the generator/consumer core.
///
/// Worker faults never unwind into the supervisor. They are captured in the
/// thread that raised them and delivered to the observer as notifications.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raised while producing or emitting an item.
    #[error("pair {pair}: generation fault: {message}")]
    GenerationFault { pair: PairId, message: String },
    /// Raised while handling a received item.
    #[error("pair {pair}: consumption fault: {message}")]
    ConsumptionFault { pair: PairId, message: String },
    /// A worker thread did not finish within its grace period and was
    /// abandoned.
    #[error("thread {thread} did not finish within {grace:?}")]
    ShutdownTimeout { thread: String, grace: Duration },
    /// The other side of a channel is gone.
    #[error("channel disconnected")]
    Disconnected,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Extracts a human readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(v) = payload.downcast_ref::<&str>() {
        (*v).to_string()
    } else if let Some(v) = payload.downcast_ref::<String>() {
        v.clone()
    } else {
        "unknown panic".to_string()
    }
}

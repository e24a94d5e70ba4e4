//! Error taxonomy.
//!
//! Only the fatal conditions become `SimError`: bad configuration, a
//! malformed topology, or a violated internal invariant. Everything else
//! (tail drops, protocol timeouts, stale routing info, unroutable
//! destinations) is routine and stays local to the entity that observed it.
//! It is logged via `tracing` and folded into metrics, never propagated as
//! an `Err`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("topology error: {0}")]
    Topology(String),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl SimError {
    /// Process exit code `main` should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimError::Config(_) | SimError::Topology(_) => 2,
            SimError::Invariant(_) => 1,
        }
    }
}

/// Returns `Err(SimError::Invariant(..))` instead of panicking when `cond` is false,
/// so `main` can print a clean message and exit non-zero rather than unwind.
macro_rules! invariant {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::error::SimError::Invariant(format!($($msg)*)));
        }
    };
}

pub(crate) use invariant;

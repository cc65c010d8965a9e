//! Cooperative cancellation.
//!
//! The host flips the flag; the lazy session checks it between granule
//! handlers, never in the middle of one, so a cancelled request leaves the
//! resolver state exactly as the last completed handler left it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use descry_resolve::ResolveError;

/// Shared cancellation signal. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous cancellation so the session can be used again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), ResolveError> {
        if self.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}

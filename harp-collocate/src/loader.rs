//! The product-loading collaborator and cooperative cancellation (§5).
//!
//! Product I/O is out of scope for the core (§1); the sweep only needs
//! *something* that turns a [`ProductMetadata`] into a [`Product`], so
//! that something is a trait object the caller supplies — the same
//! pattern `harp_action`'s `AreaMaskProvider`/`CollocationIndex` use to
//! externalise their own out-of-scope I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use harp_product::Product;

use crate::dataset::ProductMetadata;

/// Turns dataset metadata into a loaded [`Product`]. A load failure is
/// never fatal to the matchup (§4.8 "Failure model": "a product that
/// fails to load is skipped with a warning") — the `Err` string becomes
/// the `reason` of a logged warning, nothing more.
pub trait ProductLoader {
    fn load(&self, metadata: &ProductMetadata) -> Result<Product, String>;
}

/// A cooperative cancellation flag, checked between inner-loop iterations
/// and between outer-loop iterations (§5). Cloning shares the same
/// underlying flag, so a caller can hold one clone and call
/// [`CancellationToken::cancel`] from another thread or a signal handler
/// while `run` is in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_observed_through_a_clone() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}

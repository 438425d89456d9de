//! Mock implementations for testing.

use crate::Height;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// A [crate::Ledger] whose height is advanced manually.
///
/// Clones share the same height.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    height: Arc<AtomicU64>,
}

impl Ledger {
    /// Creates a ledger at `height`.
    pub fn new(height: Height) -> Self {
        Self {
            height: Arc::new(AtomicU64::new(height)),
        }
    }

    /// Mines `blocks` blocks, returning the new height.
    pub fn advance(&self, blocks: Height) -> Height {
        self.height.fetch_add(blocks, Ordering::SeqCst) + blocks
    }
}

impl crate::Ledger for Ledger {
    fn height(&self) -> Height {
        self.height.load(Ordering::SeqCst)
    }
}

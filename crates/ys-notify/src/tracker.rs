use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Notifier;

/// Counts the chains whose first indexing pass completed and announces each
/// of them.
pub struct InitializationTracker {
    notifier: Arc<dyn Notifier>,
    initialized: AtomicUsize,
    total: usize,
}

impl InitializationTracker {
    pub fn new(notifier: Arc<dyn Notifier>, total: usize) -> Self {
        Self {
            notifier,
            initialized: AtomicUsize::new(0),
            total,
        }
    }

    pub fn initialized(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    /// Marks `chain_id` as initialized and sends the status message.
    pub async fn chain_initialized(&self, chain_id: u64) {
        let count = self.initialized.fetch_add(1, Ordering::SeqCst) + 1;
        self.notifier
            .notify(&initialized_message(chain_id, count, self.total))
            .await;
    }
}

fn initialized_message(chain_id: u64, count: usize, total: usize) -> String {
    format!("✅ - yieldscope initialized for chain {chain_id} ({count}/{total})")
}

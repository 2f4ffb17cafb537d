//! Per-cell write serialization.
//!
//! Execution and expansion of the same cell are read-modify-write sequences
//! against the repository; two of them interleaving would lose updates.
//! Different cells proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type CellKey = (String, String);

#[derive(Default)]
pub struct CellLocks {
    locks: Mutex<HashMap<CellKey, Arc<AsyncMutex<()>>>>,
}

impl CellLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one cell. Released when the guard drops.
    pub async fn lock(&self, notebook_id: &str, cell_id: &str) -> OwnedMutexGuard<()> {
        let cell_lock = {
            let mut locks = self.locks.lock();
            // Entries only referenced by the map are idle.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks
                .entry((notebook_id.to_string(), cell_id.to_string()))
                .or_default()
                .clone()
        };
        cell_lock.lock_owned().await
    }

    /// Number of cells with a holder or waiter.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|l| Arc::strong_count(l) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_cell_is_serialized() {
        let locks = Arc::new(CellLocks::new());
        let guard = locks.lock("nb", "c1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.lock("nb", "c1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_cells_do_not_block() {
        let locks = CellLocks::new();
        let _a = locks.lock("nb", "c1").await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock("nb", "c2"))
            .await
            .unwrap();
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = CellLocks::new();
        drop(locks.lock("nb", "c1").await);
        let _b = locks.lock("nb", "c2").await;
        assert_eq!(locks.locks.lock().len(), 1);
    }
}

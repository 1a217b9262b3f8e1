//! Per-account exclusion for unlock/act/lock sequences
//!
//! A chain account's unlocked state is shared mutable state on the node:
//! two requests interleaving unlock/lock calls on the same account can
//! undo each other's authorization. Every sequence that touches an
//! account's lock state must hold that account's slot for its full
//! duration, from before the unlock until after the re-lock.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-account mutexes
#[derive(Default)]
pub struct AccountLocks {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive use of an account's lock state. The guard must
    /// outlive the re-lock call.
    pub async fn acquire(&self, account: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let entry = self
                .slots
                .entry(account.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        slot.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_account_is_exclusive() {
        let locks = Arc::new(AccountLocks::new());
        let in_section = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let in_section = Arc::clone(&in_section);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("0xA1").await;
                let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_accounts_do_not_block_each_other() {
        let locks = AccountLocks::new();
        let _a = locks.acquire("0xA1").await;
        // Would deadlock if accounts shared one mutex
        let _b = locks.acquire("0xB2").await;
    }
}

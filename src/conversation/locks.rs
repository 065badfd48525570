//! Per-chat mutual exclusion for update handling.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per chat id. Updates of the same chat run one at a time;
/// different chats never wait on each other.
#[derive(Clone, Default)]
pub struct ChatLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `chat_id`; released when the guard drops.
    pub async fn acquire(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard lock is not held across the await
        let lock = Arc::clone(self.locks.entry(chat_id).or_default().value());
        lock.lock_owned().await
    }

    /// Number of chats seen so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

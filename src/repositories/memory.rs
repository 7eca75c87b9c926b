use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::paste::Paste,
    repositories::paste_store::{PasteStore, StoreResult},
    services::expiry,
};

/// A process-local paste store.
///
/// Every mutation runs under the write lock, which makes the conditional
/// decrement atomic with respect to concurrent readers.
#[derive(Clone, Default)]
pub struct MemoryPasteStore {
    pastes: Arc<RwLock<HashMap<String, Paste>>>,
}

impl MemoryPasteStore {
    /// Creates an empty `MemoryPasteStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored pastes.
    pub async fn len(&self) -> usize {
        self.pastes.read().await.len()
    }

    /// Returns `true` if no pastes are stored.
    pub async fn is_empty(&self) -> bool {
        self.pastes.read().await.is_empty()
    }
}

#[async_trait]
impl PasteStore for MemoryPasteStore {
    async fn create(&self, paste: &Paste) -> StoreResult<()> {
        let mut pastes = self.pastes.write().await;
        match pastes.entry(paste.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId),
            Entry::Vacant(slot) => {
                slot.insert(paste.clone());
                Ok(())
            }
        }
    }

    async fn fetch_by_id(&self, id: &str) -> StoreResult<Option<Paste>> {
        Ok(self.pastes.read().await.get(id).cloned())
    }

    async fn decrement_and_fetch_remaining(&self, id: &str) -> StoreResult<Option<i32>> {
        let mut pastes = self.pastes.write().await;
        let Some(remaining) = pastes.get_mut(id).and_then(|p| p.remaining_views.as_mut()) else {
            return Ok(None);
        };

        if *remaining <= 0 {
            return Ok(None);
        }
        *remaining -= 1;
        Ok(Some(*remaining))
    }

    async fn prune_inaccessible(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut pastes = self.pastes.write().await;
        let before = pastes.len();
        pastes.retain(|_, paste| expiry::is_accessible(paste, now));
        Ok((before - pastes.len()) as u64)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{error::StoreError, models::paste::Paste};

/// A `Result` type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for pastes.
///
/// Apart from `remaining_views`, a stored paste never changes after
/// `create`. Implementations must make `create` and
/// `decrement_and_fetch_remaining` single atomic operations.
#[async_trait]
pub trait PasteStore: Send + Sync + 'static {
    /// Inserts a new paste.
    ///
    /// Fails with [`StoreError::DuplicateId`] when the id is taken, in which
    /// case nothing is written.
    async fn create(&self, paste: &Paste) -> StoreResult<()>;

    /// Loads a paste by id. Returns `None` if it does not exist.
    async fn fetch_by_id(&self, id: &str) -> StoreResult<Option<Paste>>;

    /// Claims one view of a view-limited paste.
    ///
    /// Decrements `remaining_views` only if it is above zero and returns the
    /// post-decrement value. Returns `None` when no view was granted, either
    /// because the paste is gone or because its last view was already taken.
    async fn decrement_and_fetch_remaining(&self, id: &str) -> StoreResult<Option<i32>>;

    /// Deletes every paste that is time-expired or out of views at `now`.
    ///
    /// Returns the number of pastes removed.
    async fn prune_inaccessible(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, Result, StoreError, Unavailable},
    models::paste::{CreatedPaste, Paste, PasteDraft, PasteView},
    repositories::paste_store::PasteStore,
    services::{expiry, ids},
    validation::paste::validate_draft,
};

/// Creates and serves pastes on top of a `PasteStore`.
#[derive(Clone)]
pub struct PasteService {
    store: Arc<dyn PasteStore>,
    id_max_attempts: usize,
}

impl PasteService {
    /// Creates a new `PasteService`.
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store.
    /// * `id_max_attempts` - How many identifiers to try before giving up on
    ///   a create. Values below one are treated as one.
    pub fn new(store: Arc<dyn PasteStore>, id_max_attempts: usize) -> Self {
        Self {
            store,
            id_max_attempts: id_max_attempts.max(1),
        }
    }

    /// The store this service writes to.
    pub fn store(&self) -> &Arc<dyn PasteStore> {
        &self.store
    }

    /// Creates a new paste.
    ///
    /// # Arguments
    ///
    /// * `draft` - The paste content and limits.
    /// * `now` - The creation instant.
    ///
    /// # Returns
    ///
    /// A `Result` containing the id of the stored paste.
    pub async fn create(&self, draft: PasteDraft, now: DateTime<Utc>) -> Result<CreatedPaste> {
        validate_draft(&draft)?;
        let expires_at = expiry::expires_at(now, draft.ttl_seconds)?;

        let mut paste = Paste {
            id: ids::generate(),
            content: draft.content,
            created_at: now,
            ttl_seconds: draft.ttl_seconds,
            expires_at,
            max_views: draft.max_views,
            remaining_views: draft.max_views,
        };

        for attempt in 1..=self.id_max_attempts {
            match self.store.create(&paste).await {
                Ok(()) => {
                    tracing::info!(
                        "📝 Paste created: {} (expires_at: {:?}, max_views: {:?})",
                        paste.id,
                        paste.expires_at,
                        paste.max_views
                    );
                    return Ok(CreatedPaste {
                        id: paste.id,
                        expires_at: paste.expires_at,
                    });
                }
                Err(StoreError::DuplicateId) => {
                    tracing::warn!(
                        "⚠️  Paste id collision on attempt {}/{}, regenerating",
                        attempt,
                        self.id_max_attempts
                    );
                    paste.id = ids::generate();
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            "❌ Could not allocate a unique paste id after {} attempts",
            self.id_max_attempts
        );
        Err(AppError::Storage(StoreError::DuplicateId))
    }

    /// Serves one view of a paste.
    ///
    /// Expiry is checked on the fetched snapshot first. For view-limited
    /// pastes the atomic decrement then decides whether this reader actually
    /// gets a view; losing that race yields `ViewsExhausted`.
    ///
    /// # Arguments
    ///
    /// * `id` - The paste id.
    /// * `now` - The instant the request is evaluated at.
    ///
    /// # Returns
    ///
    /// A `Result` containing the content and the limits left after this view.
    pub async fn consume(&self, id: &str, now: DateTime<Utc>) -> Result<PasteView> {
        if !ids::is_well_formed(id) {
            return Err(Unavailable::NotFound.into());
        }

        let paste = self
            .store
            .fetch_by_id(id)
            .await?
            .ok_or(Unavailable::NotFound)?;

        if expiry::is_time_expired(&paste, now) {
            return Err(Unavailable::Expired.into());
        }
        if expiry::is_view_exhausted(&paste) {
            return Err(Unavailable::ViewsExhausted.into());
        }

        let remaining_views = match paste.remaining_views {
            None => None,
            Some(_) => {
                let remaining = self
                    .store
                    .decrement_and_fetch_remaining(id)
                    .await?
                    .ok_or(Unavailable::ViewsExhausted)?;
                Some(remaining)
            }
        };

        tracing::debug!("👁️  Paste {} viewed (remaining: {:?})", id, remaining_views);

        Ok(PasteView {
            content: paste.content,
            remaining_views,
            expires_at: paste.expires_at,
        })
    }
}

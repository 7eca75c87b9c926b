use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;

use crate::{
    error::StoreError,
    models::paste::Paste,
    repositories::paste_store::{PasteStore, StoreResult},
};

const INSERT_PASTE: &str = r#"
    INSERT INTO pastes (
        id, content, ttl_seconds, max_views, remaining_views, created_at, expires_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (id) DO NOTHING
"#;

const SELECT_PASTE: &str = r#"
    SELECT id, content, ttl_seconds, max_views, remaining_views, created_at, expires_at
    FROM pastes
    WHERE id = $1
"#;

// The WHERE guard and the decrement run as one statement, so two readers
// can never both take the last view.
const CLAIM_VIEW: &str = r#"
    UPDATE pastes
    SET remaining_views = remaining_views - 1
    WHERE id = $1 AND remaining_views > 0
    RETURNING remaining_views
"#;

const DELETE_INACCESSIBLE: &str = r#"
    DELETE FROM pastes
    WHERE (expires_at IS NOT NULL AND expires_at <= $1)
       OR (remaining_views IS NOT NULL AND remaining_views <= 0)
"#;

/// A `PasteStore` backed by the PostgreSQL `pastes` table.
#[derive(Clone)]
pub struct PgPasteStore {
    pool: Pool,
}

impl PgPasteStore {
    /// Creates a new `PgPasteStore` over an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasteStore for PgPasteStore {
    async fn create(&self, paste: &Paste) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let statement = client.prepare_cached(INSERT_PASTE).await?;
        let inserted = client
            .execute(
                &statement,
                &[
                    &paste.id,
                    &paste.content,
                    &paste.ttl_seconds,
                    &paste.max_views,
                    &paste.remaining_views,
                    &paste.created_at,
                    &paste.expires_at,
                ],
            )
            .await?;

        if inserted == 0 {
            return Err(StoreError::DuplicateId);
        }
        Ok(())
    }

    async fn fetch_by_id(&self, id: &str) -> StoreResult<Option<Paste>> {
        let client = self.pool.get().await?;
        let statement = client.prepare_cached(SELECT_PASTE).await?;
        let row = client.query_opt(&statement, &[&id]).await?;
        row.as_ref().map(Paste::try_from).transpose()
    }

    async fn decrement_and_fetch_remaining(&self, id: &str) -> StoreResult<Option<i32>> {
        let client = self.pool.get().await?;
        let statement = client.prepare_cached(CLAIM_VIEW).await?;
        let row = client.query_opt(&statement, &[&id]).await?;

        row.map(|row| {
            row.try_get::<_, i32>("remaining_views")
                .map_err(|e| StoreError::Corrupt {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
        })
        .transpose()
    }

    async fn prune_inaccessible(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let statement = client.prepare_cached(DELETE_INACCESSIBLE).await?;
        Ok(client.execute(&statement, &[&now]).await?)
    }
}
